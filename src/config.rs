//! YAML client configuration
//!
//! ```yaml
//! simulator: FSX
//! poll_interval_ms: 250
//! fields:
//!   - name: altitude
//!     offset: 0x0570
//!     type: l
//!   - name: atc_id
//!     offset: 0x313c
//!     type: -12
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::link::MemoryLink;
use crate::types::{Simulator, UpdateRate};
use crate::{DataSpecification, FsuipcError, Result};

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Settings for a polling client such as `fsuipc-monitor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Simulator family to accept when opening
    #[serde(default)]
    pub simulator: Simulator,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Rate at which samples are handed to subscribers
    #[serde(default = "default_update_rate")]
    pub update_rate: UpdateRate,

    pub fields: DataSpecification,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_update_rate() -> UpdateRate {
    UpdateRate::Native
}

impl ClientConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml, Path::new("<inline>"))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| FsuipcError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&yaml, path)
    }

    fn parse(yaml: &str, path: &Path) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| FsuipcError::config(PathBuf::from(path), e.to_string()))?;

        if config.poll_interval_ms == 0 {
            return Err(FsuipcError::config(path, "poll_interval_ms must be at least 1"));
        }
        config
            .fields
            .validate()
            .map_err(|e| FsuipcError::config(path, e.to_string()))?;

        debug!(path = %path.display(), fields = config.fields.len(), "Loaded client configuration");
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// In-memory link that passes this configuration's simulator filter.
    ///
    /// With `simulator: ANY` the link keeps the builder's default simulator.
    pub fn simulated_link(&self) -> MemoryLink {
        match self.simulator {
            Simulator::Any => MemoryLink::new(),
            simulator => MemoryLink::builder().simulator(simulator).build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Connection, ValueType};
    use anyhow::Result;

    const SAMPLE: &str = r#"
simulator: FSX
poll_interval_ms: 250
update_rate: !Max 2
fields:
  - name: altitude
    offset: 0x0570
    type: l
  - offset: 0x313c
    type: -12
  - name: heading
    offset: 0x0580
    type: u
"#;

    #[test]
    fn parses_full_configuration() -> Result<()> {
        let config = ClientConfig::from_yaml_str(SAMPLE)?;

        assert_eq!(config.simulator, Simulator::Fsx);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.update_rate, UpdateRate::Max(2));
        assert_eq!(config.fields.len(), 3);
        assert_eq!(config.fields.fields()[1].offset, 0x313c);
        assert_eq!(config.fields.fields()[1].value_type, ValueType::CString(12));
        assert_eq!(config.fields.index_of("heading"), Some(2));
        Ok(())
    }

    #[test]
    fn defaults_apply() -> Result<()> {
        let config = ClientConfig::from_yaml_str("fields:\n  - { offset: 0x0238, type: b }\n")?;

        assert_eq!(config.simulator, Simulator::Any);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.update_rate, UpdateRate::Native);
        Ok(())
    }

    #[test]
    fn rejects_empty_field_list() {
        let err = ClientConfig::from_yaml_str("fields: []\n").unwrap_err();
        assert!(matches!(err, FsuipcError::Config { .. }));
        assert!(err.to_string().contains("at least one element"));
    }

    #[test]
    fn rejects_bad_documents() {
        for yaml in [
            "fields:\n  - { offset: 0x0238, type: z }\n",
            "fields:\n  - { offset: 0x0238, type: 0 }\n",
            "poll_interval_ms: 0\nfields:\n  - { offset: 0x0238, type: b }\n",
            "simulator: XPLANE\nfields:\n  - { offset: 0x0238, type: b }\n",
            "unknown: 1\nfields:\n  - { offset: 0x0238, type: b }\n",
        ] {
            let err = ClientConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, FsuipcError::Config { .. }), "{yaml}: {err}");
        }
    }

    #[test]
    fn simulated_link_passes_configured_filter() -> Result<()> {
        let fields = "fields:\n  - { offset: 0x0238, type: b }\n";
        for simulator in Simulator::ALL {
            let yaml = format!("simulator: {}\n{}", serde_yaml_ng::to_string(&simulator)?.trim(), fields);
            let config = ClientConfig::from_yaml_str(&yaml)?;

            let connection = Connection::open(config.simulated_link(), config.simulator)?;
            if simulator != Simulator::Any {
                assert_eq!(connection.simulator(), Some(simulator));
            }
        }
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::load("/nonexistent/fsuipc.yaml").unwrap_err();
        assert!(matches!(err, FsuipcError::Io { .. }));
    }

    #[test]
    fn load_reads_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("fsuipc-config-{}.yaml", std::process::id()));
        std::fs::write(&path, SAMPLE)?;

        let loaded = ClientConfig::load(&path);
        std::fs::remove_file(&path)?;

        assert_eq!(loaded?.fields.len(), 3);
        Ok(())
    }
}
