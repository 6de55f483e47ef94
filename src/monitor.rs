//! Background polling of a data specification
//!
//! A [`Monitor`] owns a [`Connection`] on a blocking thread, reads one
//! prepared specification at a fixed interval and publishes every sample
//! through a watch channel. Subscribers get the latest sample as a stream,
//! optionally rate limited.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::connection::Connection;
use crate::link::Link;
use crate::stream::ThrottleExt;
use crate::types::{UpdateRate, Value};
use crate::{DataSpecification, FsuipcError, Result};

/// Consecutive failed reads tolerated before the monitor gives up.
const MAX_ERRORS: u32 = 10;
/// First retry delay after a failed read, doubled per failure up to 2^5.
const ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Polling and retry settings for [`Monitor::spawn_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between successful reads
    pub interval: Duration,
    /// Consecutive failed reads that stop the monitor
    pub max_errors: u32,
    /// Base retry delay; the n-th consecutive failure waits `backoff * 2^min(n, 5)`
    pub backoff: Duration,
}

impl MonitorSettings {
    pub fn new(interval: Duration) -> Self {
        Self { interval, max_errors: MAX_ERRORS, backoff: ERROR_BACKOFF }
    }

    fn retry_delay(&self, error_count: u32) -> Duration {
        self.backoff * (1u32 << error_count.min(5))
    }
}

/// One set of values read from the simulator.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Starts at 1 and increases by one per successful read.
    pub sequence: u64,
    pub captured_at: Instant,
    pub values: Vec<Value>,
    spec: Arc<DataSpecification>,
}

impl Sample {
    /// Value of the field named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.spec.index_of(name).and_then(|index| self.values.get(index))
    }

    pub fn specification(&self) -> &DataSpecification {
        &self.spec
    }
}

/// Polls FSUIPC on a blocking thread.
///
/// Dropping the monitor stops polling and closes the connection.
pub struct Monitor {
    samples: watch::Receiver<Option<Arc<Sample>>>,
    spec: Arc<DataSpecification>,
    interval: Duration,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<u64>>>,
}

impl Monitor {
    /// Start polling `spec` every `interval`.
    ///
    /// `connect` runs on the polling thread, so the connection never leaves
    /// it. Must be called from within a tokio runtime.
    pub fn spawn<L, F>(connect: F, spec: DataSpecification, interval: Duration) -> Self
    where
        L: Link + 'static,
        F: FnOnce() -> Result<Connection<L>> + Send + 'static,
    {
        Self::spawn_with(connect, spec, MonitorSettings::new(interval))
    }

    /// Start polling with explicit retry settings.
    pub fn spawn_with<L, F>(connect: F, spec: DataSpecification, settings: MonitorSettings) -> Self
    where
        L: Link + 'static,
        F: FnOnce() -> Result<Connection<L>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let spec = Arc::new(spec);
        let settings = MonitorSettings {
            interval: settings.interval.max(Duration::from_millis(1)),
            max_errors: settings.max_errors.max(1),
            ..settings
        };
        let interval = settings.interval;

        let poller = Poller {
            spec: spec.clone(),
            settings,
            samples: tx,
            cancel: cancel.clone(),
            runtime: Handle::current(),
        };
        let task = tokio::task::spawn_blocking(move || -> Result<u64> {
            let connection = connect().inspect_err(|e| error!("Monitor failed to connect: {}", e))?;
            poller.run(connection)
        });

        info!(fields = spec.len(), interval_ms = interval.as_millis() as u64, "Monitor started");

        Self { samples: rx, spec, interval, cancel, task: Some(task) }
    }

    /// Subscribe to samples.
    ///
    /// The stream waits for the first sample and ends when the monitor stops.
    /// `rate` is resolved against the poll interval; see [`UpdateRate`].
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<Sample>> + Send + 'static {
        // WatchStream yields the current value first, which is None until the
        // first read succeeds.
        let samples = WatchStream::new(self.samples.clone())
            .skip_while(|sample| {
                let waiting = sample.is_none();
                async move { waiting }
            })
            .take_while(|sample| {
                let live = sample.is_some();
                async move { live }
            })
            .filter_map(|sample| async move { sample });

        match rate.throttle_period(self.interval) {
            None => samples.boxed(),
            Some(period) => samples.throttle(period).boxed(),
        }
    }

    /// Most recent sample, if any read has succeeded yet.
    pub fn latest(&self) -> Option<Arc<Sample>> {
        self.samples.borrow().clone()
    }

    pub fn specification(&self) -> &DataSpecification {
        &self.spec
    }

    /// Configured polling frequency.
    pub fn poll_hz(&self) -> f64 {
        1.0 / self.interval.as_secs_f64()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop polling and wait for the connection to close.
    ///
    /// Returns the number of samples read, or the error that ended polling
    /// early: a failed connect, fields that cannot be prepared, or the last
    /// read once too many reads failed in a row.
    pub async fn stop(mut self) -> Result<u64> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return Ok(0);
        };

        task.await.map_err(|e| FsuipcError::Monitor { reason: format!("polling task failed: {e}") })?
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        debug!("Dropping monitor");
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("fields", &self.spec.len())
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

struct Poller {
    spec: Arc<DataSpecification>,
    settings: MonitorSettings,
    samples: watch::Sender<Option<Arc<Sample>>>,
    cancel: CancellationToken,
    runtime: Handle,
}

impl Poller {
    /// Poll until cancelled or too many reads fail in a row.
    ///
    /// Returns the number of samples read, or the error that ended polling.
    fn run<L: Link>(self, connection: Connection<L>) -> Result<u64> {
        let outcome = match connection.prepare(&self.spec, true) {
            Ok(mut prepared) => self.poll(|| prepared.read()),
            Err(e) => {
                error!("Monitor cannot prepare its fields: {}", e);
                Err(e)
            }
        };

        // Subscribers see the end of the stream.
        let _ = self.samples.send(None);
        connection.close();
        match &outcome {
            Ok(sequence) => info!("Monitor stopped after {} samples", sequence),
            Err(e) => warn!("Monitor stopped on error: {}", e),
        }
        outcome
    }

    fn poll(&self, mut read: impl FnMut() -> Result<Vec<Value>>) -> Result<u64> {
        let mut sequence = 0u64;
        let mut error_count = 0u32;

        while !self.cancel.is_cancelled() {
            let wait = match read() {
                Ok(values) => {
                    error_count = 0;
                    sequence += 1;
                    trace!(sequence, "Sample read");

                    let sample = Sample {
                        sequence,
                        captured_at: Instant::now(),
                        values,
                        spec: self.spec.clone(),
                    };
                    if self.samples.send(Some(Arc::new(sample))).is_err() {
                        debug!("Sample receivers dropped, stopping");
                        break;
                    }
                    self.settings.interval
                }
                Err(e) => {
                    error_count += 1;
                    let max_errors = self.settings.max_errors;
                    warn!("Monitor read failed ({}/{}): {}", error_count, max_errors, e);

                    if error_count >= max_errors {
                        error!("Too many failed reads, stopping monitor");
                        return Err(e);
                    }

                    self.settings.retry_delay(error_count)
                }
            };

            if self.sleep(wait) {
                debug!("Monitor cancelled");
                break;
            }
        }

        Ok(sequence)
    }

    /// Sleep for `wait`, returning true if cancelled first.
    fn sleep(&self, wait: Duration) -> bool {
        self.runtime.block_on(async {
            tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(wait) => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MemoryLink;
    use crate::types::{ErrorCode, Simulator, ValueType};

    fn altitude_spec() -> DataSpecification {
        DataSpecification::new()
            .with_named("altitude", 0x0570, ValueType::Int64)
            .with_named("on_ground", 0x0366, ValueType::UInt16)
    }

    fn connect(link: MemoryLink) -> impl FnOnce() -> Result<Connection<MemoryLink>> + Send + 'static {
        move || Connection::open(link, Simulator::Any)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn publishes_samples_in_sequence() {
        let _ = tracing_subscriber::fmt::try_init();
        let link = MemoryLink::new();
        link.poke(0x0570, &1_000i64.to_le_bytes());

        let monitor = Monitor::spawn(connect(link.clone()), altitude_spec(), Duration::from_millis(5));
        let samples: Vec<_> = monitor.subscribe(UpdateRate::Native).take(3).collect().await;

        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|pair| pair[0].sequence < pair[1].sequence));
        assert_eq!(samples[0].get("altitude"), Some(&Value::Int(1_000)));
        assert_eq!(samples[0].get("on_ground"), Some(&Value::UInt(0)));
        assert!(monitor.latest().is_some());

        let count = monitor.stop().await.expect("stop");
        assert!(count >= 3);
        assert_eq!(link.stats().closes, 1);
        assert!(!link.is_open());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stream_ends_when_monitor_stops() {
        let link = MemoryLink::new();
        let monitor = Monitor::spawn(connect(link.clone()), altitude_spec(), Duration::from_millis(5));
        let mut samples = monitor.subscribe(UpdateRate::Native);

        assert!(samples.next().await.is_some());
        monitor.stop().await.expect("stop");

        let rest: Vec<_> = samples.collect().await;
        assert!(rest.len() <= 1);
        assert_eq!(link.stats().closes, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connect_failure_is_reported_by_stop() {
        let link = MemoryLink::builder().running(false).build();
        let monitor = Monitor::spawn(connect(link.clone()), altitude_spec(), Duration::from_millis(5));

        let samples: Vec<_> = monitor.subscribe(UpdateRate::Native).collect().await;
        assert!(samples.is_empty());

        let err = monitor.stop().await.unwrap_err();
        assert_eq!(err.native_code(), Some(ErrorCode::NoFs));
        assert_eq!(link.stats().closes, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_fields_close_connection() {
        let link = MemoryLink::new();
        let monitor =
            Monitor::spawn(connect(link.clone()), DataSpecification::new(), Duration::from_millis(5));

        let samples: Vec<_> = monitor.subscribe(UpdateRate::Native).collect().await;
        assert!(samples.is_empty());

        let err = monitor.stop().await.unwrap_err();
        assert!(matches!(err, FsuipcError::Specification { index: 0, .. }));
        assert_eq!(link.stats().closes, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_read_failures_surface_last_error() {
        let link = MemoryLink::builder().memory_size(0x10).build();
        let settings = MonitorSettings {
            max_errors: 3,
            backoff: Duration::from_millis(1),
            ..MonitorSettings::new(Duration::from_millis(5))
        };
        let monitor = Monitor::spawn_with(connect(link.clone()), altitude_spec(), settings);

        let samples: Vec<_> = monitor.subscribe(UpdateRate::Native).collect().await;
        assert!(samples.is_empty());

        let err = monitor.stop().await.unwrap_err();
        assert_eq!(err.native_code(), Some(ErrorCode::Data));
        assert_eq!(link.stats().transfers, 3);
        assert_eq!(link.stats().closes, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn transient_errors_do_not_stop_polling() {
        let link = MemoryLink::new();
        let handle = link.clone();
        let connect = move || {
            let connection = Connection::open(link, Simulator::Any)?;
            handle.fail_next(ErrorCode::Timeout);
            Ok(connection)
        };

        let monitor = Monitor::spawn(connect, altitude_spec(), Duration::from_millis(5));
        let first = monitor.subscribe(UpdateRate::Native).next().await.expect("sample after retry");
        assert_eq!(first.sequence, 1);
        monitor.stop().await.expect("stop");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drop_closes_connection() {
        let link = MemoryLink::new();
        let monitor = Monitor::spawn(connect(link.clone()), altitude_spec(), Duration::from_millis(5));
        monitor.subscribe(UpdateRate::Native).next().await.expect("first sample");
        drop(monitor);

        let deadline = Instant::now() + Duration::from_secs(5);
        while link.is_open() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(link.stats().closes, 1);
    }

    #[test]
    fn retry_delay_doubles_up_to_cap() {
        let settings = MonitorSettings::new(Duration::from_millis(100));
        assert_eq!(settings.max_errors, 10);
        assert_eq!(settings.retry_delay(1), Duration::from_millis(100));
        assert_eq!(settings.retry_delay(3), Duration::from_millis(400));
        assert_eq!(settings.retry_delay(5), Duration::from_millis(1600));
        assert_eq!(settings.retry_delay(9), Duration::from_millis(1600));
    }

    #[test]
    fn poll_rate_caps_subscriptions() {
        let interval = Duration::from_millis(100);
        assert_eq!(UpdateRate::Max(50).normalize(interval), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(2).throttle_period(interval), Some(Duration::from_millis(500)));
    }
}
