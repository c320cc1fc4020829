//! gpsd location source - reads fixes from a local gpsd daemon.
//!
//! Connects to gpsd over TCP, enables JSON watch mode and converts `TPV`
//! (time-position-velocity) reports into [`SensorEvent`]s.
//!
//! # Protocol
//!
//! ```text
//! -> ?WATCH={"enable":true,"json":true}
//! <- {"class":"VERSION",...}
//! <- {"class":"TPV","mode":3,"lat":-23.5,"lon":-46.6,"eph":8.2,...}
//! ```
//!
//! Reports with `mode < 2` carry no fix and are skipped. The accuracy radius
//! is taken from `eph`, falling back to `max(epx, epy)`.
//!
//! # Design
//!
//! - `watch()` spawns one async task per subscription
//! - Connection failures are reported as [`SensorError::Unavailable`] and
//!   retried with exponential backoff (2^n seconds, capped at 30 seconds)
//! - `clear_watch()` aborts the task; sink closure also stops it

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::source::{
    GeolocationSource, SensorError, SensorEvent, SensorReading, SensorSink, WatchId,
};

/// Maximum reconnect backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Accuracy reported when gpsd gives no error estimate at all.
const UNKNOWN_ACCURACY_M: f64 = 10_000.0;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";

/// gpsd connection settings.
#[derive(Debug, Clone)]
pub struct GpsdConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GpsdConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2947,
        }
    }
}

impl GpsdConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Location source backed by gpsd.
pub struct GpsdSource {
    config: GpsdConfig,
    next_id: u64,
    tasks: HashMap<WatchId, JoinHandle<()>>,
}

impl GpsdSource {
    pub fn new(config: GpsdConfig) -> Self {
        Self {
            config,
            next_id: 1,
            tasks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GpsdConfig {
        &self.config
    }
}

impl GeolocationSource for GpsdSource {
    fn watch(&mut self, sink: SensorSink) -> Result<WatchId, SensorError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SensorError::Unavailable(format!("no async runtime: {}", e)))?;

        let watch = WatchId::new(self.next_id);
        self.next_id += 1;

        let handle = runtime.spawn(run_watch(self.config.clone(), watch, sink));
        self.tasks.insert(watch, handle);
        Ok(watch)
    }

    fn clear_watch(&mut self, watch: WatchId) {
        if let Some(handle) = self.tasks.remove(&watch) {
            handle.abort();
            debug!(%watch, "gpsd watch cleared");
        }
    }
}

impl Drop for GpsdSource {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Connection loop for one subscription.
async fn run_watch(config: GpsdConfig, watch: WatchId, sink: SensorSink) {
    let address = config.address();
    info!(%watch, address = %address, "gpsd watch started");

    let mut consecutive_errors: u32 = 0;

    loop {
        if consecutive_errors > 0 {
            let backoff = calculate_backoff(consecutive_errors);
            debug!(
                backoff_secs = backoff.as_secs(),
                consecutive_errors, "Backing off before reconnecting to gpsd"
            );
            tokio::time::sleep(backoff).await;
        }

        match stream_reports(&address, watch, &sink).await {
            Ok(StreamEnd::SinkClosed) => break,
            Ok(StreamEnd::Disconnected) => {
                consecutive_errors = 1;
                if !sink.deliver(SensorEvent::error(
                    watch,
                    SensorError::Unavailable("gpsd closed the connection".to_string()),
                )) {
                    break;
                }
            }
            Err(e) => {
                consecutive_errors = consecutive_errors.saturating_add(1);
                warn!(error = %e, consecutive_errors, "gpsd connection failed");
                if !sink.deliver(SensorEvent::error(
                    watch,
                    SensorError::Unavailable(e.to_string()),
                )) {
                    break;
                }
            }
        }
    }

    info!(%watch, "gpsd watch stopped");
}

enum StreamEnd {
    SinkClosed,
    Disconnected,
}

async fn stream_reports(
    address: &str,
    watch: WatchId,
    sink: &SensorSink,
) -> std::io::Result<StreamEnd> {
    let mut stream = TcpStream::connect(address).await?;
    stream.write_all(WATCH_COMMAND).await?;

    let mut lines = BufReader::new(stream).lines();
    let mut fixes: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(outcome) = parse_report(&line) else {
            trace!(len = line.len(), "Ignoring gpsd report");
            continue;
        };

        if outcome.is_ok() {
            fixes += 1;
            if fixes == 1 {
                info!(%watch, "First gpsd fix received");
            }
        }

        if !sink.deliver(SensorEvent { watch, outcome }) {
            return Ok(StreamEnd::SinkClosed);
        }
    }

    Ok(StreamEnd::Disconnected)
}

/// Subset of a gpsd JSON report.
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: Option<u8>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    eph: Option<f64>,
    #[serde(default)]
    epx: Option<f64>,
    #[serde(default)]
    epy: Option<f64>,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    message: Option<String>,
}

/// Convert one line of gpsd output into a sensor outcome.
///
/// Returns `None` for reports that carry no position (VERSION, DEVICES, SKY,
/// TPV without a fix, malformed lines).
pub fn parse_report(line: &str) -> Option<Result<SensorReading, SensorError>> {
    let report: Report = serde_json::from_str(line).ok()?;

    match report.class.as_str() {
        "TPV" => {
            if report.mode.unwrap_or(0) < 2 {
                return None;
            }
            let accuracy = report
                .eph
                .or_else(|| match (report.epx, report.epy) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    (Some(v), None) | (None, Some(v)) => Some(v),
                    (None, None) => None,
                })
                .unwrap_or(UNKNOWN_ACCURACY_M);

            Some(Ok(SensorReading {
                latitude: report.lat?,
                longitude: report.lon?,
                accuracy,
                timestamp: report.time.unwrap_or_else(Utc::now),
            }))
        }
        "ERROR" => Some(Err(SensorError::Unavailable(
            report
                .message
                .unwrap_or_else(|| "gpsd reported an error".to_string()),
        ))),
        _ => None,
    }
}

/// Calculate exponential backoff: 2^n seconds, capped at MAX_BACKOFF.
fn calculate_backoff(consecutive_errors: u32) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_errors.min(20));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
