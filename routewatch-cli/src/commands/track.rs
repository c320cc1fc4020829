//! `routewatch track` - follow the device position.
//!
//! Fixes come from gpsd, or from a JSON-lines replay file:
//!
//! ```text
//! {"lat": -23.5505, "lon": -46.6333, "accuracy": 35.0, "delay_ms": 1000}
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;
use tracing::{debug, info};

use routewatch::coord::LonLat;
use routewatch::render::{MapWidget, MemoryMap};
use routewatch::route::{BackendError, RouteRequest, RouteResponse, RoutingBackend};
use routewatch::session::{Session, SessionEvent, UiCommand};
use routewatch::status::StatusLog;
use routewatch::tracking::{GeolocationSource, GpsdSource, ScriptedGeolocation};

use super::ready_session;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Track command arguments.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Keep the view centered on every reliable fix
    #[arg(long)]
    pub follow: bool,

    /// Recenter on every reliable fix without enabling follow mode
    #[arg(long)]
    pub force_center: bool,

    /// Stop after this many seconds (default: until Ctrl-C)
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Replay fixes from a JSON-lines file instead of gpsd
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

/// One line of a replay file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayFix {
    pub lat: f64,
    pub lon: f64,
    pub accuracy: f64,
    /// Pause before this fix is delivered.
    #[serde(default)]
    pub delay_ms: u64,
}

/// Routing is not available while tracking.
#[derive(Debug, Clone, Copy)]
struct NoRouting;

impl RoutingBackend for NoRouting {
    async fn geocode(&self, _address: &str) -> Result<LonLat, BackendError> {
        Err(BackendError::Network("routing is disabled while tracking".to_string()))
    }

    async fn compute_route(&self, _request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        Err(BackendError::Network("routing is disabled while tracking".to_string()))
    }
}

/// Run the track command.
pub async fn run(args: TrackArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("track");
    let history = StatusLog::with_capacity(1);
    let duration = args.duration.map(Duration::from_secs);

    match &args.replay {
        Some(path) => {
            let fixes = load_replay(path)?;
            info!(path = %path.display(), fixes = fixes.len(), "Replaying fixes");

            let gps = ScriptedGeolocation::new();
            let mut session = ready_session(&runner, gps.clone(), NoRouting, &history);
            start(&mut session, &args);

            let tx = session.sender();
            tokio::spawn(async move {
                for fix in fixes {
                    tokio::time::sleep(Duration::from_millis(fix.delay_ms)).await;
                    if !gps.emit(fix.lat, fix.lon, fix.accuracy) {
                        debug!("Replay target closed");
                        break;
                    }
                }
                let _ = tx.send(SessionEvent::Shutdown);
            });

            drive(session, duration).await
        }
        None => {
            let source = GpsdSource::new(runner.config().gpsd_config());
            let mut session = ready_session(&runner, source, NoRouting, &history);
            start(&mut session, &args);
            drive(session, duration).await
        }
    }
}

fn start<G: GeolocationSource>(session: &mut Session<G, MemoryMap, NoRouting>, args: &TrackArgs) {
    session.handle(
        UiCommand::StartTracking {
            force_center: args.force_center,
        }
        .into(),
    );
    if args.follow {
        session.handle(UiCommand::SetFollow(true).into());
    }
}

async fn drive<G: GeolocationSource>(
    mut session: Session<G, MemoryMap, NoRouting>,
    duration: Option<Duration>,
) -> Result<(), CliError> {
    let shutdown = session.shutdown_token();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            interrupt.cancel();
        }
    });
    let limit = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(limit);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            alive = session.step() => {
                if !alive {
                    break;
                }
            }
            _ = &mut limit => {
                info!("Tracking duration elapsed");
                break;
            }
        }
    }

    let last = session.store().position().cloned();
    let view = session.map().view();
    session.handle(SessionEvent::Shutdown);

    println!();
    match last {
        Some(position) => println!(
            "Last position: {:.6}, {:.6} ({})",
            position.lat, position.lon, position.accuracy
        ),
        None => println!("No position received"),
    }
    if let Some(center) = view.center {
        println!(
            "Map view: {:.6}, {:.6} at zoom {:.1}",
            center.lat, center.lon, view.zoom
        );
    }
    Ok(())
}

/// Parse a JSON-lines replay file. Blank lines and `#` comments are skipped.
pub fn load_replay(path: &Path) -> Result<Vec<ReplayFix>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Replay {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    parse_replay(&content).map_err(|error| CliError::Replay {
        path: path.to_path_buf(),
        error,
    })
}

fn parse_replay(content: &str) -> Result<Vec<ReplayFix>, String> {
    content
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| serde_json::from_str(line).map_err(|e| format!("line {}: {}", n, e)))
        .collect()
}
