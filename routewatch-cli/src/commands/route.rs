//! `routewatch route` - compute one route and describe the overlay.

use std::time::Duration;

use clap::Args;
use tracing::info;

use routewatch::render::{FeatureRole, MemoryMap};
use routewatch::route::{Constraints, HttpBackend, RouteCommand, GPS_TOKEN};
use routewatch::session::{Session, SessionEvent, UiCommand};
use routewatch::status::StatusLog;
use routewatch::tracking::{GeolocationSource, GpsdSource, ScriptedGeolocation};

use super::ready_session;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Route command arguments.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Destination address or "lat, lon"
    #[arg(long)]
    pub to: String,

    /// Origin address, "lat, lon", or GPS for the current position
    #[arg(long, default_value = GPS_TOKEN)]
    pub from: String,

    /// Road feature to avoid (repeatable), e.g. tolls
    #[arg(long, value_name = "FEATURE")]
    pub avoid: Vec<String>,

    /// Road feature to prefer (repeatable)
    #[arg(long, value_name = "FEATURE")]
    pub prefer: Vec<String>,

    /// Read the current position from gpsd (needed for a GPS origin)
    #[arg(long)]
    pub gpsd: bool,

    /// Seconds to wait for a reliable fix when using gpsd
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub fix_wait: u64,
}

/// Run the route command.
pub async fn run(args: RouteArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("route");

    let backend = runner.http_backend()?;
    let command = RouteCommand::new(args.from.as_str(), args.to.as_str())
        .with_constraints(Constraints::new(args.avoid.clone(), args.prefer.clone()));
    let history = StatusLog::with_capacity(1);

    if args.gpsd {
        let source = GpsdSource::new(runner.config().gpsd_config());
        let mut session = ready_session(&runner, source, backend, &history);
        wait_for_fix(&mut session, Duration::from_secs(args.fix_wait)).await?;
        compute(session, command, &history).await
    } else {
        // Without gpsd the position is never known; a GPS origin is
        // rejected with a status message.
        let session = ready_session(&runner, ScriptedGeolocation::new(), backend, &history);
        compute(session, command, &history).await
    }
}

async fn wait_for_fix<G: GeolocationSource>(
    session: &mut Session<G, MemoryMap, HttpBackend>,
    wait: Duration,
) -> Result<(), CliError> {
    session.handle(UiCommand::StartTracking { force_center: false }.into());
    let threshold = session.tracking().config().reliability_threshold;

    let waiting = async {
        loop {
            let reliable = session
                .store()
                .position()
                .is_some_and(|p| p.is_reliable(threshold));
            if reliable {
                return true;
            }
            if !session.step().await {
                return false;
            }
        }
    };

    match tokio::time::timeout(wait, waiting).await {
        Ok(true) => Ok(()),
        _ => Err(CliError::NoFix {
            waited_secs: wait.as_secs(),
        }),
    }
}

async fn compute<G: GeolocationSource>(
    mut session: Session<G, MemoryMap, HttpBackend>,
    command: RouteCommand,
    history: &StatusLog,
) -> Result<(), CliError> {
    session.handle(UiCommand::RequestRoute(command).into());
    while session.routes().is_busy() {
        if !session.step().await {
            break;
        }
    }

    let outcome = match session.routes().last_outcome().cloned() {
        Some(outcome) => outcome,
        None => {
            let reason = history
                .last()
                .map(|s| s.text)
                .unwrap_or_else(|| "no route computed".to_string());
            session.handle(SessionEvent::Shutdown);
            return Err(CliError::RouteFailed(reason));
        }
    };

    info!(
        route_lines = outcome.drawn.route_lines,
        traffic_segments = outcome.drawn.traffic_segments,
        incidents = outcome.drawn.incidents,
        "Route overlay drawn"
    );

    println!();
    println!("Route");
    println!("=====");
    println!("  {}", outcome.summary);
    if let Some(optimization) = &outcome.optimization {
        for line in optimization.to_string().lines() {
            println!("  {}", line);
        }
    }
    println!(
        "  Overlay: {} route line(s), {} traffic segment(s), {} incident(s)",
        outcome.drawn.route_lines, outcome.drawn.traffic_segments, outcome.drawn.incidents
    );
    for (_, incident) in session.map().features_with_role(FeatureRole::Incident) {
        if let Some(label) = &incident.label {
            println!("    - {}", label);
        }
    }
    let extent = outcome.drawn.extent;
    println!(
        "  Bounds: {:.5},{:.5} .. {:.5},{:.5}",
        extent.min_lat, extent.min_lon, extent.max_lat, extent.max_lon
    );

    session.handle(SessionEvent::Shutdown);
    Ok(())
}
