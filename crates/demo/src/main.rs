use std::env;
use std::num::ParseIntError;
use std::process::ExitCode;

use iso_engine::{
    resolve_engine_config, ConfigError, EngineConfig, GridPos, IsoWorld, IsometricLayout,
    MotionError, MovableSpec, PropertyBag, SpawnError, TransitError, TransitEvent, TweenRequest,
    TweenTargetId, WorldError,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const MAX_TICKS_ENV_VAR: &str = "ISO_DEMO_MAX_TICKS";
const DEFAULT_MAX_TICKS: u64 = 5_000;
const MAP_COLUMNS: u32 = 12;
const MAP_ROWS: u32 = 10;
const WALL_COLUMN: u32 = 6;
const WALL_ROWS: std::ops::RangeInclusive<u32> = 2..=7;
const BANNER_TARGET: TweenTargetId = TweenTargetId(1);

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    Transit(#[from] TransitError),
    #[error(transparent)]
    Motion(#[from] MotionError),
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("invalid {var} value '{value}': {source}")]
    MaxTicks {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DemoSummary {
    ticks: u64,
    events: usize,
    idle: bool,
}

fn main() -> ExitCode {
    init_tracing();
    info!("=== Iso Demo Startup ===");

    match run() {
        Ok(summary) => {
            if summary.idle {
                info!(ticks = summary.ticks, events = summary.events, "demo_finished");
            } else {
                warn!(ticks = summary.ticks, events = summary.events, "demo_tick_cap_reached");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn run() -> Result<DemoSummary, DemoError> {
    let config = resolve_engine_config()?;
    let max_ticks = resolve_max_ticks()?;
    let mut world = build_world(config)?;
    Ok(drive(&mut world, max_ticks))
}

fn resolve_max_ticks() -> Result<u64, DemoError> {
    match env::var(MAX_TICKS_ENV_VAR) {
        Ok(value) => parse_max_ticks(&value),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_MAX_TICKS),
        Err(source) => Err(DemoError::EnvVar {
            var: MAX_TICKS_ENV_VAR,
            source,
        }),
    }
}

fn parse_max_ticks(raw: &str) -> Result<u64, DemoError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|source| DemoError::MaxTicks {
            var: MAX_TICKS_ENV_VAR,
            value: raw.to_string(),
            source,
        })
}

/// Open map with a wall segment splitting it into west and east halves.
fn map_weights() -> Vec<u8> {
    let mut weights = vec![1u8; (MAP_COLUMNS * MAP_ROWS) as usize];
    for r in WALL_ROWS {
        weights[(r * MAP_COLUMNS + WALL_COLUMN) as usize] = 0;
    }
    weights
}

/// Two movables on opposite sides of the wall, each heading for the other's
/// side, plus a banner fading in.
fn build_world(config: EngineConfig) -> Result<IsoWorld, DemoError> {
    let layout = IsometricLayout::new(config.transit.tile_width, config.transit.tile_height);
    let mut world = IsoWorld::from_weights(
        config,
        MAP_COLUMNS,
        MAP_ROWS,
        &map_weights(),
        Box::new(layout),
    )?;

    let eastbound = world.spawn_movable(MovableSpec::at(GridPos::new(1, 4)))?;
    let westbound = world.spawn_movable(MovableSpec::at(GridPos::new(10, 5)).with_speed(3.0))?;
    world.set_followed(Some(eastbound));

    let outcome = world.move_to(eastbound, GridPos::new(10, 4))?;
    info!(movable = eastbound.0, outcome = ?outcome, "move_requested");
    let outcome = world.move_to(westbound, GridPos::new(1, 5))?;
    info!(movable = westbound.0, outcome = ?outcome, "move_requested");

    world.insert_tween_target(BANNER_TARGET, PropertyBag::new().with("alpha", 0.0));
    world.add_tween(
        BANNER_TARGET,
        TweenRequest::new(1.0)
            .to("alpha", 1.0)
            .on_complete(|target, _| info!(target = target.0, "banner_visible")),
    )?;
    Ok(world)
}

/// Ticks until nothing is moving or tweening, or `max_ticks` is reached.
fn drive(world: &mut IsoWorld, max_ticks: u64) -> DemoSummary {
    let mut summary = DemoSummary {
        ticks: 0,
        events: 0,
        idle: !world.is_active(),
    };
    for event in world.drain_events() {
        log_event(&event);
        summary.events += 1;
    }

    while !summary.idle && summary.ticks < max_ticks {
        world.run();
        summary.ticks += 1;
        for event in world.drain_events() {
            log_event(&event);
            summary.events += 1;
        }
        summary.idle = !world.is_active();
    }
    summary
}

fn log_event(event: &TransitEvent) {
    match event {
        TransitEvent::CameraFollow { movable, position } => {
            debug!(movable = movable.0, x = position.x, y = position.y, "camera_follow");
        }
        TransitEvent::TileChanged { movable, from, to } => {
            debug!(movable = movable.0, from = %from, to = %to, "tile_changed");
        }
        TransitEvent::DirectionChanged { movable, from, to } => {
            debug!(
                movable = movable.0,
                from = from.as_token(),
                to = to.as_token(),
                "direction_changed"
            );
        }
        TransitEvent::OtherObjectsOnNextTile {
            movable,
            tile,
            others,
        } => {
            info!(movable = movable.0, tile = %tile, others = others.len(), "tile_shared");
        }
        TransitEvent::StepBlocked { movable, tile } => {
            info!(movable = movable.0, tile = %tile, "step_blocked");
        }
        TransitEvent::Replanned {
            movable,
            reason,
            steps,
        } => {
            info!(movable = movable.0, reason = ?reason, steps, "replanned");
        }
        TransitEvent::DestinationReached { movable, tile } => {
            info!(movable = movable.0, tile = %tile, "destination_reached");
        }
        TransitEvent::DestinationUnreachable {
            movable,
            from,
            destination,
        } => {
            warn!(
                movable = movable.0,
                from = %from,
                destination = %destination,
                "destination_unreachable"
            );
        }
        TransitEvent::Relocated { movable, from, to } => {
            info!(movable = movable.0, from = %from, to = %to, "relocated");
        }
    }
}
