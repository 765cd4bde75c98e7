//! Session runs and path queries backing the CLI.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use keeper_core::config::SessionConfig;
use keeper_core::error::{ConfigError, KeeperError};
use keeper_core::game_loop::{LoopKind, LoopStatus};
use keeper_core::map::{TileMap, TilePos};
use keeper_core::math::Fixed;
use keeper_core::navigable::Capability;
use keeper_core::navigation::NavigationService;
use keeper_core::session::{doors_of, Session};
use keeper_core::systems::WorldStats;

/// Errors from the headless runner.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Level could not be loaded.
    #[error("Failed to load level: {0}")]
    Config(#[from] ConfigError),

    /// Session setup or lifecycle failed.
    #[error("Session error: {0}")]
    Session(#[from] KeeperError),

    /// A queried tile lies outside the level.
    #[error("Tile {0} is outside the map")]
    OutOfBounds(TilePos),

    /// Tokio runtime could not be built.
    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// Report could not be serialized.
    #[error("Failed to write report: {0}")]
    Report(#[from] ron::Error),
}

/// Outcome of one loop.
#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    /// Which loop.
    pub kind: LoopKind,
    /// Ticks completed.
    pub ticks: u64,
    /// Final status, or the fault that ended the loop.
    pub status: String,
}

/// Final state of one creature.
#[derive(Debug, Clone, Serialize)]
pub struct CreatureReport {
    /// Display name.
    pub name: String,
    /// Final tile.
    pub position: TilePos,
    /// Tiles moved.
    pub steps: u64,
}

/// Summary of a session run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Wall-clock time the loops ran for.
    pub seconds: f64,
    /// Per-loop tick counts.
    pub loops: Vec<LoopReport>,
    /// Creatures at the end of the run.
    pub creatures: Vec<CreatureReport>,
    /// World counters.
    pub stats: WorldStats,
}

impl RunReport {
    /// Ticks of `kind`, zero if the loop is absent.
    #[must_use]
    pub fn ticks(&self, kind: LoopKind) -> u64 {
        self.loops
            .iter()
            .find(|report| report.kind == kind)
            .map_or(0, |report| report.ticks)
    }

    /// Pretty RON rendering.
    pub fn to_ron(&self) -> Result<String, HeadlessError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}

/// Answer to a single path query.
#[derive(Debug, Clone)]
pub struct PathReport {
    /// Tiles from start to goal, empty when no path exists.
    pub tiles: Vec<TilePos>,
    /// Total path cost.
    pub cost: Option<Fixed>,
}

impl PathReport {
    /// True if a path was found.
    #[must_use]
    pub fn found(&self) -> bool {
        self.cost.is_some()
    }
}

/// Run a session built from `config` for `duration`, then stop it.
///
/// Must be called from within a tokio runtime.
pub async fn run_for(config: &SessionConfig, duration: Duration) -> Result<RunReport, HeadlessError> {
    let mut session = Session::from_config(config)?;
    session.start()?;
    tracing::info!(?duration, creatures = config.creatures.len(), "session running");

    tokio::time::sleep(duration).await;
    session.stop().await?;

    let manager = session.manager();
    let loops = manager
        .loop_kinds()
        .into_iter()
        .map(|kind| {
            let status = match manager.loop_status(kind) {
                Some(LoopStatus::Failed(err)) => format!("failed: {err}"),
                Some(status) => format!("{status:?}"),
                None => String::from("missing"),
            };
            LoopReport {
                kind,
                ticks: manager.tick_count(kind).unwrap_or(0),
                status,
            }
        })
        .collect();

    let creatures = session
        .world()
        .read()
        .creatures()
        .map(|creature| CreatureReport {
            name: creature.name.clone(),
            position: creature.position,
            steps: creature.steps_taken,
        })
        .collect();

    Ok(RunReport {
        seconds: duration.as_secs_f64(),
        loops,
        creatures,
        stats: session.stats(),
    })
}

/// Find a path between two tiles of the level described by `config`.
pub fn query_path(
    config: &SessionConfig,
    from: TilePos,
    to: TilePos,
    capability: &Capability,
) -> Result<PathReport, HeadlessError> {
    let map = config.build_map()?;
    for pos in [from, to] {
        if map.tile(pos).is_none() {
            return Err(HeadlessError::OutOfBounds(pos));
        }
    }
    let doors = doors_of(&map);
    let navigation = NavigationService::new(map, doors, config.cost_policy);

    Ok(match navigation.find_path(from, to, capability) {
        Some(path) => PathReport {
            tiles: path.tiles().collect(),
            cost: Some(path.total_cost()),
        },
        None => PathReport {
            tiles: Vec::new(),
            cost: None,
        },
    })
}

/// Parse an `x,y` tile argument.
pub fn parse_tile(arg: &str) -> Result<TilePos, String> {
    let (x, y) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{arg}'"))?;
    let x = x
        .trim()
        .parse()
        .map_err(|err| format!("bad x in '{arg}': {err}"))?;
    let y = y
        .trim()
        .parse()
        .map_err(|err| format!("bad y in '{arg}': {err}"))?;
    Ok(TilePos::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_test_utils::fixtures::{flyer, pos, walker};

    fn level() -> SessionConfig {
        SessionConfig::from_ron_str(
            r######"SessionConfig(
                logic_ticks_per_second: 4,
                animation_ticks_per_second: 20,
                steering_ticks_per_second: 10,
                map: [
                    "#####",
                    "#...#",
                    "#.#.#",
                    "#...#",
                    "#####",
                ],
                creatures: [(name: "imp", x: 1, y: 1, capability: (owner: (1)))],
            )"######,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_tile() {
        assert_eq!(parse_tile("3,4"), Ok(TilePos::new(3, 4)));
        assert_eq!(parse_tile(" 0 , 7 "), Ok(TilePos::new(0, 7)));
        assert!(parse_tile("3").is_err());
        assert!(parse_tile("a,1").is_err());
        assert!(parse_tile("1,-1").is_err());
    }

    #[test]
    fn test_query_path() {
        let report = query_path(&level(), pos(1, 1), pos(3, 3), &walker()).unwrap();
        assert!(report.found());
        assert_eq!(report.tiles.len(), 5);
        assert_eq!(report.cost, Some(Fixed::from_num(4)));
    }

    #[test]
    fn test_query_path_flyer_crosses_wall() {
        let report = query_path(&level(), pos(0, 0), pos(4, 4), &flyer()).unwrap();
        assert!(report.found());
        assert_eq!(report.tiles.len(), 9);
    }

    #[test]
    fn test_query_path_out_of_bounds() {
        assert!(matches!(
            query_path(&level(), pos(1, 1), pos(9, 9), &walker()),
            Err(HeadlessError::OutOfBounds(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_reports_ticks() {
        let report = run_for(&level(), Duration::from_secs(2)).await.unwrap();
        assert!(report.ticks(LoopKind::Logic) >= 7);
        assert!(report.ticks(LoopKind::Animation) >= 39);
        assert_eq!(report.creatures.len(), 1);
        assert!(report.stats.path_requests > 0);
        assert!(report.to_ron().unwrap().contains("imp"));
    }
}
