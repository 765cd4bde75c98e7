//! Error types for the navigation core and loop manager.
//!
//! Expected "nothing found" outcomes (no tile, no path, no random tile) are
//! `Option`s, not errors. The types here cover construction mistakes,
//! lifecycle misuse and system faults.

use std::time::Duration;

use thiserror::Error;

use crate::game_loop::LoopKind;

/// Result type alias using [`KeeperError`].
pub type Result<T> = std::result::Result<T, KeeperError>;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Map construction failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Loop manager misuse or failure.
    #[error(transparent)]
    Loop(#[from] LoopError),

    /// Session configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while building or decoding a [`GridMap`](crate::map::GridMap).
#[derive(Debug, Error)]
pub enum MapError {
    /// Width or height was zero.
    #[error("Map must have a positive size, got {width}x{height}")]
    EmptyMap {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// ASCII rows have different lengths.
    #[error("Map row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },

    /// A character in an ASCII map has no terrain meaning.
    #[error("Unknown map glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },

    /// Tile storage does not match the declared size.
    #[error("Map snapshot holds {found} tiles, expected {expected}")]
    TileCountMismatch {
        /// `width * height`.
        expected: usize,
        /// Actual number of tiles.
        found: usize,
    },

    /// Binary snapshot could not be encoded or decoded.
    #[error("Map snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Errors raised by the [`GameLoopManager`](crate::game_loop::GameLoopManager).
#[derive(Debug, Error)]
pub enum LoopError {
    /// A loop was registered with a zero interval.
    #[error("Loop {kind:?} needs a positive tick interval, got {interval:?}")]
    ZeroInterval {
        /// Loop being registered.
        kind: LoopKind,
        /// Requested interval.
        interval: Duration,
    },

    /// The same loop kind was registered twice.
    #[error("Loop {0:?} is already registered")]
    DuplicateLoop(LoopKind),

    /// Loops can only be registered before `start()`.
    #[error("Loops cannot be registered after the manager has started")]
    RegistrationClosed,

    /// `start()` was called on a running or paused manager.
    #[error("Game loops are already running")]
    AlreadyRunning,

    /// The manager was stopped and cannot be restarted.
    #[error("Game loop manager was stopped; create a new one for a new session")]
    AlreadyStopped,

    /// `pause()`, `resume()` or `stop()` was called before `start()`.
    #[error("Game loops have not been started")]
    NotStarted,

    /// `start()` was called outside a tokio runtime.
    #[error("No tokio runtime available to drive the game loops")]
    NoRuntime,
}

/// A fault raised by a [`GameSystem`](crate::game_loop::GameSystem) during a tick.
///
/// A fault ends the loop the system belongs to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("System '{system}' failed at tick {tick}: {message}")]
pub struct SystemError {
    /// Name of the failing system.
    pub system: String,
    /// Tick number being processed.
    pub tick: u64,
    /// Failure description.
    pub message: String,
}

impl SystemError {
    /// Create a new system error.
    pub fn new(system: impl Into<String>, tick: u64, message: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            tick,
            message: message.into(),
        }
    }
}

/// Errors raised while loading a [`SessionConfig`](crate::config::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Session config not found: {0}")]
    FileNotFound(String),

    /// Failed to read file.
    #[error("Failed to read session config: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse RON.
    #[error("Failed to parse session config: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    /// A value is out of range.
    #[error("Invalid session config: {0}")]
    Invalid(String),

    /// The embedded map is malformed.
    #[error("Invalid map in session config: {0}")]
    Map(#[from] MapError),
}
