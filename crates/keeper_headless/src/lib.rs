//! Headless session runner for navigation and loop verification.
//!
//! Loads a level from RON, runs its loops for a bounded wall-clock time and
//! reports what happened. Also answers one-off path queries against a level,
//! which is handy when tuning maps.
//!
//! # Example
//!
//! ```bash
//! # Run the sample level for five seconds
//! cargo run -p keeper_headless -- run --config crates/keeper_headless/levels/sample.ron --seconds 5
//!
//! # Ask for a single path
//! cargo run -p keeper_headless -- path --config crates/keeper_headless/levels/sample.ron --from 1,1 --to 14,3
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod runner;
