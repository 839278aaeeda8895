//! Streaming meme search.
//!
//! The server answers `POST /search/stream` with `event:`/`data:` line pairs
//! describing each stage of its pipeline. This module turns that body back
//! into typed progress.
//!
//! # Architecture
//!
//! - `event`: stages and decoded stream events
//! - `decoder`: bytes → events, tolerant of arbitrary chunk boundaries
//! - `state`: the progress state machine fed by events
//! - `session`: one search at a time, cancellation and fallback
//! - `fallback`: offline substring matching over bundled memes

pub mod decoder;
pub mod event;
mod fallback;
mod session;
pub mod state;

pub use decoder::ByteStream;
pub use event::{Stage, PROGRESS_STEPS};
pub use fallback::fallback_matches;
pub use session::{LogObserver, SearchController, SearchOutcome, SessionObserver};
pub use state::SearchState;
