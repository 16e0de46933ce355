//! Ludo game engine and computer players
//!
//! Four-color Ludo with a pure rules engine, a timed controller for
//! interactive front-ends, and heuristic players for simulation.
//!
//! This crate re-exports the engine crate for convenience.

pub mod agent;
pub mod display;
pub mod simulate;

pub use ludo_engine::*;
