//! Polling synchronization engine.
//!
//! `poll_state` is the pure per-subscription fetch lifecycle; `engine` wires
//! it to the network, the timers, and the subscription arena.

pub mod engine;
pub mod poll_state;
