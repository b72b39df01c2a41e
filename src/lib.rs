//! Lightball arena client core
//!
//! Orientation-driven camera, time-driven enemy motion, camera-ray shooting
//! and the client-side match state, behind a single-owner engine task that
//! talks to the game server over WebSocket.

pub mod config;
pub mod engine;
pub mod game;
pub mod input;
pub mod math;
pub mod orientation;
pub mod util;
pub mod ws;
