//! Tumorscan server library - HTTP routes and configuration.
//!
//! The binary in `main.rs` wires these modules together: it loads the model
//! and label artifacts once at startup, builds the shared [`api::AppState`],
//! and serves the warp route tree.

pub mod api;
pub mod config;
