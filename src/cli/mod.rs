//! CLI-specific utilities for delivery-dash
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod export;
pub mod logging;

pub use export::{run_render, RenderArgs};
pub use logging::{init_logging, LogFormat};
