//! Foundation module - Core utilities and types
//!
//! - Math types
//! - Time measurement
//! - Logging utilities

pub mod logging;
pub mod math;
pub mod time;
