//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Simulation time and availability intervals
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
