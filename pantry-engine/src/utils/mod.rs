//! Utility Module
//!
//! Cross-cutting helpers: logging setup and business-timezone time math.

pub mod logger;
pub mod time;
