// Type definitions for the settings migration

pub mod setting;
pub mod stats;

pub use setting::*;
pub use stats::*;
