//! Main Library File for PostgreSQL Settings Migration
//! Carries customized settings from an old configuration file or server
//! into a new configuration file or server, keeping the new layout,
//! comments and defaults intact.

// Configuration and Core Pipeline
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Rename and obsolescence tables
pub mod registry;

// Stage 1: Source Loading
pub mod loader;

// Stage 2: Target Reconciliation
pub mod reconciler;

// Live server access
pub mod server;

// Stage 3: Report Generation
pub mod report;

pub use report::{
    Decision,
    ReportConfig,
    ReportData,
    ReportEntry,
    ReportFormat,
    ReportGenerator,
    ReportSeverity,
};

// Shared Utilities
pub mod utils;

// Re-exports for crate consumers
pub use config::{MigrationConfig, SourceConfig, TargetConfig};
pub use error::{Error, Result};
pub use loader::SourceLoader;
pub use pipeline::{MigrationSummary, Pipeline};
pub use server::{GucServer, PgServer, ServerSetting};
pub use types::{ChangeSummary, LoadStats, Setting, SettingsMap, WriteState};
