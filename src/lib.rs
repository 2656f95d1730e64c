//! edumon - Education Monitoring Dashboard Backend
//!
//! REST backend for a regional education dashboard: schools, aggregate
//! student statistics and education programs per regency and district,
//! dashboard accounts, plus the seeding tools that prepare its data.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`allocation`] - Constrained distribution of a student total over a group of schools
//! - [`api`] - axum router, handlers and server
//! - [`auth`] - Dashboard accounts and password hashing
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//! - [`metrics`] - Prometheus metrics
//! - [`models`] - Core data structures and types
//! - [`seeding`] - Bulk data preparation (import, distribution, accreditation)
//! - [`stats`] - Aggregate reports over loaded records
//! - [`storage`] - Repository traits and the SQLite store
//!
//! # Example
//!
//! ```no_run
//! use edumon::config::Config;
//! use edumon::seeding::run_distribution;
//! use edumon::storage::SqliteStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let store = SqliteStore::open(&config.database.sqlite_path)?;
//!     let report = run_distribution(&store, &config.allocation.levels, Some(42), true)?;
//!     println!("{} groups allocated", report.groups.len());
//!     Ok(())
//! }
//! ```

pub mod allocation;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod seeding;
pub mod stats;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::allocation::{Allocation, AllocationError, Allocator, LevelLimits, Outcome};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        Accreditation, Admin, AdminRole, EducationProgram, GroupKey, Level, Ownership, School,
        StudentStatistic,
    };
    pub use crate::storage::{
        AdminRepository, ProgramRepository, SchoolRepository, SqliteStore,
        StudentStatisticRepository,
    };
}

// Direct re-exports for convenience
pub use models::{GroupKey, Level, Ownership};
