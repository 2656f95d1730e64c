//! REST API for the education dashboard
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 API Server                   │
//! │   CORS ─▶ TraceLayer ─▶ request metrics      │
//! │                                              │
//! │  /api/schools     CRUD + stats + analyses    │
//! │  /api/students    statistics + ingestion     │
//! │  /api/programs    CRUD + stats               │
//! │  /api/dashboard   combined overview          │
//! │  /api/auth        register + login           │
//! │  /api/admin       account management         │
//! │  /api/health, /metrics                       │
//! └──────────────────────────────────────────────┘
//!                       │ spawn_blocking
//!                       ▼
//!               ┌───────────────┐
//!               │  SqliteStore  │
//!               └───────────────┘
//! ```
//!
//! Query parameters keep the dashboard frontend's names (`jenjang`,
//! `status_sekolah`, `kabupaten`, `tahun_ajaran`, ...).
//!
//! # Usage
//!
//! ```ignore
//! use edumon::api::{ApiServer, ServerConfig};
//! use edumon::storage::create_sqlite_store;
//!
//! let store = create_sqlite_store("data/edumon.db")?;
//! let server = ApiServer::new(ServerConfig::default(), store)?;
//! server.start_with_shutdown(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

mod admins;
pub mod config;
mod dashboard;
mod programs;
pub mod response;
pub mod routes;
mod schools;
pub mod server;
mod students;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use response::{ApiResponse, ApiResult};
pub use routes::create_router;
pub use server::{build_router, ApiServer, AppState, ServerError, ServerInfo};

use std::str::FromStr;

use crate::error::{Error, Result};

/// Trimmed query text, `None` when absent or blank
fn text_param(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse an optional query value; blank counts as absent
fn parse_param<T>(value: &Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    text_param(value).map(|v| v.parse()).transpose()
}
