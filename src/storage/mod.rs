//! Persistence for schools, student statistics, education programs and
//! dashboard accounts
//!
//! Records live in a single SQLite database behind the repository traits in
//! [`repository`]. This module holds the query types shared by every
//! repository: filters and pagination.

pub mod repository;

use serde::{Deserialize, Serialize};

use crate::models::{Accreditation, Level, Ownership};

pub use repository::{
    create_sqlite_store, AdminRepository, ProgramRepository, SchoolRepository, SharedStore,
    SqliteStore, StudentStatisticRepository,
};

/// Page request, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Build a page request, clamping `page` to at least 1 and `limit` to
    /// `1..=max_limit`
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Number of pages, never less than one
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1))).max(1)
    }
}

/// School listing filters; text filters are case-insensitive substrings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchoolFilter {
    pub level: Option<Level>,
    pub ownership: Option<Ownership>,
    pub district: Option<String>,
    pub regency: Option<String>,
    pub accreditation: Option<Accreditation>,
    /// Matches name, NPSN or address
    pub search: Option<String>,
}

/// Student statistic filters
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticFilter {
    pub level: Option<Level>,
    pub ownership: Option<Ownership>,
    /// Case-insensitive regency substring
    pub regency: Option<String>,
    /// Exact academic year, e.g. `2023/2024`
    pub academic_year: Option<String>,
}

/// Row counts removed by a reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub schools: usize,
    pub statistics: usize,
    pub programs: usize,
}
