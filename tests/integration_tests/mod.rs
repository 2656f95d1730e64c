//! Integration tests module
//!
//! End-to-end tests over an in-memory SQLite store:
//! - HTTP API behaviour through the full router
//! - Account registration, login and management
//! - Student-count distribution and accreditation seeding
//! - Error handling and response envelopes

pub mod admin_test;
pub mod api_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod seeding_test;
