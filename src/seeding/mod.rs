//! Offline data preparation
//!
//! Commands that write stored records in bulk: importing aggregate student
//! statistics, distributing them over schools, grading accreditation, and
//! resetting the store.

pub mod accreditation;
pub mod distribute;
pub mod import;

pub use accreditation::{accreditation_for_npsn, run_accreditation, AccreditationReport};
pub use distribute::{
    plan_distribution, run_distribution, DistributionPlan, DistributionReport, GroupReport,
    RejectedGroup,
};
pub use import::{import_statistics, prepare_statistics, ImportReport, StatisticBatch};
