//! Core contracts for Schoolforge.
//!
//! This crate defines the configuration, the record types for the five
//! output tables, and the class tier table shared by the simulation and
//! the CLI.

pub mod config;
pub mod error;
pub mod model;

pub use config::{SimulationConfig, StudentDistribution, calculate_student_distribution, id_multiplier};
pub use error::{Error, Result};
pub use model::{
    AcademicRecord, CatalogEntry, EnrollmentRecord, EnrollmentStatus, GraduateRecord,
    SchoolDataset, SemesterOutcome, StudentIdentity, StudentRow, TerminatedRecord, TierTable,
};

/// Minimum aggregate percentage to pass an assessment period.
pub const PASS_MARK: f64 = 30.0;
