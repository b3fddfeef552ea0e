//! Candidate records, CSV import/export, and profile views for a talent program.

pub mod config;
pub mod directory;
pub mod error;
pub mod exports;
pub mod imports;
pub mod profiles;
pub mod store;
pub mod telemetry;
