//! Testing utilities and fixtures
//!
//! Mock implementations of the crate's external-service seams plus canned
//! sample data, shared by the unit and integration test suites.

pub mod mocks;

pub use mocks::{sample_analysis, sample_project, status_report, MockGateway, RecordingObserver};
