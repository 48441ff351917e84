//! # Users Testing Utils
//!
//! Shared testing utilities for the users service workspace: recording
//! doubles for the metrics backend and trace provider, entity builders, a
//! PostgreSQL test container and naming helpers.
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! users-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use users_testing_utils::mocks::{RecordingMetrics, RecordingTraceProvider};
//! use users_testing_utils::containers::DatabaseTestContainer;
//! ```

pub mod builders;
pub mod containers;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use containers::*;
pub use helpers::*;
pub use mocks::*;
