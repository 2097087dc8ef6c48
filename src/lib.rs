//! verbump - version drift reconciliation library
//!
//! This library provides the building blocks for keeping version references
//! in repository files in sync with upstream releases:
//! - Version sources (release-monitoring.org, npm, crates.io)
//! - Pattern and structured-field extraction
//! - The reconcile cycle and the proposal gate
//! - A GitHub hosting client and the run orchestrator

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod hosting;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod proposal;
pub mod reconcile;
pub mod source;
