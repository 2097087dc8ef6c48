//! Core domain models for verbump
//!
//! This module contains the fundamental types used throughout the application:
//! - Source types for supported version sources
//! - Tracked software entries and their locators
//! - Reconcile decisions and per-entry outcomes
//! - Run summary structures

mod decision;
mod software;
mod source_type;
mod summary;

pub use decision::{EntryOutcome, ReconcileDecision, Update};
pub use software::{ExtractionMode, Locator, SoftwareEntry};
pub use source_type::{SourceStyle, SourceType};
pub use summary::{EntryReport, RunSummary};
