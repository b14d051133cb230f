//! Common types for the jsem Java source analyzer.
//!
//! This crate provides the foundational types shared by the other jsem
//! crates:
//! - Source spans (`Span`)
//! - Diagnostics handed to the rule-check harness (`Diagnostic`,
//!   `DiagnosticCollector`)

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCollector};
pub use span::Span;
