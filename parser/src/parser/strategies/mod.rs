//! Pluggable parser strategies for the supported export layouts.

pub mod grammar;
pub mod positional;
pub mod preview;

use tkb_core::CourseMeeting;

use super::{IndexedLine, ParseDiagnostics};

/// Record produced by a strategy, tied to the 1-based line it starts on.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub line: usize,
    pub record: CourseMeeting,
}

/// Pluggable strategy for turning input lines into course records.
///
/// Strategies never fail: lines they cannot use are recorded as issues in
/// the diagnostics, together with relevant/recognized line counts.
pub trait ParserStrategy {
    fn name(&self) -> &'static str;
    fn collect(&self, lines: &[IndexedLine], diagnostics: &mut ParseDiagnostics) -> Vec<Candidate>;
}
