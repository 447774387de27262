//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use crate::models::{AnalysisSummary, Task};

/// Newtype wrapper for displaying analysis listings.
pub struct AnalysisSummaries(pub Vec<AnalysisSummary>);

impl fmt::Display for AnalysisSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No analyses found.");
        }
        for summary in &self.0 {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying task listings.
///
/// # Examples
///
/// ```rust
/// use siteplan_core::display::Tasks;
///
/// assert_eq!(Tasks(vec![]).to_string(), "No tasks found.\n");
/// ```
pub struct Tasks(pub Vec<Task>);

impl fmt::Display for Tasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No tasks found.");
        }
        for task in &self.0 {
            write!(f, "{task}")?;
        }
        Ok(())
    }
}
