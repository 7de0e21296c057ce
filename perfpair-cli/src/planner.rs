//! Run Planner
//!
//! Builds the run plan by selecting suites and filtering their groups.
//!
//! Filtering options:
//! - Suite selection by id (`all` keeps every suite)
//! - Regex pattern matching on group id
//!
//! Ordering: suites and groups keep their registration order. Groups that
//! do not match the filter are dropped without a skip notice; suites left
//! with no groups are dropped entirely.

use perfpair_core::Suite;
use regex::Regex;

/// Suite selector meaning "every suite"
pub const ALL_SUITES: &str = "all";

/// Ordered suites to run
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Suites in run order, each holding only selected groups
    pub suites: Vec<Suite>,
}

impl RunPlan {
    /// Total number of selected groups
    pub fn group_count(&self) -> usize {
        self.suites.iter().map(|s| s.groups.len()).sum()
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

/// Build a run plan from registered suites
pub fn build_plan(
    suites: impl IntoIterator<Item = Suite>,
    suite: &str,
    filter: Option<&Regex>,
) -> RunPlan {
    let suites = suites
        .into_iter()
        .filter(|s| suite == ALL_SUITES || s.id == suite)
        .map(|s| match filter {
            Some(re) => s.retain_groups(|g| re.is_match(g.id)),
            None => s,
        })
        .filter(|s| !s.groups.is_empty())
        .collect();

    RunPlan { suites }
}
