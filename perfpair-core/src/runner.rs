//! Benchmark Runner
//!
//! Walks a suite's groups in registration order, gating each on its required
//! capabilities. A group error is not caught: it aborts the run. Neither is
//! a failure to write the report: the reporter is checked around every group
//! so a closed output stops the run before more work is started.

use crate::bencher::Bencher;
use crate::capability::Capabilities;
use crate::reporter::{Event, Reporter};
use crate::{GroupDef, Suite};
use anyhow::Context;

/// Title of the closing banner
pub const COMPLETE_TITLE: &str = "Benchmark Complete!";

/// What happened to one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Variants ran; this many were measured
    Ran {
        /// Successful timed calls
        measurements: usize,
    },
    /// Not run because this capability is unavailable
    Skipped {
        /// First missing capability
        capability: &'static str,
    },
}

/// Counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Groups whose variants ran
    pub groups_run: usize,
    /// Groups skipped for a missing capability
    pub groups_skipped: usize,
    /// Timed calls reported
    pub measurements: usize,
}

impl RunSummary {
    fn add(&mut self, outcome: GroupOutcome) {
        match outcome {
            GroupOutcome::Ran { measurements } => {
                self.groups_run += 1;
                self.measurements += measurements;
            }
            GroupOutcome::Skipped { .. } => self.groups_skipped += 1,
        }
    }

    fn merge(&mut self, other: RunSummary) {
        self.groups_run += other.groups_run;
        self.groups_skipped += other.groups_skipped;
        self.measurements += other.measurements;
    }
}

/// Runs suites against a fixed capability registry
pub struct Runner<'a> {
    reporter: &'a dyn Reporter,
    capabilities: &'a Capabilities,
}

impl<'a> Runner<'a> {
    /// Create a runner
    pub fn new(reporter: &'a dyn Reporter, capabilities: &'a Capabilities) -> Self {
        Self {
            reporter,
            capabilities,
        }
    }

    /// Run one group, or skip it if a required capability is missing.
    ///
    /// The group's body (and therefore its fixture) is never entered when
    /// skipped.
    pub fn run_group(&self, group: &GroupDef) -> anyhow::Result<GroupOutcome> {
        if let Some(capability) = self.capabilities.first_missing(group.requires) {
            tracing::info!(group = group.id, capability, "skipping group");
            self.reporter.emit(&Event::Skipped {
                group: group.id.to_string(),
                title: group.skip_label(),
                capability: capability.to_string(),
            });
            self.check_output()?;
            return Ok(GroupOutcome::Skipped { capability });
        }

        self.reporter.emit(&Event::Section {
            group: group.id.to_string(),
            title: group.title.to_string(),
        });
        self.check_output()?;

        tracing::debug!(group = group.id, "running group");
        let mut bencher = Bencher::new(self.reporter, group.id);
        (group.run)(&mut bencher, self.capabilities)?;
        self.check_output()?;

        Ok(GroupOutcome::Ran {
            measurements: bencher.measurement_count(),
        })
    }

    /// Banner, every group in order, best-practices summary, completion banner.
    pub fn run_suite(&self, suite: &Suite) -> anyhow::Result<RunSummary> {
        self.reporter.emit(&Event::Banner {
            title: suite.title.to_string(),
        });
        self.check_output()?;

        let mut summary = RunSummary::default();
        for group in &suite.groups {
            summary.add(self.run_group(group)?);
        }

        self.reporter.emit(&Event::Summary {
            title: suite.summary_title.to_string(),
            text: suite.summary.to_string(),
        });
        self.reporter.emit(&Event::Complete {
            title: COMPLETE_TITLE.to_string(),
        });
        self.check_output()?;

        tracing::info!(
            suite = suite.id,
            groups_run = summary.groups_run,
            groups_skipped = summary.groups_skipped,
            measurements = summary.measurements,
            "suite finished"
        );
        Ok(summary)
    }

    /// Run suites back to back; the first failure stops everything.
    pub fn run_all(&self, suites: &[Suite]) -> anyhow::Result<RunSummary> {
        let mut total = RunSummary::default();
        for suite in suites {
            total.merge(self.run_suite(suite)?);
        }
        Ok(total)
    }

    fn check_output(&self) -> anyhow::Result<()> {
        self.reporter.check().context("failed to write report output")
    }
}
