#![warn(missing_docs)]
//! perfpair Core - Timing Harness
//!
//! This crate provides the pieces every benchmark suite shares:
//! - `Stopwatch` clock reads (monotonic wall clock plus CPU cycle counter)
//! - The timing wrapper (`wrap`, `Timed`, `Bencher::time`)
//! - The `Reporter` trait with console, JSON-lines and in-memory sinks
//! - The optional-capability registry used to gate groups
//! - The `Runner` that walks suites in registration order

mod bencher;
mod capability;
mod measure;
mod reporter;
mod runner;
mod timing;

pub use bencher::Bencher;
pub use capability::{Capabilities, Capability, CapabilityError};
pub use measure::{HAS_CYCLE_COUNTER, Lap, Stopwatch, pin_to_cpu};
pub use reporter::{
    ConsoleReporter, Event, JsonReporter, Measurement, MemoryReporter, REPORT_PRECISION,
    RULE_WIDTH, Reporter,
};
pub use runner::{COMPLETE_TITLE, GroupOutcome, RunSummary, Runner};
pub use timing::{Timed, fn_name, time_call, try_time_call, try_wrap, try_wrap_fn, wrap, wrap_fn};

/// Body of a benchmark group: builds its fixture and times each variant.
pub type GroupFn = fn(&mut Bencher<'_>, &Capabilities) -> anyhow::Result<()>;

/// A benchmark group registered in a suite
#[derive(Debug, Clone)]
pub struct GroupDef {
    /// Unique identifier, used for filtering
    pub id: &'static str,
    /// Section header, e.g. `3. List Building (100,000 elements)`
    pub title: &'static str,
    /// Capabilities that must all be available for the group to run
    pub requires: &'static [&'static str],
    /// Group body
    pub run: GroupFn,
}

impl GroupDef {
    /// Title without its leading `N. ` ordinal, lower-cased for skip notices
    pub fn skip_label(&self) -> String {
        let title = match self.title.split_once(". ") {
            Some((ordinal, rest)) if ordinal.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => self.title,
        };
        title.to_lowercase()
    }
}

/// An ordered collection of groups with its banners
#[derive(Debug, Clone)]
pub struct Suite {
    /// Identifier used on the command line
    pub id: &'static str,
    /// Title banner
    pub title: &'static str,
    /// Groups in execution order
    pub groups: Vec<GroupDef>,
    /// Heading of the best-practices summary
    pub summary_title: &'static str,
    /// Best-practices text printed after the groups
    pub summary: &'static str,
}

impl Suite {
    /// Copy of this suite keeping only groups accepted by `keep`, in order
    pub fn retain_groups(&self, keep: impl Fn(&GroupDef) -> bool) -> Suite {
        Suite {
            groups: self.groups.iter().filter(|g| keep(g)).cloned().collect(),
            ..self.clone()
        }
    }

    /// Look up a group by id
    pub fn group(&self, id: &str) -> Option<&GroupDef> {
        self.groups.iter().find(|g| g.id == id)
    }
}
