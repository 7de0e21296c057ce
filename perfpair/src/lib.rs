#![warn(missing_docs)]
//! # perfpair
//!
//! Naive versus optimized implementations of everyday tasks, timed side by side.
//!
//! perfpair provides:
//! - **Timing Wrapper**: attach a stopwatch to any callable; values and errors pass through untouched
//! - **Reporters**: console text, JSON lines, or an in-memory collector for tests
//! - **Optional Capabilities**: probed once at startup; groups that need a missing one are skipped
//! - **Suites**: data processing, systems and computer vision groups, run in registration order
//!
//! ## Quick Start
//!
//! ```ignore
//! use perfpair::prelude::*;
//!
//! let reporter = ConsoleReporter::stdout();
//! let mut parse = wrap(&reporter, "parse_port", |s: &str| s.parse::<u16>());
//! let port = parse("8080");
//! ```
//!
//! ## Custom Suites
//!
//! ```ignore
//! fn lookups(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
//!     let data: Vec<u32> = (0..1000).collect();
//!     b.time("linear_scan", || data.contains(&999));
//!     b.time("binary_search", || data.binary_search(&999).is_ok());
//!     Ok(())
//! }
//! ```

// Re-export core types
pub use perfpair_core::{
    Bencher, COMPLETE_TITLE, Capabilities, Capability, CapabilityError, ConsoleReporter, Event,
    GroupDef, GroupFn, GroupOutcome, HAS_CYCLE_COUNTER, JsonReporter, Lap, Measurement,
    MemoryReporter, REPORT_PRECISION, Reporter, RunSummary, Runner, Stopwatch, Suite, Timed,
    fn_name, pin_to_cpu, time_call, try_time_call, try_wrap, try_wrap_fn, wrap, wrap_fn,
};

// Re-export CLI types
pub use perfpair_cli::{
    ALL_SUITES, Cli, Commands, ConfigError, OutputFormat, PerfConfig, RunPlan, Settings,
    build_plan, execute, format_plan,
};

/// The bundled suites and their capabilities
pub use perfpair_suites as suites;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Bencher, Capabilities, ConsoleReporter, GroupDef, MemoryReporter, Reporter, Runner, Suite,
        Timed, wrap, wrap_fn,
    };
}

/// Run the perfpair CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     perfpair::run()
/// }
/// ```
pub use perfpair_cli::run;
