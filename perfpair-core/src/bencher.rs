//! Bencher - The Group-Facing Timing API
//!
//! A group receives a `Bencher` and runs each variant through it exactly once.
//! Every call is bracketed by clock reads and reported under the variant's
//! name, tagged with the group id.

use crate::reporter::{Event, Reporter};
use crate::timing::{fn_name, time_call, try_time_call};

/// Per-group timing handle
pub struct Bencher<'r> {
    reporter: &'r dyn Reporter,
    group: &'static str,
    measurements: usize,
}

impl<'r> Bencher<'r> {
    /// Create a bencher reporting into `reporter` for `group`
    pub fn new(reporter: &'r dyn Reporter, group: &'static str) -> Self {
        Self {
            reporter,
            group,
            measurements: 0,
        }
    }

    /// Run `f` once, timed and reported as `name`. Returns `f`'s value.
    #[inline]
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let out = time_call(self.reporter, name, self.group, f);
        self.measurements += 1;
        out
    }

    /// Run `f(arg)` once, reported under `f`'s declared name.
    #[inline]
    pub fn time_fn<A, T, F: FnOnce(A) -> T>(&mut self, f: F, arg: A) -> T {
        self.time(fn_name::<F>(), move || f(arg))
    }

    /// Run a fallible `f` once. An `Err` is returned as-is and not reported.
    #[inline]
    pub fn try_time<T, E>(&mut self, name: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let out = try_time_call(self.reporter, name, self.group, f)?;
        self.measurements += 1;
        Ok(out)
    }

    /// Print a free-form line under the current section
    pub fn note(&self, text: impl Into<String>) {
        self.reporter.emit(&Event::Note { text: text.into() });
    }

    /// Number of successful timed calls so far
    pub fn measurement_count(&self) -> usize {
        self.measurements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::MemoryReporter;

    #[test]
    fn test_time_reports_with_group_tag() {
        let reporter = MemoryReporter::new();
        let mut b = Bencher::new(&reporter, "lookup");

        let hits = b.time("efficient_membership_test", || {
            (0..100).filter(|i| i % 10 == 0).count()
        });

        assert_eq!(hits, 10);
        assert_eq!(b.measurement_count(), 1);
        let m = &reporter.measurements()[0];
        assert_eq!(m.name, "efficient_membership_test");
        assert_eq!(m.group, "lookup");
    }

    fn efficient_list_building(n: u64) -> Vec<u64> {
        (0..n).filter(|i| i % 2 == 0).map(|i| i * i).collect()
    }

    #[test]
    fn test_time_fn_reports_declared_name() {
        let reporter = MemoryReporter::new();
        let mut b = Bencher::new(&reporter, "lists");

        let squares = b.time_fn(efficient_list_building, 6);

        assert_eq!(squares, vec![0, 4, 16]);
        assert_eq!(reporter.measurements()[0].name, "efficient_list_building");
    }

    #[test]
    fn test_try_time_skips_failed_calls() {
        let reporter = MemoryReporter::new();
        let mut b = Bencher::new(&reporter, "io");

        let err = b
            .try_time("fails", || Err::<(), _>("boom"))
            .unwrap_err();
        assert_eq!(err, "boom");
        assert_eq!(b.measurement_count(), 0);

        assert_eq!(b.try_time("works", || Ok::<_, &str>(7)), Ok(7));
        assert_eq!(b.measurement_count(), 1);
        assert_eq!(reporter.measurements().len(), 1);
    }

    #[test]
    fn test_note_is_forwarded() {
        let reporter = MemoryReporter::new();
        let b = Bencher::new(&reporter, "models");
        b.note("First call loads model:");

        assert_eq!(reporter.lines(), vec!["First call loads model:"]);
    }
}
