//! Timing Wrapper
//!
//! Attaches a stopwatch to any callable without touching its body. The clock
//! is read immediately before and after the call; the report is emitted only
//! after the second read, and only when the call succeeded.

use crate::measure::Stopwatch;
use crate::reporter::{Measurement, Reporter};

/// Declared name of a function item, e.g. `efficient_lookup` for
/// `my_crate::suite::efficient_lookup`.
///
/// Generic arguments and `<impl T>` / `<T as Trait>` qualifiers are dropped,
/// so methods resolve to the method name. Closures resolve to their enclosing
/// function's name.
pub fn fn_name<F>() -> &'static str {
    last_named_segment(std::any::type_name::<F>())
}

/// Last `::` segment of `path` outside angle brackets that is neither empty
/// nor a `{{closure}}` marker.
fn last_named_segment(path: &str) -> &str {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    let mut cut = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                if depth == 0 {
                    cut.get_or_insert(i);
                }
                depth += 1;
            }
            // `->` inside a fn pointer argument
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&path[begin..cut.unwrap_or(i)]);
                begin = i + 2;
                cut = None;
                i += 2;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[begin..cut.unwrap_or(bytes.len())]);

    segments
        .into_iter()
        .rev()
        .find(|segment| !segment.is_empty() && !segment.starts_with("{{"))
        .unwrap_or(path)
}

/// Time one call of `f` and report it as `name`.
#[inline]
pub fn time_call<T>(
    reporter: &dyn Reporter,
    name: &str,
    group: &str,
    f: impl FnOnce() -> T,
) -> T {
    let watch = Stopwatch::start();
    let out = f();
    let lap = watch.stop();
    reporter.record(Measurement::from_lap(name, group, lap));
    std::hint::black_box(out)
}

/// Time one call of a fallible `f`.
///
/// `Err` is handed back untouched and nothing is reported for it.
#[inline]
pub fn try_time_call<T, E>(
    reporter: &dyn Reporter,
    name: &str,
    group: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let watch = Stopwatch::start();
    match f() {
        Ok(value) => {
            let lap = watch.stop();
            reporter.record(Measurement::from_lap(name, group, lap));
            Ok(std::hint::black_box(value))
        }
        Err(e) => Err(e),
    }
}

/// A callable with a stopwatch attached.
///
/// Arguments are passed as a single value; use a tuple for several.
pub struct Timed<'r, F> {
    name: String,
    group: String,
    reporter: &'r dyn Reporter,
    f: F,
}

impl<'r, F> Timed<'r, F> {
    /// Wrap `f`, reporting under `name`
    pub fn new(reporter: &'r dyn Reporter, name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            reporter,
            f,
        }
    }

    /// Wrap `f`, reporting under its declared name
    pub fn named_after(reporter: &'r dyn Reporter, f: F) -> Self {
        Self::new(reporter, fn_name::<F>(), f)
    }

    /// Tag reports with a group id
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Name used in reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the wrapped callable once
    pub fn call<A, T>(&mut self, args: A) -> T
    where
        F: FnMut(A) -> T,
    {
        let f = &mut self.f;
        time_call(self.reporter, &self.name, &self.group, || f(args))
    }

    /// Invoke the wrapped fallible callable once
    pub fn try_call<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
    {
        let f = &mut self.f;
        try_time_call(self.reporter, &self.name, &self.group, || f(args))
    }
}

/// Wrap `f` so every call is timed and reported as `name`.
pub fn wrap<'r, A, T, F>(
    reporter: &'r dyn Reporter,
    name: impl Into<String>,
    f: F,
) -> impl FnMut(A) -> T
where
    F: FnMut(A) -> T,
{
    let mut timed = Timed::new(reporter, name, f);
    move |args| timed.call(args)
}

/// [`wrap`], named after the function item.
pub fn wrap_fn<'r, A, T, F>(reporter: &'r dyn Reporter, f: F) -> impl FnMut(A) -> T
where
    F: FnMut(A) -> T,
{
    let mut timed = Timed::named_after(reporter, f);
    move |args| timed.call(args)
}

/// Wrap a fallible `f`; only successful calls are reported.
pub fn try_wrap<'r, A, T, E, F>(
    reporter: &'r dyn Reporter,
    name: impl Into<String>,
    f: F,
) -> impl FnMut(A) -> Result<T, E>
where
    F: FnMut(A) -> Result<T, E>,
{
    let mut timed = Timed::new(reporter, name, f);
    move |args| timed.try_call(args)
}

/// [`try_wrap`], named after the function item.
pub fn try_wrap_fn<'r, A, T, E, F>(
    reporter: &'r dyn Reporter,
    f: F,
) -> impl FnMut(A) -> Result<T, E>
where
    F: FnMut(A) -> Result<T, E>,
{
    let mut timed = Timed::named_after(reporter, f);
    move |args| timed.try_call(args)
}
