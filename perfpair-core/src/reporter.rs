//! Reporting
//!
//! Everything the harness prints flows through a [`Reporter`] as an [`Event`].
//! The console reporter renders the classic text layout, the JSON reporter
//! writes one object per line, and [`MemoryReporter`] keeps events around so
//! tests can inspect them instead of scraping stdout.

use crate::measure::Lap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

/// Decimal places used for every elapsed-time figure.
pub const REPORT_PRECISION: usize = 4;

/// Width of banner and section rules.
pub const RULE_WIDTH: usize = 70;

/// One timed call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Variant name
    pub name: String,
    /// Id of the group the variant ran in (empty outside a group)
    pub group: String,
    /// Elapsed wall-clock time in milliseconds
    pub elapsed_ms: f64,
    /// CPU cycle delta (0 where no counter exists)
    pub cycles: u64,
    /// When the call finished
    pub recorded_at: DateTime<Utc>,
}

impl Measurement {
    /// Build a record from a finished lap
    pub fn from_lap(name: impl Into<String>, group: impl Into<String>, lap: Lap) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            elapsed_ms: lap.elapsed_ms(),
            cycles: lap.cycles,
            recorded_at: Utc::now(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.prec$} ms",
            self.name,
            self.elapsed_ms,
            prec = REPORT_PRECISION
        )
    }
}

/// Everything a run can report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Event {
    /// Suite title banner
    Banner { title: String },
    /// Header printed before a group's variants
    Section { group: String, title: String },
    /// A completed timing
    Measurement(Measurement),
    /// Free-form line emitted by a group
    Note { text: String },
    /// A group was not run because a capability is missing
    Skipped {
        group: String,
        title: String,
        capability: String,
    },
    /// A capability could not be acquired at startup
    Diagnostic {
        capability: String,
        reason: String,
        hint: String,
    },
    /// Static best-practices text printed after all groups
    Summary { title: String, text: String },
    /// Completion banner
    Complete { title: String },
}

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Banner { title } => write!(f, "{}\n{}\n{}", rule('='), title, rule('=')),
            Event::Section { title, .. } => write!(f, "\n{}\n{}", title, rule('-')),
            Event::Measurement(m) => write!(f, "{m}"),
            Event::Note { text } => f.write_str(text),
            Event::Skipped {
                title, capability, ..
            } => write!(f, "\nSkipping {title} ({capability} not available)"),
            Event::Diagnostic {
                capability,
                reason,
                hint,
            } => write!(f, "Note: {capability} not available ({reason}). {hint}"),
            Event::Summary { title, text } => {
                write!(f, "\n{}\n{}\n{}\n{}", rule('='), title, rule('='), text)
            }
            Event::Complete { title } => write!(f, "\n{}\n{}\n{}", rule('='), title, rule('=')),
        }
    }
}

/// Sink for benchmark events.
///
/// Implementations take `&self`: a single reporter is shared by the runner,
/// every group and every timed call within one run. Timed calls cannot fail
/// on output, so a reporter that writes somewhere keeps its first error and
/// hands it out through [`Reporter::check`].
pub trait Reporter {
    /// Handle one event
    fn emit(&self, event: &Event);

    /// Report a completed measurement
    fn record(&self, measurement: Measurement) {
        self.emit(&Event::Measurement(measurement));
    }

    /// First output failure seen so far, if any
    fn check(&self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn emit(&self, event: &Event) {
        (**self).emit(event)
    }

    fn check(&self) -> io::Result<()> {
        (**self).check()
    }
}

/// Writer plus the first error it returned. Once failed, nothing more is
/// written.
struct Sink<W> {
    out: RefCell<W>,
    failed: RefCell<Option<io::Error>>,
}

impl<W: Write> Sink<W> {
    fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            failed: RefCell::new(None),
        }
    }

    fn write(&self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.failed.borrow().is_some() {
            return;
        }
        let mut out = self.out.borrow_mut();
        if let Err(e) = f(&mut *out).and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "report output failed");
            *self.failed.borrow_mut() = Some(e);
        }
    }

    fn check(&self) -> io::Result<()> {
        match &*self.failed.borrow() {
            Some(e) => Err(io::Error::new(e.kind(), e.to_string())),
            None => Ok(()),
        }
    }

    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

/// Human-readable text, one event per write.
pub struct ConsoleReporter<W: Write = std::io::Stdout> {
    sink: Sink<W>,
}

impl ConsoleReporter {
    /// Console reporter on stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Console reporter on an arbitrary writer
    pub fn new(out: W) -> Self {
        Self {
            sink: Sink::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn emit(&self, event: &Event) {
        self.sink.write(|out| writeln!(out, "{event}"));
    }

    fn check(&self) -> io::Result<()> {
        self.sink.check()
    }
}

/// JSON lines: each event serialized on its own line as it happens.
pub struct JsonReporter<W: Write = std::io::Stdout> {
    sink: Sink<W>,
}

impl JsonReporter {
    /// JSON reporter on stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    /// JSON reporter on an arbitrary writer
    pub fn new(out: W) -> Self {
        Self {
            sink: Sink::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn emit(&self, event: &Event) {
        self.sink.write(|out| {
            serde_json::to_writer(&mut *out, event).map_err(io::Error::from)?;
            writeln!(out)
        });
    }

    fn check(&self) -> io::Result<()> {
        self.sink.check()
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: RefCell<Vec<Event>>,
}

impl MemoryReporter {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Recorded measurements, in order
    pub fn measurements(&self) -> Vec<Measurement> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Measurement(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Group ids of emitted section headers, in order
    pub fn sections(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Section { group, .. } => Some(group.clone()),
                _ => None,
            })
            .collect()
    }

    /// Group ids of emitted skip notices, in order
    pub fn skipped(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Skipped { group, .. } => Some(group.clone()),
                _ => None,
            })
            .collect()
    }

    /// Rendered console text of every event, one entry per event
    pub fn lines(&self) -> Vec<String> {
        self.events.borrow().iter().map(ToString::to_string).collect()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}
