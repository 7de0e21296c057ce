//! Optional Capabilities
//!
//! Some groups need an optional library or resource. Each one is probed once
//! at startup; the result is frozen into a [`Capabilities`] registry that
//! groups and the runner can only read.

use crate::reporter::{Event, Reporter};
use fxhash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a capability could not be acquired
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Support was compiled out
    #[error("not compiled into this build")]
    NotCompiled,

    /// Turned off by configuration
    #[error("disabled by configuration")]
    Disabled,

    /// A required file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that was tried
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The resource exists but is unusable
    #[error("{0}")]
    Invalid(String),
}

/// An optional dependency that can be acquired at startup.
pub trait Capability {
    /// Stable identifier, e.g. `image-library`
    fn name(&self) -> &'static str;

    /// One-line instruction for making the capability available
    fn install_hint(&self) -> String;

    /// Try to acquire the capability, returning a handle to keep
    fn acquire(&self) -> Result<Box<dyn Any>, CapabilityError>;
}

struct Entry {
    available: bool,
    handle: Option<Box<dyn Any>>,
}

/// Frozen availability flags plus acquired handles.
#[derive(Default)]
pub struct Capabilities {
    entries: FxHashMap<&'static str, Entry>,
    order: Vec<&'static str>,
}

impl Capabilities {
    /// Registry with no capabilities; every lookup reports unavailable
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe every capability exactly once.
    ///
    /// Names listed in `disabled` are not attempted. Each failure emits a
    /// [`Event::Diagnostic`]; probing itself never fails.
    pub fn probe(
        probes: &[Box<dyn Capability>],
        disabled: &[String],
        reporter: &dyn Reporter,
    ) -> Self {
        let mut caps = Self::default();

        for probe in probes {
            let name = probe.name();
            if caps.entries.contains_key(name) {
                tracing::warn!(capability = name, "duplicate capability probe ignored");
                continue;
            }

            let acquired = if disabled.iter().any(|d| d == name) {
                Err(CapabilityError::Disabled)
            } else {
                probe.acquire()
            };

            let entry = match acquired {
                Ok(handle) => {
                    tracing::debug!(capability = name, "capability available");
                    Entry {
                        available: true,
                        handle: Some(handle),
                    }
                }
                Err(e) => {
                    tracing::warn!(capability = name, error = %e, "capability unavailable");
                    reporter.emit(&Event::Diagnostic {
                        capability: name.to_string(),
                        reason: e.to_string(),
                        hint: probe.install_hint(),
                    });
                    Entry {
                        available: false,
                        handle: None,
                    }
                }
            };

            caps.order.push(name);
            caps.entries.insert(name, entry);
        }

        caps
    }

    /// Registry built from plain flags, with no handles
    pub fn from_flags(flags: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        let mut caps = Self::default();
        for (name, available) in flags {
            if caps.entries.contains_key(name) {
                continue;
            }
            caps.order.push(name);
            caps.entries.insert(
                name,
                Entry {
                    available,
                    handle: None,
                },
            );
        }
        caps
    }

    /// Whether `name` was acquired. Unknown names are unavailable.
    pub fn is_available(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| e.available)
    }

    /// Handle retained for `name`, if it was acquired as a `T`
    pub fn handle<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries
            .get(name)
            .and_then(|e| e.handle.as_ref())
            .and_then(|h| h.downcast_ref::<T>())
    }

    /// First entry of `required` that is not available
    pub fn first_missing<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required
            .iter()
            .copied()
            .find(|name| !self.is_available(name))
    }

    /// Probed names with their flags, in probe order
    pub fn flags(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.order
            .iter()
            .map(|name| (*name, self.is_available(name)))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.flags()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::MemoryReporter;
    use std::cell::Cell;

    struct Fake {
        name: &'static str,
        succeed: bool,
        attempts: Cell<usize>,
    }

    impl Fake {
        fn boxed(name: &'static str, succeed: bool) -> Box<dyn Capability> {
            Box::new(Self {
                name,
                succeed,
                attempts: Cell::new(0),
            })
        }
    }

    impl Capability for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn install_hint(&self) -> String {
            format!("install {}", self.name)
        }

        fn acquire(&self) -> Result<Box<dyn Any>, CapabilityError> {
            self.attempts.set(self.attempts.get() + 1);
            assert_eq!(self.attempts.get(), 1, "probed more than once");
            if self.succeed {
                Ok(Box::new(format!("{} handle", self.name)))
            } else {
                Err(CapabilityError::Invalid("missing".to_string()))
            }
        }
    }

    #[test]
    fn test_probe_records_flags_and_handles() {
        let reporter = MemoryReporter::new();
        let probes = vec![Fake::boxed("present", true), Fake::boxed("absent", false)];

        let caps = Capabilities::probe(&probes, &[], &reporter);

        assert!(caps.is_available("present"));
        assert!(!caps.is_available("absent"));
        assert!(!caps.is_available("never-probed"));
        assert_eq!(
            caps.handle::<String>("present").map(String::as_str),
            Some("present handle")
        );
        assert!(caps.handle::<String>("absent").is_none());
        assert!(caps.handle::<u32>("present").is_none());
    }

    #[test]
    fn test_failure_emits_one_diagnostic_with_hint() {
        let reporter = MemoryReporter::new();
        let probes = vec![Fake::boxed("present", true), Fake::boxed("absent", false)];

        Capabilities::probe(&probes, &[], &reporter);

        let events = reporter.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            Event::Diagnostic {
                capability: "absent".to_string(),
                reason: "missing".to_string(),
                hint: "install absent".to_string(),
            }
        );
    }

    #[test]
    fn test_disabled_capability_is_not_acquired() {
        let reporter = MemoryReporter::new();
        let probes = vec![Fake::boxed("present", true)];

        let caps = Capabilities::probe(&probes, &["present".to_string()], &reporter);

        assert!(!caps.is_available("present"));
        assert!(reporter.lines()[0].contains("disabled by configuration"));
    }

    #[test]
    fn test_first_missing_follows_required_order() {
        let caps = Capabilities::from_flags([("a", true), ("b", false), ("c", false)]);

        assert_eq!(caps.first_missing(&["a"]), None);
        assert_eq!(caps.first_missing(&["a", "c", "b"]), Some("c"));
        assert_eq!(caps.first_missing(&[]), None);
        assert_eq!(
            caps.flags().collect::<Vec<_>>(),
            vec![("a", true), ("b", false), ("c", false)]
        );
    }
}
