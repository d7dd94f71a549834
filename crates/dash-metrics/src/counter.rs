use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Event tally for the ingest path (frames applied, dropped, rejected).
///
/// The runtime loop is the only writer and summaries only sample it, so
/// every access is [`Ordering::Relaxed`]. Serializes as a bare number.
#[derive(Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Zero the tally and return what it held.
    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl serde::Serialize for Counter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_frames() {
        let applied = Counter::new();
        applied.inc();
        applied.add(4);
        assert_eq!(applied.get(), 5);
    }

    #[test]
    fn reset_hands_back_previous_tally() {
        let dropped = Counter::new();
        dropped.add(7);
        assert_eq!(dropped.reset(), 7);
        assert_eq!(dropped.get(), 0);
        assert_eq!(dropped.reset(), 0);
    }

    #[test]
    fn debug_and_json_are_the_bare_value() {
        let rejected = Counter::new();
        rejected.add(99);
        assert_eq!(format!("{rejected:?}"), "99");
        assert_eq!(serde_json::to_string(&rejected).unwrap(), "99");
    }
}
