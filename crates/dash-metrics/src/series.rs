use serde::{Deserialize, Serialize};

/// Display format for sample timestamps (local time of day).
const HMS_FORMAT: &str = "%H:%M:%S";

/// A stored metric sample: the topic payload plus its display timestamp.
///
/// Samples are immutable once pushed into a [`BoundedSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    /// Time-of-day label (`HH:MM:SS`).
    pub ts: String,
    /// The topic-specific record.
    pub value: T,
}

/// Fixed-capacity, insertion-ordered ring buffer of samples.
///
/// Once full, every push overwrites the oldest slot in O(1). The capacity is
/// set at construction and never changes. Reads are always chronological
/// (oldest first); there is no API to mutate or reorder a stored sample.
#[derive(Debug, Clone)]
pub struct BoundedSeries<T> {
    buf: Vec<Sample<T>>,
    /// Slot holding the oldest sample once the buffer has wrapped.
    head: usize,
    capacity: usize,
}

impl<T> BoundedSeries<T> {
    /// Create an empty series holding at most `capacity` samples.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Append a sample stamped with the current wall-clock time.
    pub fn push(&mut self, value: T) {
        self.push_stamped(value, now_hms());
    }

    /// Append a sample with an explicit timestamp label.
    ///
    /// Evicts the oldest sample first when the series is full.
    pub fn push_stamped(&mut self, value: T, ts: impl Into<String>) {
        let sample = Sample {
            ts: ts.into(),
            value,
        };
        if self.buf.len() < self.capacity {
            self.buf.push(sample);
        } else {
            self.buf[self.head] = sample;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Append every value in order, all stamped with the same ingest time.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        let ts = now_hms();
        for value in values {
            self.push_stamped(value, ts.clone());
        }
    }

    /// Sample at chronological position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Sample<T>> {
        if index >= self.buf.len() {
            return None;
        }
        Some(&self.buf[(self.head + index) % self.buf.len()])
    }

    /// The most recently pushed sample.
    pub fn latest(&self) -> Option<&Sample<T>> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// The sample pushed just before [`latest`](Self::latest).
    pub fn previous(&self) -> Option<&Sample<T>> {
        self.len().checked_sub(2).and_then(|i| self.get(i))
    }

    /// Iterate oldest → newest.
    pub fn iter(
        &self,
    ) -> std::iter::Chain<std::slice::Iter<'_, Sample<T>>, std::slice::Iter<'_, Sample<T>>> {
        let (wrapped, oldest) = self.buf.split_at(self.head);
        oldest.iter().chain(wrapped.iter())
    }

    /// Iterate consecutive `(previous, current)` pairs, oldest first.
    ///
    /// Yields `len() - 1` pairs; nothing for fewer than two samples.
    pub fn pairs(&self) -> Pairs<'_, T> {
        Pairs {
            series: self,
            next: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
    }
}

impl<T: Serialize> Serialize for BoundedSeries<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Iterator over consecutive sample pairs, see [`BoundedSeries::pairs`].
pub struct Pairs<'a, T> {
    series: &'a BoundedSeries<T>,
    next: usize,
}

impl<'a, T> Iterator for Pairs<'a, T> {
    type Item = (&'a Sample<T>, &'a Sample<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.series.get(self.next)?;
        let prev = self.series.get(self.next - 1)?;
        self.next += 1;
        Some((prev, curr))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Current local time formatted as `HH:MM:SS`.
pub fn now_hms() -> String {
    chrono::Local::now().format(HMS_FORMAT).to_string()
}

/// Format a unix timestamp (seconds) as local `HH:MM:SS`.
///
/// Returns an empty string for timestamps chrono cannot represent.
pub fn format_epoch_hms(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format(HMS_FORMAT)
                .to_string()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: Copy>(series: &BoundedSeries<T>) -> Vec<T> {
        series.iter().map(|s| s.value).collect()
    }

    #[test]
    fn push_below_capacity_keeps_order() {
        let mut series = BoundedSeries::new(5);
        for i in 0..3 {
            series.push_stamped(i, "00:00:00");
        }
        assert_eq!(values(&series), vec![0, 1, 2]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.capacity(), 5);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut series = BoundedSeries::new(900);
        for i in 1..=901u32 {
            series.push_stamped(i, "00:00:00");
        }
        assert_eq!(series.len(), 900);
        let kept = values(&series);
        assert_eq!(kept.first(), Some(&2));
        assert_eq!(kept.last(), Some(&901));
        assert!(kept.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn wraps_many_times_without_growing() {
        let mut series = BoundedSeries::new(3);
        for i in 0..10 {
            series.push_stamped(i, "00:00:00");
            assert!(series.len() <= 3);
        }
        assert_eq!(values(&series), vec![7, 8, 9]);
        assert_eq!(series.get(0).map(|s| s.value), Some(7));
        assert_eq!(series.get(3), None);
    }

    #[test]
    fn latest_and_previous() {
        let mut series = BoundedSeries::new(2);
        assert!(series.latest().is_none());
        series.push_stamped(1, "a");
        assert_eq!(series.latest().map(|s| s.value), Some(1));
        assert!(series.previous().is_none());
        series.push_stamped(2, "b");
        series.push_stamped(3, "c");
        assert_eq!(series.latest().map(|s| s.value), Some(3));
        assert_eq!(series.previous().map(|s| s.value), Some(2));
        assert_eq!(series.latest().map(|s| s.ts.as_str()), Some("c"));
    }

    #[test]
    fn pairs_yield_len_minus_one() {
        let mut series = BoundedSeries::new(3);
        assert_eq!(series.pairs().count(), 0);
        series.push_stamped(10, "t");
        assert_eq!(series.pairs().count(), 0);
        for v in [25, 40, 55] {
            series.push_stamped(v, "t");
        }
        // Holds [25, 40, 55] after wrapping.
        let diffs: Vec<i32> = series.pairs().map(|(p, c)| c.value - p.value).collect();
        assert_eq!(diffs, vec![15, 15]);
    }

    #[test]
    fn clear_empties_but_keeps_capacity() {
        let mut series = BoundedSeries::new(4);
        for i in 0..6 {
            series.push_stamped(i, "t");
        }
        series.clear();
        assert!(series.is_empty());
        assert_eq!(series.capacity(), 4);
        series.push_stamped(99, "t");
        assert_eq!(values(&series), vec![99]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut series = BoundedSeries::new(0);
        series.push_stamped(1, "t");
        series.push_stamped(2, "t");
        assert_eq!(series.capacity(), 1);
        assert_eq!(values(&series), vec![2]);
    }

    #[test]
    fn extend_shares_one_timestamp() {
        let mut series = BoundedSeries::new(2);
        series.extend([1, 2, 3]);
        assert_eq!(values(&series), vec![2, 3]);
        let stamps: Vec<&str> = series.iter().map(|s| s.ts.as_str()).collect();
        assert_eq!(stamps[0], stamps[1]);
    }

    #[test]
    fn push_stamps_time_of_day() {
        let mut series = BoundedSeries::new(1);
        series.push(());
        let ts = &series.latest().unwrap().ts;
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }

    #[test]
    fn serializes_chronologically() {
        let mut series = BoundedSeries::new(2);
        series.push_stamped(1, "a");
        series.push_stamped(2, "b");
        series.push_stamped(3, "c");
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"[{"ts":"b","value":2},{"ts":"c","value":3}]"#);
    }

    #[test]
    fn epoch_formatting_shape() {
        let s = format_epoch_hms(1_700_000_000);
        assert_eq!(s.len(), 8);
        assert_eq!(format_epoch_hms(i64::MAX), "");
    }
}
