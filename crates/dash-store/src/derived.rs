/// Derived values: pure functions recomputed on every access.
///
/// Nothing here is stored; the only derived series kept in the store is
/// per-peer network I/O (see [`crate::peers`]).
use dash_metrics::{format_epoch_hms, BoundedSeries};

use crate::store::NodeStore;
use crate::types::{DbCleanupEvent, SyncStatus};

/// Title prefix used by [`document_title`].
pub const PRODUCT_NAME: &str = "HORNET";

/// `floor(lsmi / lmi * 100)`, 0 when `lmi` is 0.
pub fn percentage_synced(sync: &SyncStatus) -> u64 {
    if sync.lmi == 0 {
        return 0;
    }
    (sync.lsmi as f64 / sync.lmi as f64 * 100.0).floor() as u64
}

/// `floor((1 - current_requested_ms / lmi) * 100)`, 0 when `lmi` is 0.
///
/// Negative when more milestones are requested than known.
pub fn solid_reached_percentage(sync: &SyncStatus, current_requested_ms: u64) -> i64 {
    if sync.lmi == 0 {
        return 0;
    }
    ((1.0 - current_requested_ms as f64 / sync.lmi as f64) * 100.0).floor() as i64
}

/// Milestones still to solidify.
pub fn ms_delta(sync: &SyncStatus) -> u64 {
    sync.lmi.saturating_sub(sync.lsmi)
}

/// Per-interval series from a cumulative counter: each sample minus its
/// predecessor. Yields `len - 1` values.
pub fn deltas<T>(series: &BoundedSeries<T>, counter: impl Fn(&T) -> u64) -> Vec<i64> {
    series
        .pairs()
        .map(|(prev, curr)| (counter(&curr.value) as i64).wrapping_sub(counter(&prev.value) as i64))
        .collect()
}

/// `HH:MM:SS`, prefixed with `1 Day, ` or `N Days, ` once a day has passed.
pub fn format_uptime(uptime_ms: u64) -> String {
    let total_secs = uptime_ms / 1000;
    let seconds = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    let days = total_secs / 86_400;

    let prefix = match days {
        0 => String::new(),
        1 => "1 Day, ".to_string(),
        n => format!("{n} Days, "),
    };
    format!("{prefix}{hours:02}:{minutes:02}:{seconds:02}")
}

// ── Database cleanup ─────────────────────────────────────────────────

/// `end - start` in seconds, only when both are set.
pub fn cleanup_duration(event: &DbCleanupEvent) -> i64 {
    if event.start != 0 && event.end != 0 {
        event.end - event.start
    } else {
        0
    }
}

pub fn is_cleanup_running(event: &DbCleanupEvent) -> bool {
    event.start != 0 && event.end == 0
}

/// Local `HH:MM:SS` of the last cleanup end, empty if none finished.
pub fn last_cleanup_end(event: &DbCleanupEvent) -> String {
    if event.end != 0 {
        format_epoch_hms(event.end)
    } else {
        String::new()
    }
}

// ── Title ────────────────────────────────────────────────────────────

/// `HORNET`, then ` (<alias>)` when an alias is set, then ` lsmi / lmi`
/// once the latest milestone is known.
pub fn document_title(alias: &str, sync: &SyncStatus) -> String {
    let mut title = PRODUCT_NAME.to_string();
    if !alias.is_empty() {
        title.push_str(&format!(" ({alias})"));
    }
    if sync.lmi > 0 {
        title.push_str(&format!(" {} / {}", sync.lsmi, sync.lmi));
    }
    title
}

// ── NodeStore views ──────────────────────────────────────────────────

impl NodeStore {
    pub fn percentage_synced(&self) -> u64 {
        percentage_synced(self.sync_status())
    }

    pub fn solid_reached_percentage(&self) -> i64 {
        let requested = self.status().map_or(0, |s| s.current_requested_ms);
        solid_reached_percentage(self.sync_status(), requested)
    }

    pub fn ms_delta(&self) -> u64 {
        ms_delta(self.sync_status())
    }

    /// Formatted uptime, empty until a status document has been seen.
    pub fn uptime(&self) -> String {
        self.status()
            .map(|s| format_uptime(s.uptime))
            .unwrap_or_default()
    }

    pub fn is_node_sync(&self) -> bool {
        self.status().is_some_and(|s| s.is_healthy)
    }

    /// True when the running version is the latest one, or the latest one
    /// is unknown.
    pub fn is_latest_version(&self) -> bool {
        match self.status() {
            Some(s) if !s.latest_version.is_empty() => s.version == s.latest_version,
            _ => true,
        }
    }

    pub fn document_title(&self) -> String {
        let alias = self.status().map_or("", |s| s.node_alias.as_str());
        document_title(alias, self.sync_status())
    }

    pub fn is_cleanup_running(&self) -> bool {
        is_cleanup_running(self.last_db_cleanup())
    }

    pub fn cleanup_duration(&self) -> i64 {
        cleanup_duration(self.last_db_cleanup())
    }

    pub fn last_cleanup_end(&self) -> String {
        last_cleanup_end(self.last_db_cleanup())
    }
}
