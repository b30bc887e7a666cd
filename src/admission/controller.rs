//! Admission Controller
//!
//! Fixed-window counters, one per (identity, resource class) pair.
//!
//! A record is re-armed lazily: the first `check` at or after `window_end`
//! resets its count and opens a new window starting at that instant. At most
//! `2 * limit` requests can therefore land in any span of `2 * window`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{AdmissionPolicy, ResourceClass, DEFAULT_MAX_TRACKED};

// == Admission Result ==
/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionResult {
    /// Whether the request may proceed
    pub admitted: bool,
    /// Limit of the policy that produced this result
    pub limit: u32,
    /// Requests still admissible in the current window
    pub remaining: u32,
    /// End of the current window
    pub reset_at: Instant,
}

impl AdmissionResult {
    /// Builds a rejection for `limit` that clears at `reset_at`.
    pub fn rejected(limit: u32, reset_at: Instant) -> Self {
        Self {
            admitted: false,
            limit,
            remaining: 0,
            reset_at,
        }
    }

    /// Time left until the window resets (zero once it has passed).
    pub fn reset_after(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }

    /// Reset instant expressed as Unix milliseconds, for quota headers.
    pub fn reset_at_unix_ms(&self) -> i64 {
        Utc::now().timestamp_millis() + self.reset_after().as_millis() as i64
    }
}

// == Admission Record ==
#[derive(Debug, Clone, Copy)]
struct AdmissionRecord {
    count: u32,
    window_start: Instant,
    window_end: Instant,
}

impl AdmissionRecord {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            window_end: now + window,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.window_end
    }
}

type RecordKey = (String, ResourceClass);

// == Admission Controller ==
/// Process-wide fixed-window rate limiter.
///
/// Each record sits in a sharded map; the read-check-increment for one key
/// runs under that key's shard lock, so concurrent callers never lose an
/// update. Clones share the same records.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    records: Arc<DashMap<RecordKey, AdmissionRecord>>,
    /// Soft cap on tracked records before an opportunistic sweep runs
    max_tracked: usize,
    next_sweep_at: Arc<AtomicUsize>,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED)
    }
}

impl AdmissionController {
    // == Constructor ==
    /// Creates a controller that sweeps stale records once more than
    /// `max_tracked` are held.
    pub fn new(max_tracked: usize) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            max_tracked,
            next_sweep_at: Arc::new(AtomicUsize::new(max_tracked)),
        }
    }

    // == Check ==
    /// Decides whether `identity` may make one more `class` request.
    ///
    /// # Panics
    /// If `identity` is empty, `limit` is zero or `window` is zero. Callers
    /// substitute [`ANONYMOUS_IDENTITY`](super::ANONYMOUS_IDENTITY) when no
    /// identity can be resolved.
    pub fn check(
        &self,
        identity: &str,
        class: ResourceClass,
        limit: u32,
        window: Duration,
    ) -> AdmissionResult {
        assert!(!identity.is_empty(), "admission identity must not be empty");
        assert!(limit > 0, "admission limit must be positive");
        assert!(!window.is_zero(), "admission window must be positive");

        let key = (identity.to_string(), class);

        // Must run before taking the entry: retain would deadlock on its shard.
        let threshold = self.next_sweep_at.load(Ordering::Relaxed);
        if self.records.len() >= threshold && !self.records.contains_key(&key) {
            let swept = self.sweep_expired();
            if self.records.len() >= self.max_tracked {
                warn!(
                    "Admission records over soft cap after sweep ({} tracked, {} swept)",
                    self.records.len(),
                    swept
                );
            }
        }

        let now = Instant::now();
        let mut record = self
            .records
            .entry(key)
            .or_insert_with(|| AdmissionRecord::open(now, window));

        if record.is_expired(now) {
            *record = AdmissionRecord::open(now, window);
        }

        if record.count < limit {
            record.count += 1;
            AdmissionResult {
                admitted: true,
                limit,
                remaining: limit - record.count,
                reset_at: record.window_end,
            }
        } else {
            debug!(
                "Rejected {} request from {} ({} admitted since window opened {:?} ago)",
                class,
                identity,
                record.count,
                now.saturating_duration_since(record.window_start)
            );
            AdmissionResult::rejected(limit, record.window_end)
        }
    }

    /// [`check`](Self::check) with the limit and window taken from `policy`.
    pub fn check_policy(
        &self,
        identity: &str,
        class: ResourceClass,
        policy: &AdmissionPolicy,
    ) -> AdmissionResult {
        self.check(identity, class, policy.limit, policy.window)
    }

    // == Sweep Expired ==
    /// Drops records whose window has ended. Returns how many were removed.
    ///
    /// A swept record behaves exactly like one never seen, so this only
    /// bounds memory. Also re-arms the opportunistic sweep threshold.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));

        let kept = self.records.len();
        self.next_sweep_at
            .store(self.max_tracked.max(kept.saturating_mul(2)), Ordering::Relaxed);
        before.saturating_sub(kept)
    }

    // == Tracked ==
    /// Number of records currently held.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }
}
