use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::document::EditStep;
use crate::spellcheck::delta::EditDelta;
use crate::spellcheck::projection::OffsetMap;

/// Identifier of one issued check, assigned in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A check that has been issued and whose result has not arrived yet.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub id: RequestId,
    /// Every edit applied since the check was issued
    pub delta: EditDelta,
    /// Offset map of the text that was sent to the checker
    pub offset_map: OffsetMap,
    pub issued_at: Instant,
}

/// The set of in-flight checks.
///
/// A result is only ever applied if its request is still in this set when
/// the result arrives. Nothing is cancelled explicitly: a request leaves the
/// set when its result is consumed, when its check fails, or when it is
/// evicted for taking too long.
#[derive(Debug, Default)]
pub struct PendingRequests {
    next_id: u64,
    requests: BTreeMap<RequestId, CheckRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, offset_map: OffsetMap, now: Instant) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.requests.insert(
            id,
            CheckRequest {
                id,
                delta: EditDelta::empty(),
                offset_map,
                issued_at: now,
            },
        );
        id
    }

    /// Record an edit against every pending request.
    pub fn record_edit(&mut self, step: &EditStep) {
        for request in self.requests.values_mut() {
            request.delta.extend(step.clone());
        }
    }

    /// Remove and return a request; `None` if it was already consumed or evicted.
    pub fn take(&mut self, id: RequestId) -> Option<CheckRequest> {
        self.requests.remove(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.requests.contains_key(&id)
    }

    pub fn get(&self, id: RequestId) -> Option<&CheckRequest> {
        self.requests.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.requests.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Drop requests that have been pending for longer than `max_age`.
    pub fn evict_older_than(&mut self, now: Instant, max_age: Duration) -> Vec<RequestId> {
        let mut evicted = Vec::new();
        self.requests.retain(|id, request| {
            let expired = now.saturating_duration_since(request.issued_at) > max_age;
            if expired {
                evicted.push(*id);
            }
            !expired
        });
        evicted
    }
}

/// Quiescence timer: fires once edits have stopped for a full window.
///
/// Time is passed in by the caller so the timer works the same under a UI
/// event loop, an async runtime, or a test.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start or restart the window from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once per armed window, when `now` has reached the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
