use std::collections::{HashSet, VecDeque};

use crate::domain::FeedEntry;

/// Bounded record of guids already observed.
///
/// Capacity follows the feed: it is `multiplier` times the largest fetch seen
/// so far and never shrinks, so a short page cannot push out guids that may
/// reappear. The least recently observed guids are evicted first.
#[derive(Debug)]
pub struct SeenHistory {
    multiplier: usize,
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl SeenHistory {
    pub fn new(multiplier: usize) -> Self {
        Self {
            multiplier: multiplier.max(1),
            capacity: 0,
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Record one fetch and return its unseen entries in feed order.
    pub fn observe(&mut self, entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
        let fetched = entries.len();
        let fresh = entries
            .into_iter()
            .filter(|entry| self.record(&entry.guid))
            .collect();

        if fetched > 0 {
            self.capacity = self.capacity.max(fetched.saturating_mul(self.multiplier));
            self.evict();
        }

        fresh
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.seen.contains(guid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true when the guid had not been seen.
    fn record(&mut self, guid: &str) -> bool {
        if self.seen.insert(guid.to_string()) {
            self.order.push_back(guid.to_string());
            return true;
        }

        // Still in the feed, so move it away from the eviction end.
        if let Some(pos) = self.order.iter().position(|g| g == guid) {
            if let Some(g) = self.order.remove(pos) {
                self.order.push_back(g);
            }
        }
        false
    }

    fn evict(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }
}
