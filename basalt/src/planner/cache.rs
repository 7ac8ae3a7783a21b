use std::collections::{HashMap, VecDeque};

use log::debug;
use parking_lot::Mutex;

use crate::plan::{Digest, Plan, PlanNode, PlanNodeRef};

struct CacheEntry {
    logical: PlanNodeRef,
    plan: Plan,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Digest, CacheEntry>,
    /// Least recently used digest first.
    order: VecDeque<Digest>,
}

impl CacheState {
    fn touch(&mut self, digest: Digest) {
        if let Some(pos) = self.order.iter().position(|d| *d == digest) {
            self.order.remove(pos);
        }
        self.order.push_back(digest);
    }

    fn remove(&mut self, digest: Digest) -> bool {
        if let Some(pos) = self.order.iter().position(|d| *d == digest) {
            self.order.remove(pos);
        }
        self.entries.remove(&digest).is_some()
    }
}

/// Selected physical plans by the digest of the logical plan they were selected for.
///
/// Shared by all queries of a planner, so all access goes through a mutex. Entries are evicted
/// least recently used first. Since a digest may collide, a hit is only returned if the stored
/// logical plan equals the requested one.
pub struct PlanCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl PlanCache {
    /// Creates a cache holding at most `capacity` plans. A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, logical: &PlanNode) -> Option<Plan> {
        let mut state = self.state.lock();
        let digest = logical.digest();
        let plan = match state.entries.get(&digest) {
            Some(entry) if *entry.logical == *logical => entry.plan.clone(),
            _ => return None,
        };
        state.touch(digest);
        Some(plan)
    }

    pub fn contains(&self, logical: &PlanNode) -> bool {
        let state = self.state.lock();
        state
            .entries
            .get(&logical.digest())
            .map(|entry| *entry.logical == *logical)
            .unwrap_or(false)
    }

    /// Stores `plan` as the plan selected for `logical`, replacing an older entry.
    pub fn insert(&self, logical: PlanNodeRef, plan: Plan) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock();
        let digest = logical.digest();
        state.entries.insert(digest, CacheEntry { logical, plan });
        state.touch(digest);

        while state.entries.len() > self.capacity {
            match state.order.pop_front() {
                Some(evicted) => {
                    debug!("Evicting plan {} from plan cache", evicted);
                    state.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }

    /// Removes the plan cached for the logical plan with `digest`.
    pub fn invalidate(&self, digest: Digest) -> bool {
        self.state.lock().remove(digest)
    }

    /// Removes all plans matching `predicate`, e.g. all plans using a dropped index. Returns the
    /// number of removed plans.
    pub fn invalidate_if<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Plan) -> bool,
    {
        let mut state = self.state.lock();
        let matching: Vec<Digest> = state
            .entries
            .iter()
            .filter(|(_, entry)| predicate(&entry.plan))
            .map(|(digest, _)| *digest)
            .collect();
        for digest in &matching {
            state.remove(*digest);
        }
        matching.len()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
