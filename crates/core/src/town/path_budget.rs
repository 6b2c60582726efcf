//! Per-tick path request budgeting, priority draining, and result caching
//! (C3). The cache is a hand-rolled LRU (`HashMap` plus a `VecDeque` recency
//! list) rather than an external `lru` crate dependency, matching the
//! corpus's habit of hand-rolling small eviction structures for a hot path.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

use crate::content::TownConfig;
use crate::types::{ActorFloor, BehaviorPhase, EntityId, Pos, WorldTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathCacheKey {
    pub floor: ActorFloor,
    pub start: Pos,
    pub goal: Pos,
}

/// Fixed-capacity LRU cache of pathfinding results.
pub struct PathCache {
    capacity: usize,
    entries: HashMap<PathCacheKey, Vec<Pos>>,
    recency: VecDeque<PathCacheKey>,
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: HashMap::new(), recency: VecDeque::new() }
    }

    pub fn get(&mut self, key: &PathCacheKey) -> Option<Vec<Pos>> {
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            if let Some(pos) = self.recency.iter().position(|k| k == key) {
                self.recency.remove(pos);
            }
            self.recency.push_back(*key);
        }
        hit
    }

    pub fn insert(&mut self, key: PathCacheKey, path: Vec<Pos>) {
        if self.entries.contains_key(&key) {
            if let Some(pos) = self.recency.iter().position(|k| k == &key) {
                self.recency.remove(pos);
            }
        } else if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.recency.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.entries.insert(key, path);
        self.recency.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRequest {
    pub actor: EntityId,
    pub floor: ActorFloor,
    pub start: Pos,
    pub goal: Pos,
    pub priority: u8,
}

/// Queues path requests and drains up to a per-tick budget, highest priority
/// first with arrival order preserved among equal priorities.
#[derive(Default)]
pub struct PathRequestQueue {
    pending: Vec<PathRequest>,
}

impl PathRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, request: PathRequest) {
        self.pending.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Pops the `budget` highest-priority requests, FIFO within a priority
    /// tier (`Vec::sort_by_key` is stable, so arrival order survives the
    /// sort), leaving the remainder queued for the next tick.
    pub fn drain_up_to(&mut self, budget: u32) -> Vec<PathRequest> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let mut items = std::mem::take(&mut self.pending);
        items.sort_by_key(|r| Reverse(r.priority));
        let budget = budget as usize;
        if items.len() <= budget {
            items
        } else {
            let remainder = items.split_off(budget);
            self.pending = remainder;
            items
        }
    }
}

/// `base * phase multiplier`, clamped, with an additive evening boost during
/// the homeward-return window when many actors request paths at once.
pub fn compute_budget(config: &TownConfig, phase: BehaviorPhase, time: &WorldTime) -> u32 {
    let phase_multiplier = match phase {
        BehaviorPhase::Morning | BehaviorPhase::Day => 1.0,
        BehaviorPhase::Evening => 1.25,
    };
    let mut budget = (config.base_path_budget as f32 * phase_multiplier).round() as u32;
    if time.in_evening_return_window() {
        budget += config.evening_budget_boost;
    }
    budget.clamp(config.path_budget_min, config.path_budget_max)
}

pub struct PathBudget {
    pub cache: PathCache,
    pub queue: PathRequestQueue,
}

impl PathBudget {
    pub fn new(cache_capacity: usize) -> Self {
        Self { cache: PathCache::new(cache_capacity), queue: PathRequestQueue::new() }
    }
}
