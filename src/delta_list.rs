//! # Delta List
//!
//! The thinning engine behind [`Trace`](crate::Trace).
//!
//! Points live in a slot arena and are chained chronologically through
//! `prev`/`next` slot indices, so removing a point only touches its two
//! neighbours. Every interior point carries a drop cost and sits in an
//! ordered set, so the least significant point is found without a scan of
//! the whole trace.
//!
//! ## Drop cost
//!
//! For an interior point `p` between `a` and `b`:
//!
//! ```text
//! zigzag     = max(0, |ap| + |pb| - |ab|)            metres
//! age_weight = 1 + (p.time - origin_time) / 3600
//! cost       = zigzag * age_weight
//! ```
//!
//! `zigzag` is the extra path length the point contributes over the straight
//! line joining its neighbours. The age weight makes old detail cheaper than
//! recent detail without the key ever changing as time passes. Candidates
//! are ranked by `(cost, b.time - a.time, p.time, slot)` ascending.
//!
//! The oldest and newest points are never candidates. Points inside the
//! no-thin window stay out of the ranking altogether: a frontier slot marks
//! the oldest point not yet released from the window, and
//! [`DeltaList::erase_delta`] advances it before removing anything, so each
//! point is released once and every removal costs `O(log n)`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::trace_point::TracePoint;

/// Age at which a point's detail is valued half as much as brand new detail.
const AGE_WEIGHT_SECONDS: f64 = 3600.0;

/// Extra path length `point` adds over the straight line `prev` → `next`,
/// weighted by the point's age relative to `origin_time`.
pub fn drop_cost(prev: &TracePoint, point: &TracePoint, next: &TracePoint, origin_time: u32) -> f64 {
    let via = prev.flat_distance(point) + point.flat_distance(next);
    let direct = prev.flat_distance(next);
    let zigzag = (via - direct).max(0.0);
    let age = point.time.saturating_sub(origin_time) as f64;
    zigzag * (1.0 + age / AGE_WEIGHT_SECONDS)
}

/// Whether `time` falls inside the no-thin window ending at `last_time`.
fn is_protected(time: u32, last_time: u32, no_thin_time: u32) -> bool {
    i64::from(time) > i64::from(last_time) - i64::from(no_thin_time)
}

/// Ordering key of a removal candidate.
#[derive(Debug, Clone, Copy)]
struct DeltaRank {
    cost: f64,
    span: u32,
    time: u32,
    slot: usize,
}

impl Ord for DeltaRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.span.cmp(&other.span))
            .then(self.time.cmp(&other.time))
            .then(self.slot.cmp(&other.slot))
    }
}

impl PartialOrd for DeltaRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DeltaRank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DeltaRank {}

#[derive(Debug, Clone)]
struct Node {
    point: TracePoint,
    prev: Option<usize>,
    next: Option<usize>,
    /// Left the no-thin window and may be ranked
    released: bool,
    /// Present while the node is a released interior candidate
    rank: Option<DeltaRank>,
}

/// Chronological point list with cost-ranked removal.
#[derive(Debug, Clone, Default)]
pub struct DeltaList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    ranked: BTreeSet<DeltaRank>,
    /// Oldest point still inside the no-thin window
    frontier: Option<usize>,
    /// Time of the first point appended since the last clear
    origin_time: u32,
}

impl DeltaList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list with room for `capacity` points before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.ranked.clear();
        self.frontier = None;
        self.origin_time = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest point.
    pub fn front(&self) -> Option<&TracePoint> {
        self.head.and_then(|slot| self.node(slot)).map(|n| &n.point)
    }

    /// Newest point.
    pub fn back(&self) -> Option<&TracePoint> {
        self.tail.and_then(|slot| self.node(slot)).map(|n| &n.point)
    }

    /// Number of points currently ranked for removal (released interior points).
    pub fn candidate_count(&self) -> usize {
        self.ranked.len()
    }

    /// Iterate points oldest first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Append a point at the newest end.
    ///
    /// The caller guarantees `point.time` is not earlier than the current
    /// newest point.
    pub fn append(&mut self, point: TracePoint) {
        debug_assert!(self.back().map_or(true, |last| last.time <= point.time));

        if self.is_empty() {
            self.origin_time = point.time;
        }

        let node = Node {
            point,
            prev: self.tail,
            next: None,
            released: false,
            rank: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(old_tail) => {
                if let Some(n) = self.node_mut(old_tail) {
                    n.next = Some(slot);
                }
                // The old tail now has two neighbours
                self.rerank(old_tail);
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        if self.frontier.is_none() {
            self.frontier = Some(slot);
        }
        self.len += 1;
    }

    /// Remove every point with `time < min_time`.
    ///
    /// Returns true if anything was removed.
    pub fn erase_earlier_than(&mut self, min_time: u32) -> bool {
        let mut removed = false;

        while let Some(head) = self.head {
            let expired = self
                .node(head)
                .map_or(false, |n| n.point.time < min_time);
            if !expired {
                break;
            }
            self.unlink(head);
            removed = true;
        }

        if removed {
            // New head is an edge and no longer a candidate
            if let Some(head) = self.head {
                self.rerank(head);
            }
        }

        removed
    }

    /// Remove lowest-cost points until at most `target` remain.
    ///
    /// Points with `time > newest.time - no_thin_time` are never removed.
    /// The window only ever slides forward: a point released by an earlier
    /// call stays a candidate, so callers pass the same `no_thin_time` each
    /// time. Stops early when no eligible candidate is left. Returns true if
    /// anything was removed.
    pub fn erase_delta(&mut self, target: usize, no_thin_time: u32) -> bool {
        self.advance_frontier(no_thin_time);

        let mut removed = false;
        while self.len > target {
            let Some(slot) = self.ranked.first().map(|rank| rank.slot) else {
                break;
            };

            let (prev, next) = self.unlink(slot);
            if let Some(prev) = prev {
                self.rerank(prev);
            }
            if let Some(next) = next {
                self.rerank(next);
            }
            removed = true;
        }

        removed
    }

    /// Mean distance in metres between consecutive points whose newer member
    /// lies outside the no-thin window. Zero when no such pair exists.
    pub fn average_delta_distance(&self, no_thin_time: u32) -> f64 {
        self.average_delta(no_thin_time, |a, b| b.flat_distance(a))
    }

    /// Mean time in seconds between consecutive points whose newer member
    /// lies outside the no-thin window. Zero when no such pair exists.
    pub fn average_delta_time(&self, no_thin_time: u32) -> f64 {
        self.average_delta(no_thin_time, |a, b| f64::from(b.time_since(a)))
    }

    /// Release every point that has left the no-thin window into the ranking.
    fn advance_frontier(&mut self, no_thin_time: u32) {
        let Some(last_time) = self.back().map(|p| p.time) else {
            return;
        };

        while let Some(slot) = self.frontier {
            let Some((time, next)) = self.node(slot).map(|n| (n.point.time, n.next)) else {
                self.frontier = None;
                break;
            };
            if is_protected(time, last_time, no_thin_time) {
                break;
            }
            if let Some(node) = self.node_mut(slot) {
                node.released = true;
            }
            self.frontier = next;
            self.rerank(slot);
        }
    }

    fn average_delta<F>(&self, no_thin_time: u32, delta: F) -> f64
    where
        F: Fn(&TracePoint, &TracePoint) -> f64,
    {
        let last_time = match self.back() {
            Some(last) => last.time,
            None => return 0.0,
        };

        let mut total = 0.0;
        let mut count = 0usize;
        let mut previous: Option<&TracePoint> = None;
        for point in self.iter() {
            if is_protected(point.time, last_time, no_thin_time) {
                break;
            }
            if let Some(prev) = previous {
                total += delta(prev, point);
                count += 1;
            }
            previous = Some(point);
        }

        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    fn node(&self, slot: usize) -> Option<&Node> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn compute_rank(&self, slot: usize) -> Option<DeltaRank> {
        let node = self.node(slot)?;
        if !node.released {
            return None;
        }
        let prev = self.node(node.prev?)?;
        let next = self.node(node.next?)?;

        Some(DeltaRank {
            cost: drop_cost(&prev.point, &node.point, &next.point, self.origin_time),
            span: next.point.time_since(&prev.point),
            time: node.point.time,
            slot,
        })
    }

    /// Refresh a node's candidate entry after its neighbours changed.
    fn rerank(&mut self, slot: usize) {
        let rank = self.compute_rank(slot);
        if let Some(node) = self.slots.get_mut(slot).and_then(Option::as_mut) {
            if let Some(old) = node.rank.take() {
                self.ranked.remove(&old);
            }
            node.rank = rank;
            if let Some(rank) = rank {
                self.ranked.insert(rank);
            }
        }
    }

    /// Detach a node and free its slot. Returns its former neighbours.
    fn unlink(&mut self, slot: usize) -> (Option<usize>, Option<usize>) {
        let Some(node) = self.slots.get_mut(slot).and_then(Option::take) else {
            return (None, None);
        };

        if let Some(rank) = node.rank {
            self.ranked.remove(&rank);
        }
        if self.frontier == Some(slot) {
            self.frontier = node.next;
        }

        match node.prev {
            Some(prev) => {
                if let Some(n) = self.node_mut(prev) {
                    n.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(n) = self.node_mut(next) {
                    n.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.free.push(slot);
        self.len -= 1;
        (node.prev, node.next)
    }
}

/// Chronological iterator over a [`DeltaList`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    list: &'a DeltaList,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TracePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a DeltaList {
    type Item = &'a TracePoint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
