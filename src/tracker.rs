// src/tracker.rs
//
// Frame-to-frame identity assignment by greedy nearest-centroid matching.
//
// Detections are matched in input order against the last known center of
// every live identity; closest wins if within the distance threshold, each
// identity claimable at most once per frame. Unmatched detections mint a
// fresh identity. Greedy order-dependent matching can swap identities when
// paths cross — accepted baseline behavior, kept for compatibility with the
// deployed system rather than upgraded to global bipartite assignment.

use crate::types::{BoundingBox, EntityId};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// One detection bound to an identity for the current frame.
#[derive(Debug, Clone)]
pub struct TrackAssignment {
    pub id: EntityId,
    /// Last box seen for this identity before the current frame, if any
    pub prev_box: Option<BoundingBox>,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone)]
struct TrackedEntity {
    last_box: BoundingBox,
    trail: VecDeque<BoundingBox>,
    last_seen: f64,
}

pub struct Tracker {
    tracks: HashMap<EntityId, TrackedEntity>,
    distance_threshold: f32,
    trail_capacity: usize,
}

impl Tracker {
    pub fn new(distance_threshold: f32, trail_capacity: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            distance_threshold,
            trail_capacity,
        }
    }

    /// Assign an identity to every detection and update trails.
    pub fn update(&mut self, detections: &[BoundingBox], timestamp: f64) -> Vec<TrackAssignment> {
        let mut assigned = Vec::with_capacity(detections.len());
        let mut used: HashSet<EntityId> = HashSet::new();
        let trail_capacity = self.trail_capacity;

        for det in detections {
            let (cx, cy) = det.center();

            let mut best: Option<(EntityId, f32)> = None;
            for (id, track) in &self.tracks {
                if used.contains(id) {
                    continue;
                }
                let (px, py) = track.last_box.center();
                let dist = (cx - px).hypot(cy - py);
                if dist < self.distance_threshold
                    && best.as_ref().map_or(true, |(_, d)| dist < *d)
                {
                    best = Some((id.clone(), dist));
                }
            }

            let (id, prev_box) = match best {
                Some((id, _)) => {
                    let prev = self.tracks.get(&id).map(|t| t.last_box);
                    (id, prev)
                }
                None => {
                    let id = EntityId::mint();
                    debug!("New identity {} at ({:.0}, {:.0})", id, cx, cy);
                    (id, None)
                }
            };

            let track = self.tracks.entry(id.clone()).or_insert_with(|| TrackedEntity {
                last_box: *det,
                trail: VecDeque::with_capacity(trail_capacity),
                last_seen: timestamp,
            });
            track.last_box = *det;
            track.last_seen = timestamp;
            track.trail.push_back(*det);
            while track.trail.len() > trail_capacity {
                track.trail.pop_front();
            }

            used.insert(id.clone());
            assigned.push(TrackAssignment {
                id,
                prev_box,
                bbox: *det,
            });
        }

        assigned
    }

    /// Drop identities idle longer than `ttl_seconds`, returning the evicted
    /// ids so the caller can release their risk and behavior records.
    pub fn evict_idle(&mut self, now: f64, ttl_seconds: f64) -> Vec<EntityId> {
        let stale: Vec<EntityId> = self
            .tracks
            .iter()
            .filter(|(_, t)| now - t.last_seen > ttl_seconds)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.tracks.remove(id);
            debug!("Evicted idle identity {}", id);
        }
        stale
    }

    pub fn trail_of(&self, id: &EntityId) -> Vec<BoundingBox> {
        self.tracks
            .get(id)
            .map(|t| t.trail.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.tracks.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn test_reappearance_within_threshold_keeps_identity() {
        let mut tracker = Tracker::new(50.0, 15);
        let first = tracker.update(&[bbox(100.0, 100.0, 200.0, 200.0)], 0.0);
        let id = first[0].id.clone();

        // Center moves ~7px — well within the 50px threshold
        let second = tracker.update(&[bbox(105.0, 105.0, 205.0, 205.0)], 0.033);
        assert_eq!(second[0].id, id);
        assert_eq!(second[0].prev_box, Some(bbox(100.0, 100.0, 200.0, 200.0)));
    }

    #[test]
    fn test_distant_detection_mints_new_identity() {
        let mut tracker = Tracker::new(50.0, 15);
        let first = tracker.update(&[bbox(100.0, 100.0, 200.0, 200.0)], 0.0);

        // Center jumps 300px — beyond threshold, must not reuse the identity
        let second = tracker.update(&[bbox(400.0, 400.0, 500.0, 500.0)], 0.033);
        assert_ne!(second[0].id, first[0].id);
        assert!(second[0].prev_box.is_none());
        assert_eq!(tracker.track_count(), 2);
    }

    #[test]
    fn test_no_duplicate_identity_in_one_frame() {
        let mut tracker = Tracker::new(50.0, 15);
        tracker.update(&[bbox(100.0, 100.0, 200.0, 200.0)], 0.0);

        // Two detections both near the single known track — only one may claim it
        let frame = [
            bbox(102.0, 102.0, 202.0, 202.0),
            bbox(108.0, 108.0, 208.0, 208.0),
        ];
        let assigned = tracker.update(&frame, 0.033);
        assert_ne!(assigned[0].id, assigned[1].id);
    }

    #[test]
    fn test_closest_track_wins() {
        let mut tracker = Tracker::new(50.0, 15);
        let init = tracker.update(
            &[
                bbox(100.0, 100.0, 200.0, 200.0),
                bbox(130.0, 100.0, 230.0, 200.0),
            ],
            0.0,
        );

        // A detection 3px from the second track must match it, not the first
        let next = tracker.update(&[bbox(133.0, 100.0, 233.0, 200.0)], 0.033);
        assert_eq!(next[0].id, init[1].id);
    }

    #[test]
    fn test_trail_capped_at_capacity() {
        let mut tracker = Tracker::new(50.0, 15);
        let mut id = None;
        for i in 0..40 {
            let shift = i as f32;
            let assigned = tracker.update(
                &[bbox(100.0 + shift, 100.0, 200.0 + shift, 200.0)],
                i as f64 * 0.033,
            );
            id = Some(assigned[0].id.clone());
        }
        let trail = tracker.trail_of(id.as_ref().unwrap());
        assert_eq!(trail.len(), 15);
        // Oldest entries dropped first: the newest box is at the tail
        assert_eq!(trail[14], bbox(139.0, 100.0, 239.0, 200.0));
    }

    #[test]
    fn test_idle_identity_evicted_after_ttl() {
        let mut tracker = Tracker::new(50.0, 15);
        let assigned = tracker.update(&[bbox(100.0, 100.0, 200.0, 200.0)], 0.0);
        let id = assigned[0].id.clone();

        assert!(tracker.evict_idle(10.0, 30.0).is_empty());
        let evicted = tracker.evict_idle(31.0, 30.0);
        assert_eq!(evicted, vec![id.clone()]);
        assert!(!tracker.contains(&id));
    }
}
