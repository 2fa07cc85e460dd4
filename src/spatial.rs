// src/spatial.rs
//
// Geofence zone and coarse pose classification from box geometry alone.
// Zone layout is a fixed three-way partition of the normalized frame:
// top half SAFE, bottom-left TRANSITION, bottom-right RESTRICTED.

use crate::types::{BoundingBox, Pose, Zone};

/// Aspect ratio (width / height) above which a box reads as a fallen entity
const FALLEN_ASPECT_RATIO: f32 = 1.5;

/// Box height (pixels) above which an entity is close enough to alert on
const PROXIMITY_HEIGHT_PX: f32 = 200.0;

pub struct SpatialContext {
    frame_width: f32,
    frame_height: f32,
}

impl SpatialContext {
    pub fn new(frame_width: f32, frame_height: f32) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }

    /// Which geofence zone the center of the box falls into.
    pub fn classify_zone(&self, bbox: &BoundingBox) -> Zone {
        let (cx, cy) = bbox.center();
        let nx = cx / self.frame_width;
        let ny = cy / self.frame_height;

        if ny < 0.5 {
            Zone::Safe
        } else if nx < 0.5 {
            Zone::Transition
        } else {
            Zone::Restricted
        }
    }

    /// Coarse pose from box proportions. Not real pose estimation: a very
    /// wide box reads as fallen, a very tall one as close proximity.
    pub fn estimate_pose(&self, bbox: &BoundingBox) -> Pose {
        if bbox.width() > bbox.height() * FALLEN_ASPECT_RATIO {
            Pose::Fallen
        } else if bbox.height() > PROXIMITY_HEIGHT_PX {
            Pose::ProximityAlert
        } else {
            Pose::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SpatialContext {
        SpatialContext::new(640.0, 480.0)
    }

    #[test]
    fn test_top_half_is_safe() {
        // Center (150, 150) -> normalized (0.23, 0.31)
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(ctx().classify_zone(&bbox), Zone::Safe);
    }

    #[test]
    fn test_bottom_left_is_transition() {
        // Center (100, 360) -> normalized (0.16, 0.75)
        let bbox = BoundingBox::new(50.0, 300.0, 150.0, 420.0);
        assert_eq!(ctx().classify_zone(&bbox), Zone::Transition);
    }

    #[test]
    fn test_bottom_right_is_restricted() {
        // Center (430, 360) -> normalized (0.67, 0.75)
        let bbox = BoundingBox::new(400.0, 300.0, 460.0, 420.0);
        assert_eq!(ctx().classify_zone(&bbox), Zone::Restricted);
    }

    #[test]
    fn test_zone_respects_frame_size() {
        // Same pixel box, larger reference frame -> center moves into top half
        let bbox = BoundingBox::new(400.0, 300.0, 460.0, 420.0);
        let wide = SpatialContext::new(1280.0, 960.0);
        assert_eq!(wide.classify_zone(&bbox), Zone::Safe);
    }

    #[test]
    fn test_wide_box_is_fallen() {
        // 300x100, aspect 3.0
        let bbox = BoundingBox::new(100.0, 100.0, 400.0, 200.0);
        assert_eq!(ctx().estimate_pose(&bbox), Pose::Fallen);
    }

    #[test]
    fn test_tall_box_is_proximity_alert() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 300.0);
        assert_eq!(ctx().estimate_pose(&bbox), Pose::ProximityAlert);
    }

    #[test]
    fn test_ordinary_box_is_stable() {
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(ctx().estimate_pose(&bbox), Pose::Stable);
    }
}
