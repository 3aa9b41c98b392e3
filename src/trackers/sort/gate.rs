/// Distance gate factor for young tracks, they must not steal distant detections
pub const YOUNG_DISTANCE_FACTOR: f32 = 0.8;
/// IoU gate factor for established tracks
pub const MATURE_IOU_FACTOR: f32 = 0.95;
/// How much the distance gate of an established track grows per unit of speed
pub const SPEED_DISTANCE_FACTOR: f32 = 1.5;

/// Gating thresholds of a single track for the current frame
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    /// minimal IoU
    pub iou: f32,
    /// maximal centroid distance
    pub distance: f32,
}

impl Gate {
    /// Both conditions must hold for the pair to be eligible
    ///
    pub fn admits(&self, iou: f32, distance: f32) -> bool {
        iou >= self.iou && distance <= self.distance
    }
}

/// Computes the gate of a track from its age and estimated speed.
///
/// * `age < young_track_age_threshold`: `iou = base_iou`, `distance = base_distance * 0.8`;
/// * otherwise: `iou = base_iou * 0.95`, `distance = base_distance + speed * 1.5`.
///
pub fn adaptive_gate(
    age: usize,
    speed: f32,
    base_iou: f32,
    base_distance: f32,
    young_track_age_threshold: usize,
) -> Gate {
    if age < young_track_age_threshold {
        Gate {
            iou: base_iou,
            distance: base_distance * YOUNG_DISTANCE_FACTOR,
        }
    } else {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        Gate {
            iou: base_iou * MATURE_IOU_FACTOR,
            distance: base_distance + speed * SPEED_DISTANCE_FACTOR,
        }
    }
}
