use crate::utils::bbox::BoundingBox;
use crate::Errors;
use anyhow::Result;

pub use crate::utils::kalman::kalman_sort_box::KalmanNoise;

/// Per-track motion estimator built on top of the SORT Kalman filter
pub mod estimator;

/// Age- and speed-adaptive gating thresholds
pub mod gate;

/// Pairwise track/detection costs
pub mod metric;

/// Track lifecycle: the store that owns every live track
pub mod store;

/// Single tracked identity
pub mod track;

/// Assignment of detections to tracks
pub mod voting;

/// SORT implementation with a very tiny interface
pub mod simple_api;

/// Default minimal IoU a detection must have with the track prediction
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
/// Default maximal centroid distance between the track prediction and a detection
pub const DEFAULT_DIST_THRESHOLD: f32 = 60.0;
/// Default number of frames the track survives without a match
pub const DEFAULT_MAX_DISAPPEARED: usize = 30;
/// Default age (in frames) before which the track is gated strictly
pub const DEFAULT_YOUNG_TRACK_AGE_THRESHOLD: usize = 5;

/// Tracker options. They are validated once when the tracker is created and never change
/// during the session.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SortOptions {
    /// base IoU gate
    pub iou_threshold: f32,
    /// base centroid distance gate, in box coordinate units
    pub dist_threshold: f32,
    /// the track is deleted once it is not matched for more than this number of frames
    pub max_disappeared: usize,
    /// tracks younger than that are gated strictly
    pub young_track_age_threshold: usize,
    /// consecutive matches required to turn a tentative track into a confirmed one
    pub confirmation_hits: usize,
    /// whether tentative tracks are reported in the frame output
    pub emit_tentative: bool,
    /// the maximum number of observed and predicted boxes kept for the track
    pub history_length: usize,
    pub kalman_noise: KalmanNoise,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            dist_threshold: DEFAULT_DIST_THRESHOLD,
            max_disappeared: DEFAULT_MAX_DISAPPEARED,
            young_track_age_threshold: DEFAULT_YOUNG_TRACK_AGE_THRESHOLD,
            confirmation_hits: 1,
            emit_tentative: true,
            history_length: 1,
            kalman_noise: KalmanNoise::default(),
        }
    }
}

impl SortOptions {
    pub fn iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn dist_threshold(mut self, dist_threshold: f32) -> Self {
        self.dist_threshold = dist_threshold;
        self
    }

    pub fn max_disappeared(mut self, max_disappeared: usize) -> Self {
        self.max_disappeared = max_disappeared;
        self
    }

    pub fn young_track_age_threshold(mut self, young_track_age_threshold: usize) -> Self {
        self.young_track_age_threshold = young_track_age_threshold;
        self
    }

    pub fn confirmation_hits(mut self, confirmation_hits: usize) -> Self {
        self.confirmation_hits = confirmation_hits;
        self
    }

    pub fn emit_tentative(mut self, emit_tentative: bool) -> Self {
        self.emit_tentative = emit_tentative;
        self
    }

    pub fn history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length;
        self
    }

    pub fn kalman_noise(mut self, kalman_noise: KalmanNoise) -> Self {
        self.kalman_noise = kalman_noise;
        self
    }

    /// Checks that the options describe a usable tracker
    ///
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(Errors::InvalidConfiguration(msg).into())
        }

        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return invalid(format!(
                "iou_threshold must lay in (0.0, 1.0], got {}",
                self.iou_threshold
            ));
        }
        if !(self.dist_threshold > 0.0 && self.dist_threshold.is_finite()) {
            return invalid(format!(
                "dist_threshold must be a positive number, got {}",
                self.dist_threshold
            ));
        }
        if self.max_disappeared < 1 {
            return invalid("max_disappeared must be at least 1".into());
        }
        if self.young_track_age_threshold < 1 {
            return invalid("young_track_age_threshold must be at least 1".into());
        }
        if self.confirmation_hits < 1 {
            return invalid("confirmation_hits must be at least 1".into());
        }
        if self.history_length < 1 {
            return invalid("history_length must be at least 1".into());
        }

        let n = &self.kalman_noise;
        let variances = [
            n.measurement_position,
            n.measurement_shape,
            n.initial_position,
            n.initial_velocity,
            n.process_position,
            n.process_velocity,
            n.process_scale_velocity,
        ];
        if !variances.iter().all(|v| *v > 0.0 && v.is_finite()) {
            return invalid(format!("Kalman noise variances must be positive, got {:?}", n));
        }
        Ok(())
    }
}

/// Box received from a detector for the current frame
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }

    /// The box must have positive width and height with a representable area, the confidence
    /// must lay in `[0.0, 1.0]`
    ///
    pub fn validate(&self) -> Result<(), Errors> {
        if self.bbox.is_valid()
            && self.bbox.as_scale_aspect().is_finite()
            && (0.0..=1.0).contains(&self.confidence)
        {
            Ok(())
        } else {
            Err(Errors::MalformedDetection(
                self.bbox.x_min(),
                self.bbox.y_min(),
                self.bbox.x_max(),
                self.bbox.y_max(),
                self.confidence,
            ))
        }
    }
}

impl From<BoundingBox> for Detection {
    fn from(bbox: BoundingBox) -> Self {
        Detection::new(bbox, 1.0)
    }
}

/// Track lifecycle state
///
/// `Tentative --(match)--> Confirmed`, both turn into the terminal `Lost` state once the track
/// stays unmatched for more than `max_disappeared` frames.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    #[default]
    Tentative,
    Confirmed,
    Lost,
}

/// Why the track was removed from the tracker
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasteReason {
    /// not matched for more than `max_disappeared` frames
    Expired,
    /// the motion estimator produced a numerically invalid state
    Degenerate,
}

/// Online track structure that contains tracking information for the last tracker frame
///
#[derive(Debug, Clone, PartialEq)]
pub struct SortTrack {
    /// id of the track
    ///
    pub id: u64,
    /// the frame the information belongs to
    ///
    pub frame: usize,
    /// the current box estimated by the motion estimator
    ///
    pub bbox: BoundingBox,
    /// the box passed by the detector when the track was lastly matched
    ///
    pub observed_bbox: BoundingBox,
    pub state: TrackState,
    /// frames since the track was created
    ///
    pub age: usize,
    /// consecutive frames without a match
    ///
    pub time_since_update: usize,
    /// total number of matches
    ///
    pub hits: usize,
}

/// Track removed from the tracker, with its collected history
///
#[derive(Debug, Clone, PartialEq)]
pub struct WastedSortTrack {
    pub id: u64,
    /// the frame when the track was removed
    ///
    pub frame: usize,
    /// always `TrackState::Lost`
    ///
    pub state: TrackState,
    /// the frame when the track was lastly matched (or created)
    ///
    pub last_updated_frame: usize,
    pub age: usize,
    pub hits: usize,
    pub reason: WasteReason,
    /// history of predicted boxes
    ///
    pub predicted_boxes: Vec<BoundingBox>,
    /// history of observed boxes
    ///
    pub observed_boxes: Vec<BoundingBox>,
}
