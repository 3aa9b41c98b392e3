use crate::trackers::sort::estimator::MotionEstimator;
use crate::trackers::sort::{SortTrack, TrackState, WasteReason, WastedSortTrack};
use crate::utils::bbox::BoundingBox;
use crate::utils::kalman::kalman_sort_box::SortBoxKalmanFilter;
use crate::Errors;
use std::collections::VecDeque;
use std::sync::Arc;

/// Tracked identity. The record owns its motion estimator, so removing the track from the store
/// releases the estimator as well.
///
#[derive(Debug, Clone)]
pub struct Track {
    id: u64,
    state: TrackState,
    age: usize,
    time_since_update: usize,
    hits: usize,
    hit_streak: usize,
    last_updated_frame: usize,
    estimator: MotionEstimator,
    observed_bbox: BoundingBox,
    observed_boxes: VecDeque<BoundingBox>,
    predicted_boxes: VecDeque<BoundingBox>,
    history_length: usize,
    degenerate: bool,
}

impl Track {
    /// Creates a tentative track from an unmatched detection
    ///
    /// # Parameters
    /// * `id` - fresh identity
    /// * `frame` - the frame the detection belongs to
    /// * `bbox` - the detected box
    /// * `filter` - shared filter parameters
    /// * `history_length` - how many observed/predicted boxes are kept
    ///
    pub fn new(
        id: u64,
        frame: usize,
        bbox: &BoundingBox,
        filter: Arc<SortBoxKalmanFilter>,
        history_length: usize,
    ) -> Self {
        let estimator = MotionEstimator::new(id, filter, bbox);
        let mut track = Self {
            id,
            state: TrackState::Tentative,
            age: 0,
            time_since_update: 0,
            hits: 0,
            hit_streak: 0,
            last_updated_frame: frame,
            observed_bbox: *bbox,
            observed_boxes: VecDeque::with_capacity(history_length + 1),
            predicted_boxes: VecDeque::with_capacity(history_length + 1),
            estimator,
            history_length,
            degenerate: false,
        };
        track.update_history(*bbox, *bbox);
        track
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn age(&self) -> usize {
        self.age
    }

    pub fn time_since_update(&self) -> usize {
        self.time_since_update
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn last_updated_frame(&self) -> usize {
        self.last_updated_frame
    }

    pub fn estimator(&self) -> &MotionEstimator {
        &self.estimator
    }

    #[cfg(test)]
    pub(crate) fn estimator_mut(&mut self) -> &mut MotionEstimator {
        &mut self.estimator
    }

    /// The box of the latest predicted or updated state
    ///
    pub fn current_box(&self) -> BoundingBox {
        self.estimator.current_box()
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// The track is gone for more than `max_disappeared` frames or can't be estimated anymore
    ///
    pub fn is_expired(&self, max_disappeared: usize) -> bool {
        self.degenerate || self.time_since_update > max_disappeared
    }

    fn update_history(&mut self, observed: BoundingBox, predicted: BoundingBox) {
        self.observed_boxes.push_back(observed);
        self.predicted_boxes.push_back(predicted);

        if self.observed_boxes.len() > self.history_length {
            self.observed_boxes.pop_front();
            self.predicted_boxes.pop_front();
        }
    }

    /// Runs the motion estimator prediction for the frame. An unrecoverable estimator state
    /// marks the track degenerate, such a track is excluded from matching and removed during the
    /// reconciliation.
    ///
    pub fn predict(&mut self, frame: usize) -> Result<(), Errors> {
        let res = self.estimator.predict(frame);
        if let Err(Errors::DegenerateEstimatorState(..)) = &res {
            self.degenerate = true;
        }
        res
    }

    /// Applies the matched detection
    ///
    pub fn apply_match(
        &mut self,
        frame: usize,
        bbox: &BoundingBox,
        confirmation_hits: usize,
    ) -> Result<(), Errors> {
        let predicted = self.estimator.current_box();
        if let Err(e) = self.estimator.update(frame, bbox) {
            if let Errors::DegenerateEstimatorState(..) = e {
                self.degenerate = true;
            }
            return Err(e);
        }

        self.age += 1;
        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.last_updated_frame = frame;
        self.observed_bbox = *bbox;
        self.update_history(*bbox, predicted);

        if self.state == TrackState::Tentative && self.hit_streak >= confirmation_hits {
            self.state = TrackState::Confirmed;
        }
        Ok(())
    }

    /// Ages the track that found no detection in the frame; the estimator stays predicted
    ///
    pub fn mark_missed(&mut self) {
        self.age += 1;
        self.time_since_update += 1;
        self.hit_streak = 0;
    }

    /// Snapshot of the track for the frame output
    ///
    pub fn to_sort_track(&self, frame: usize) -> SortTrack {
        SortTrack {
            id: self.id,
            frame,
            bbox: self.current_box(),
            observed_bbox: self.observed_bbox,
            state: self.state,
            age: self.age,
            time_since_update: self.time_since_update,
            hits: self.hits,
        }
    }

    /// Turns the track into the terminal state, consuming it together with its estimator
    ///
    pub fn into_wasted(self, frame: usize) -> WastedSortTrack {
        WastedSortTrack {
            id: self.id,
            frame,
            state: TrackState::Lost,
            last_updated_frame: self.last_updated_frame,
            age: self.age,
            hits: self.hits,
            reason: if self.degenerate {
                WasteReason::Degenerate
            } else {
                WasteReason::Expired
            },
            predicted_boxes: self.predicted_boxes.into_iter().collect(),
            observed_boxes: self.observed_boxes.into_iter().collect(),
        }
    }
}
