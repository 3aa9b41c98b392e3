use crate::utils::bbox::BoundingBox;
use crate::utils::kalman::kalman_sort_box::{SortBoxKalmanFilter, DIM_SORT_BOX_STATE};
use crate::utils::kalman::KalmanState;
use crate::Errors;
use std::sync::Arc;

/// Motion estimator exclusively owned by one track.
///
/// Within a frame the estimator must be predicted exactly once and, only after that, updated at
/// most once. Both rules are enforced and reported as errors.
///
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    owner: u64,
    filter: Arc<SortBoxKalmanFilter>,
    state: KalmanState<DIM_SORT_BOX_STATE>,
    predicted_frame: Option<usize>,
    updated_frame: Option<usize>,
    predictions: usize,
    updates: usize,
}

impl MotionEstimator {
    /// Creates the estimator from the first observed box; velocities start at zero
    ///
    /// # Parameters
    /// * `owner` - id of the track that owns the estimator
    /// * `filter` - shared (stateless) filter parameters
    /// * `bbox` - the detection the track is created from
    ///
    pub fn new(owner: u64, filter: Arc<SortBoxKalmanFilter>, bbox: &BoundingBox) -> Self {
        let state = filter.initiate(&bbox.as_scale_aspect());
        Self {
            owner,
            filter,
            state,
            predicted_frame: None,
            updated_frame: None,
            predictions: 0,
            updates: 0,
        }
    }

    /// Advances the state by one step
    ///
    pub fn predict(&mut self, frame: usize) -> Result<(), Errors> {
        if self.predicted_frame == Some(frame) {
            return Err(Errors::DoublePrediction(self.owner, frame));
        }
        self.predicted_frame = Some(frame);
        self.predictions += 1;
        self.state = self.filter.predict(&self.state);
        self.check_state()
    }

    /// Corrects the state predicted for the `frame` with the observed box
    ///
    pub fn update(&mut self, frame: usize, bbox: &BoundingBox) -> Result<(), Errors> {
        if self.predicted_frame != Some(frame) {
            return Err(Errors::UpdateWithoutPrediction(self.owner, frame));
        }
        if self.updated_frame == Some(frame) {
            return Err(Errors::DoubleUpdate(self.owner, frame));
        }
        self.updated_frame = Some(frame);
        self.updates += 1;
        self.state = self
            .filter
            .update(&self.state, &bbox.as_scale_aspect())
            .ok_or_else(|| {
                Errors::DegenerateEstimatorState(
                    self.owner,
                    "innovation covariance is not positive definite".into(),
                )
            })?;
        self.check_state()
    }

    fn check_state(&self) -> Result<(), Errors> {
        if self.state.is_finite() {
            Ok(())
        } else {
            Err(Errors::DegenerateEstimatorState(
                self.owner,
                "non-finite mean or covariance".into(),
            ))
        }
    }

    /// Box in the corner format for the current state
    ///
    pub fn current_box(&self) -> BoundingBox {
        SortBoxKalmanFilter::measurement(&self.state).into()
    }

    /// Velocity components `(vx, vy, vscale)`
    ///
    pub fn velocity(&self) -> (f32, f32, f32) {
        SortBoxKalmanFilter::velocity(&self.state)
    }

    /// Center speed, `sqrt(vx^2 + vy^2)`
    ///
    pub fn speed(&self) -> f32 {
        let (vx, vy, _) = self.velocity();
        vx.hypot(vy)
    }

    pub fn state(&self) -> &KalmanState<DIM_SORT_BOX_STATE> {
        &self.state
    }

    pub fn predictions(&self) -> usize {
        self.predictions
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut KalmanState<DIM_SORT_BOX_STATE> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use crate::trackers::sort::estimator::MotionEstimator;
    use crate::utils::bbox::BoundingBox;
    use crate::utils::kalman::kalman_sort_box::SortBoxKalmanFilter;
    use crate::{EstimateClose, Errors};
    use std::sync::Arc;

    fn estimator(bbox: BoundingBox) -> MotionEstimator {
        MotionEstimator::new(7, Arc::new(SortBoxKalmanFilter::default()), &bbox)
    }

    #[test]
    fn initial_box() {
        let bbox = BoundingBox::new(10.0, 10.0, 50.0, 30.0);
        let e = estimator(bbox);
        assert!(e.current_box().almost_same(&bbox, 0.001));
        assert_eq!(e.speed(), 0.0);
    }

    #[test]
    fn predict_then_update_moves_toward_measurement() {
        let mut e = estimator(BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        e.predict(1).unwrap();
        let predicted = e.current_box();

        let measurement = BoundingBox::new(20.0, 18.0, 60.0, 58.0);
        e.update(1, &measurement).unwrap();
        let updated = e.current_box();

        let before = BoundingBox::center_distance(&predicted, &measurement);
        let after = BoundingBox::center_distance(&updated, &measurement);
        assert!(after < before);
        assert_eq!(e.predictions(), 1);
        assert_eq!(e.updates(), 1);
    }

    #[test]
    fn double_prediction_is_rejected() {
        let mut e = estimator(BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        e.predict(1).unwrap();
        assert_eq!(e.predict(1), Err(Errors::DoublePrediction(7, 1)));
        assert_eq!(e.predictions(), 1);

        // unmatched frames predict without an update
        assert!(e.predict(2).is_ok());
        assert!(e.predict(3).is_ok());
    }

    #[test]
    fn update_contract() {
        let bbox = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        let mut e = estimator(bbox);
        assert_eq!(e.update(1, &bbox), Err(Errors::UpdateWithoutPrediction(7, 1)));

        e.predict(1).unwrap();
        assert!(e.update(1, &bbox).is_ok());
        assert_eq!(e.update(1, &bbox), Err(Errors::DoubleUpdate(7, 1)));

        assert_eq!(e.update(2, &bbox), Err(Errors::UpdateWithoutPrediction(7, 2)));
    }

    #[test]
    fn speed_follows_motion() {
        let mut e = estimator(BoundingBox::ltwh(0.0, 0.0, 20.0, 40.0));
        for frame in 1..20 {
            e.predict(frame).unwrap();
            let shift = 4.0 * frame as f32;
            e.update(frame, &BoundingBox::ltwh(shift, 0.0, 20.0, 40.0))
                .unwrap();
        }
        assert!((e.speed() - 4.0).abs() < 0.5, "speed={}", e.speed());
    }

    #[test]
    fn non_finite_state_is_reported() {
        let mut e = estimator(BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        e.state_mut().mean[4] = f32::NAN;
        assert!(matches!(
            e.predict(1),
            Err(Errors::DegenerateEstimatorState(7, _))
        ));
    }
}
