// Noise setup follows the original SORT tracker
// https://github.com/abewley/sort/blob/master/sort.py
//
use crate::utils::bbox::ScaleAspectBox;
use crate::utils::kalman::{KalmanState, DT};
use nalgebra::{SMatrix, SVector};

pub const DIM_SORT_BOX: usize = 4;
pub const DIM_SORT_BOX_STATE: usize = 7;

/// Replaces a non-positive aspect ratio in the state
pub const MIN_ASPECT: f32 = 1e-5;

const XC: usize = 0;
const YC: usize = 1;
const SCALE: usize = 2;
const ASPECT: usize = 3;
const VX: usize = 4;
const VY: usize = 5;
const VSCALE: usize = 6;

/// Diagonal noise parameters of the filter
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanNoise {
    /// measurement variance of the center coordinates
    pub measurement_position: f32,
    /// measurement variance of the scale and the aspect ratio
    pub measurement_shape: f32,
    /// initial variance of the measured components
    pub initial_position: f32,
    /// initial variance of the velocities (unobserved, hence large)
    pub initial_velocity: f32,
    /// process variance of the measured components
    pub process_position: f32,
    /// process variance of the center velocities
    pub process_velocity: f32,
    /// process variance of the scale velocity
    pub process_scale_velocity: f32,
}

impl Default for KalmanNoise {
    fn default() -> Self {
        Self {
            measurement_position: 1.0,
            measurement_shape: 10.0,
            initial_position: 10.0,
            initial_velocity: 10_000.0,
            process_position: 1.0,
            process_velocity: 0.01,
            process_scale_velocity: 0.0001,
        }
    }
}

/// Constant velocity Kalman filter for the state `[xc, yc, scale, aspect, vx, vy, vscale]`
/// and the measurement `[xc, yc, scale, aspect]`.
///
/// The filter itself is stateless, the state is passed in and returned back.
///
#[derive(Debug, Clone)]
pub struct SortBoxKalmanFilter {
    motion_matrix: SMatrix<f32, DIM_SORT_BOX_STATE, DIM_SORT_BOX_STATE>,
    update_matrix: SMatrix<f32, DIM_SORT_BOX, DIM_SORT_BOX_STATE>,
    measurement_cov: SMatrix<f32, DIM_SORT_BOX, DIM_SORT_BOX>,
    process_cov: SMatrix<f32, DIM_SORT_BOX_STATE, DIM_SORT_BOX_STATE>,
    initial_cov: SMatrix<f32, DIM_SORT_BOX_STATE, DIM_SORT_BOX_STATE>,
}

impl Default for SortBoxKalmanFilter {
    fn default() -> Self {
        SortBoxKalmanFilter::new(KalmanNoise::default())
    }
}

impl SortBoxKalmanFilter {
    pub fn new(noise: KalmanNoise) -> Self {
        let mut motion_matrix: SMatrix<f32, DIM_SORT_BOX_STATE, DIM_SORT_BOX_STATE> =
            SMatrix::identity();
        motion_matrix[(XC, VX)] = DT as f32;
        motion_matrix[(YC, VY)] = DT as f32;
        motion_matrix[(SCALE, VSCALE)] = DT as f32;

        let measurement_cov = SMatrix::from_diagonal(&SVector::from([
            noise.measurement_position,
            noise.measurement_position,
            noise.measurement_shape,
            noise.measurement_shape,
        ]));

        let process_cov = SMatrix::from_diagonal(&SVector::from([
            noise.process_position,
            noise.process_position,
            noise.process_position,
            noise.process_position,
            noise.process_velocity,
            noise.process_velocity,
            noise.process_scale_velocity,
        ]));

        let initial_cov = SMatrix::from_diagonal(&SVector::from([
            noise.initial_position,
            noise.initial_position,
            noise.initial_position,
            noise.initial_position,
            noise.initial_velocity,
            noise.initial_velocity,
            noise.initial_velocity,
        ]));

        SortBoxKalmanFilter {
            motion_matrix,
            update_matrix: SMatrix::identity(),
            measurement_cov,
            process_cov,
            initial_cov,
        }
    }

    /// Keeps the scale non-negative and the aspect ratio positive, positive aspects are kept
    /// as is
    ///
    fn constrain(mean: &mut SVector<f32, DIM_SORT_BOX_STATE>) {
        if mean[SCALE] < 0.0 {
            mean[SCALE] = 0.0;
        }
        if mean[ASPECT] <= 0.0 {
            mean[ASPECT] = MIN_ASPECT;
        }
    }

    /// Initialize the filter with the first observation, velocities are zero
    ///
    pub fn initiate(&self, bbox: &ScaleAspectBox) -> KalmanState<DIM_SORT_BOX_STATE> {
        let mut mean: SVector<f32, DIM_SORT_BOX_STATE> = SVector::from([
            bbox.xc,
            bbox.yc,
            bbox.scale,
            bbox.aspect,
            0.0,
            0.0,
            0.0,
        ]);
        Self::constrain(&mut mean);

        KalmanState {
            mean,
            covariance: self.initial_cov,
        }
    }

    /// Predicts the state one step ahead
    ///
    pub fn predict(
        &self,
        state: &KalmanState<DIM_SORT_BOX_STATE>,
    ) -> KalmanState<DIM_SORT_BOX_STATE> {
        let mut mean = state.mean;
        // the area can't shrink below zero
        if mean[SCALE] + mean[VSCALE] <= 0.0 {
            mean[VSCALE] = 0.0;
        }

        let mut mean = self.motion_matrix * mean;
        Self::constrain(&mut mean);

        let covariance =
            self.motion_matrix * state.covariance * self.motion_matrix.transpose() + self.process_cov;
        KalmanState { mean, covariance }
    }

    fn project(
        &self,
        state: &KalmanState<DIM_SORT_BOX_STATE>,
    ) -> KalmanState<DIM_SORT_BOX> {
        let mean = self.update_matrix * state.mean;
        let covariance = self.update_matrix * state.covariance * self.update_matrix.transpose()
            + self.measurement_cov;
        KalmanState { mean, covariance }
    }

    /// Corrects the state with the observation.
    ///
    /// Returns `None` when the innovation covariance is not positive definite.
    ///
    pub fn update(
        &self,
        state: &KalmanState<DIM_SORT_BOX_STATE>,
        measurement: &ScaleAspectBox,
    ) -> Option<KalmanState<DIM_SORT_BOX_STATE>> {
        let projected = self.project(state);
        let cholesky = projected.covariance.cholesky()?;

        // K^T = S^-1 * H * P, both S and P are symmetric
        let kalman_gain = cholesky
            .solve(&(self.update_matrix * state.covariance))
            .transpose();

        let innovation = SVector::from([
            measurement.xc,
            measurement.yc,
            measurement.scale,
            measurement.aspect,
        ]) - projected.mean;

        let mut mean = state.mean + kalman_gain * innovation;
        Self::constrain(&mut mean);

        let identity: SMatrix<f32, DIM_SORT_BOX_STATE, DIM_SORT_BOX_STATE> = SMatrix::identity();
        let covariance = (identity - kalman_gain * self.update_matrix) * state.covariance;
        let covariance = (covariance + covariance.transpose()) * 0.5;

        Some(KalmanState { mean, covariance })
    }

    /// Measurement-space view of the state
    ///
    pub fn measurement(state: &KalmanState<DIM_SORT_BOX_STATE>) -> ScaleAspectBox {
        ScaleAspectBox::new(
            state.mean[XC],
            state.mean[YC],
            state.mean[SCALE],
            state.mean[ASPECT],
        )
    }

    /// Velocity components `(vx, vy, vscale)`
    ///
    pub fn velocity(state: &KalmanState<DIM_SORT_BOX_STATE>) -> (f32, f32, f32) {
        (state.mean[VX], state.mean[VY], state.mean[VSCALE])
    }
}
