//! Online multi-object tracker in the SORT family.
//!
//! Every frame the tracker predicts all live tracks with a 7-dimensional constant-velocity
//! Kalman filter, gates track/detection pairs with age- and speed-adaptive IoU and
//! centroid-distance thresholds, solves the assignment optimally with Kuhn-Munkres and
//! reconciles the track set (update, spawn, age, retire).
//!
//! ```
//! use steadytrack::prelude::*;
//!
//! let mut tracker = GatedSort::new(SortOptions::default()).unwrap();
//! let tracks = tracker.predict(&[Detection::new(BoundingBox::new(10.0, 10.0, 50.0, 50.0), 0.9)]);
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(tracks[0].id, 1);
//! ```

use thiserror::Error;

/// Synthetic data generators used by tests and the demo
pub mod examples;

/// Shortcuts for the most frequently used types
pub mod prelude;

/// Tracker implementations
pub mod trackers;

/// Geometry, Kalman filter and assignment primitives
pub mod utils;

/// Errors raised by the crate.
///
/// Apart from [`Errors::InvalidConfiguration`] none of them is fatal for a tracking session:
/// the tracker reports and skips the offending detection or track and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Malformed detection (x_min={0}, y_min={1}, x_max={2}, y_max={3}, confidence={4}).")]
    MalformedDetection(f32, f32, f32, f32, f32),
    #[error("Estimator of the track {0} reached a numerically invalid state: {1}.")]
    DegenerateEstimatorState(u64, String),
    #[error("Track {0} is already predicted for the frame {1}.")]
    DoublePrediction(u64, usize),
    #[error("Track {0} can't be updated for the frame {1} before it is predicted.")]
    UpdateWithoutPrediction(u64, usize),
    #[error("Track {0} is already updated for the frame {1}.")]
    DoubleUpdate(u64, usize),
    #[error("Invalid tracker configuration: {0}.")]
    InvalidConfiguration(String),
}

pub(crate) const EPS: f32 = 0.00001;

/// Approximate comparison for float-based structures
pub trait EstimateClose {
    fn almost_same(&self, other: &Self, eps: f32) -> bool;
}
