/// Bounding boxes
pub mod bbox;

/// Kalman filter
pub mod kalman;

/// Optimal assignment of tracks to detections
pub mod linear_sum_assignment;
