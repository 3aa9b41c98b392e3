pub use crate::trackers::sort::simple_api::GatedSort;
pub use crate::trackers::sort::{
    Detection, KalmanNoise, SortOptions, SortTrack, TrackState, WastedSortTrack,
};
pub use crate::utils::bbox::{BoundingBox, ScaleAspectBox};
pub use crate::EstimateClose;
