use crate::trackers::sort::gate::{adaptive_gate, Gate};
use crate::trackers::sort::track::Track;
use crate::trackers::sort::{Detection, SortOptions};
use crate::utils::bbox::BoundingBox;
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Geometric relation between the track prediction and a detection
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMetric {
    pub iou: f32,
    pub distance: f32,
}

impl PairMetric {
    pub fn calculate(track_box: &BoundingBox, detection_box: &BoundingBox) -> Self {
        Self {
            iou: BoundingBox::iou(track_box, detection_box),
            distance: BoundingBox::center_distance(track_box, detection_box),
        }
    }

    /// Eligible pairs cost `-IoU`, the rest are forbidden with `f32::INFINITY`
    ///
    pub fn cost(&self, gate: &Gate) -> f32 {
        if gate.admits(self.iou, self.distance) {
            -self.iou
        } else {
            f32::INFINITY
        }
    }
}

/// Tracks x detections cost matrix together with the gates used to build it
///
#[derive(Debug, Clone)]
pub struct SortCosts {
    pub costs: DMatrix<f32>,
    /// gate of the track in the same row
    pub gates: Vec<Gate>,
}

impl SortCosts {
    pub fn is_eligible(&self, row: usize, col: usize) -> bool {
        self.costs[(row, col)].is_finite()
    }
}

/// Builds the cost matrix for the predicted tracks and the frame detections.
///
/// Rows are computed in parallel; the tracks are only read.
///
pub fn build_costs(tracks: &[&Track], detections: &[Detection], opts: &SortOptions) -> SortCosts {
    let rows = tracks
        .par_iter()
        .map(|track| {
            let gate = adaptive_gate(
                track.age(),
                track.estimator().speed(),
                opts.iou_threshold,
                opts.dist_threshold,
                opts.young_track_age_threshold,
            );
            let track_box = track.current_box();
            let row = detections
                .iter()
                .map(|d| PairMetric::calculate(&track_box, &d.bbox).cost(&gate))
                .collect::<Vec<_>>();
            (gate, row)
        })
        .collect::<Vec<_>>();

    let costs = DMatrix::from_fn(tracks.len(), detections.len(), |r, c| rows[r].1[c]);
    let gates = rows.into_iter().map(|(gate, _)| gate).collect();

    SortCosts { costs, gates }
}
