use crate::trackers::sort::metric::SortCosts;
use crate::utils::linear_sum_assignment::{AssignmentSolver, KuhnMunkresSolver};
use log::debug;

/// Result of the frame assignment, all values are row (track) and column (detection) indices
/// of the cost matrix
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Decides which detection belongs to which track
///
pub struct SortVoting {
    solver: Box<dyn AssignmentSolver>,
}

impl Default for SortVoting {
    fn default() -> Self {
        Self::new(Box::new(KuhnMunkresSolver))
    }
}

impl SortVoting {
    pub fn new(solver: Box<dyn AssignmentSolver>) -> Self {
        Self { solver }
    }

    pub fn winners(&self, costs: &SortCosts) -> Assignment {
        let (rows, columns) = costs.costs.shape();

        let mut track_matched = vec![false; rows];
        let mut detection_matched = vec![false; columns];

        // the first pair wins when a solver reuses a row or a column
        let matches = self
            .solver
            .solve(&costs.costs)
            .into_iter()
            .filter(|&(r, c)| {
                if r >= rows || c >= columns || !costs.is_eligible(r, c) {
                    return false;
                }
                if track_matched[r] || detection_matched[c] {
                    return false;
                }
                track_matched[r] = true;
                detection_matched[c] = true;
                true
            })
            .collect::<Vec<_>>();

        let assignment = Assignment {
            matches,
            unmatched_tracks: (0..rows).filter(|r| !track_matched[*r]).collect(),
            unmatched_detections: (0..columns).filter(|c| !detection_matched[*c]).collect(),
        };

        debug!(
            "Assignment {}x{}: {} matches, {} unmatched tracks, {} unmatched detections",
            rows,
            columns,
            assignment.matches.len(),
            assignment.unmatched_tracks.len(),
            assignment.unmatched_detections.len()
        );

        assignment
    }
}
