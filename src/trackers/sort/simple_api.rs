use crate::trackers::sort::metric::build_costs;
use crate::trackers::sort::store::TrackStore;
use crate::trackers::sort::voting::SortVoting;
use crate::trackers::sort::{Detection, SortOptions, SortTrack, WastedSortTrack};
use crate::utils::linear_sum_assignment::{AssignmentSolver, KuhnMunkresSolver};
use crate::Errors;
use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;

/// Easy to use SORT tracker with age- and speed-adaptive IoU + distance gating
///
pub struct GatedSort {
    store: TrackStore,
    voting: SortVoting,
    opts: Arc<SortOptions>,
    frame: usize,
    rejected: Vec<(usize, Errors)>,
}

impl GatedSort {
    /// Creates new tracker with the optimal Kuhn-Munkres assignment
    ///
    /// # Parameters
    /// * `opts` - tracker options, validated here; invalid options are the only fatal error
    ///
    pub fn new(opts: SortOptions) -> Result<Self> {
        Self::with_solver(opts, Box::new(KuhnMunkresSolver))
    }

    /// Creates new tracker with a custom assignment solver
    ///
    pub fn with_solver(opts: SortOptions, solver: Box<dyn AssignmentSolver>) -> Result<Self> {
        opts.validate()?;
        let opts = Arc::new(opts);
        Ok(Self {
            store: TrackStore::new(opts.clone()),
            voting: SortVoting::new(solver),
            opts,
            frame: 0,
            rejected: Vec::default(),
        })
    }

    pub fn options(&self) -> &SortOptions {
        &self.opts
    }

    /// The last processed frame, `0` before the first call to [`GatedSort::predict`]
    ///
    pub fn current_frame(&self) -> usize {
        self.frame
    }

    /// Processes the detections of the next frame and returns the live tracks
    ///
    /// # Parameters
    /// * `detections` - boxes received from a detector; malformed ones are skipped and
    ///   reported by [`GatedSort::rejected`]
    ///
    pub fn predict(&mut self, detections: &[Detection]) -> Vec<SortTrack> {
        self.frame += 1;
        let frame = self.frame;

        self.rejected.clear();
        let mut valid = Vec::with_capacity(detections.len());
        for (i, d) in detections.iter().enumerate() {
            match d.validate() {
                Ok(()) => valid.push(*d),
                Err(e) => {
                    warn!("Frame {}: detection {} is rejected: {}", frame, i, e);
                    self.rejected.push((i, e));
                }
            }
        }

        let matchable = self.store.predict(frame);
        let tracks = matchable
            .iter()
            .map(|&i| &self.store.tracks()[i])
            .collect::<Vec<_>>();
        let costs = build_costs(&tracks, &valid, &self.opts);
        let assignment = self.voting.winners(&costs);

        let matches = assignment
            .matches
            .iter()
            .map(|&(r, c)| (matchable[r], c))
            .collect::<Vec<_>>();

        let res = self.store.reconcile(frame, &matches, &valid);
        debug!(
            "Frame {}: {} detections, {} matches, {} live tracks",
            frame,
            valid.len(),
            matches.len(),
            self.store.len()
        );
        res
    }

    /// Feeds `n` frames without detections
    ///
    pub fn skip_frames(&mut self, n: usize) {
        for _ in 0..n {
            self.predict(&[]);
        }
    }

    /// Detections rejected in the last frame with their positions in the input
    ///
    pub fn rejected(&self) -> &[(usize, Errors)] {
        &self.rejected
    }

    /// Live tracks not updated in the last frame
    ///
    pub fn idle_tracks(&self) -> Vec<SortTrack> {
        self.store.idle_tracks(self.frame)
    }

    /// Removes and returns the tracks deleted so far
    ///
    pub fn wasted(&mut self) -> Vec<WastedSortTrack> {
        self.store.wasted()
    }

    /// Number of live tracks, including the ones not emitted
    ///
    pub fn active_tracks(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::examples::BoxGen2;
    use crate::trackers::sort::metric::{build_costs, PairMetric};
    use crate::trackers::sort::simple_api::GatedSort;
    use crate::trackers::sort::track::Track;
    use crate::trackers::sort::voting::SortVoting;
    use crate::trackers::sort::{Detection, SortOptions, TrackState};
    use crate::utils::bbox::BoundingBox;
    use crate::utils::kalman::kalman_sort_box::SortBoxKalmanFilter;
    use crate::Errors;
    use rand::Rng;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn det(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Detection {
        Detection::new(BoundingBox::new(x_min, y_min, x_max, y_max), 0.9)
    }

    #[test]
    fn invalid_options_are_fatal() {
        assert!(GatedSort::new(SortOptions::default().max_disappeared(0)).is_err());
        assert!(GatedSort::new(SortOptions::default().dist_threshold(0.0)).is_err());
    }

    #[test]
    fn close_detection_keeps_identity() {
        let mut t = GatedSort::new(SortOptions::default()).unwrap();
        assert_eq!(t.current_frame(), 0);

        let v = t.predict(&[det(10.0, 10.0, 50.0, 50.0)]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].id, 1);
        assert_eq!(v[0].frame, 1);
        assert_eq!(v[0].state, TrackState::Tentative);

        let observed = det(12.0, 11.0, 52.0, 49.0);
        let v = t.predict(&[observed]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].id, 1);
        assert_eq!(v[0].time_since_update, 0);
        assert_eq!(v[0].observed_bbox, observed.bbox);
        assert_eq!(v[0].state, TrackState::Confirmed);
        assert_eq!(t.current_frame(), 2);
        assert!(t.wasted().is_empty());
    }

    #[test]
    fn track_expires_after_max_disappeared() {
        let mut t = GatedSort::new(SortOptions::default().max_disappeared(30)).unwrap();
        t.predict(&[det(10.0, 10.0, 50.0, 50.0)]);

        for miss in 1..=30 {
            let v = t.predict(&[]);
            assert_eq!(v.len(), 1, "miss {}", miss);
            assert_eq!(v[0].time_since_update, miss);
        }
        let v = t.predict(&[]);
        assert!(v.is_empty());
        assert_eq!(t.active_tracks(), 0);

        let wasted = t.wasted();
        assert_eq!(wasted.len(), 1);
        assert_eq!(wasted[0].id, 1);
        assert_eq!(wasted[0].frame, 32);
        assert_eq!(wasted[0].last_updated_frame, 1);
    }

    #[test]
    fn best_detection_wins_the_track() {
        let mut t = GatedSort::new(SortOptions::default()).unwrap();
        t.predict(&[det(10.0, 10.0, 50.0, 50.0)]);

        let far_one = det(14.0, 10.0, 54.0, 50.0);
        let close_one = det(12.0, 11.0, 52.0, 49.0);
        let v = t.predict(&[far_one, close_one]);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].id, 1);
        assert_eq!(v[0].observed_bbox, close_one.bbox);
        assert_eq!(v[1].id, 2);
        assert_eq!(v[1].observed_bbox, far_one.bbox);
        assert_eq!(v[1].state, TrackState::Tentative);
    }

    #[test]
    fn malformed_detections_are_skipped() {
        let mut t = GatedSort::new(SortOptions::default()).unwrap();
        let v = t.predict(&[
            det(10.0, 10.0, 10.0, 50.0),
            det(10.0, 10.0, 50.0, 50.0),
            Detection::new(BoundingBox::new(100.0, 100.0, 150.0, 150.0), 1.5),
        ]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].id, 1);

        let rejected = t.rejected();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].0, 0);
        assert!(matches!(rejected[0].1, Errors::MalformedDetection(..)));
        assert_eq!(rejected[1].0, 2);

        t.predict(&[]);
        assert!(t.rejected().is_empty());
    }

    #[test]
    fn skip_and_idle() {
        let mut t = GatedSort::new(SortOptions::default()).unwrap();
        t.predict(&[det(10.0, 10.0, 50.0, 50.0), det(100.0, 10.0, 140.0, 50.0)]);
        assert!(t.idle_tracks().is_empty());

        t.skip_frames(3);
        assert_eq!(t.current_frame(), 4);
        assert_eq!(t.idle_tracks().len(), 2);

        t.predict(&[det(10.0, 10.0, 50.0, 50.0)]);
        let idle = t.idle_tracks();
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].id, 2);
        assert_eq!(idle[0].time_since_update, 4);
    }

    #[test]
    fn hidden_tentative_tracks() {
        let mut t = GatedSort::new(
            SortOptions::default()
                .emit_tentative(false)
                .confirmation_hits(2),
        )
        .unwrap();
        assert!(t.predict(&[det(10.0, 10.0, 50.0, 50.0)]).is_empty());
        assert!(t.predict(&[det(11.0, 10.0, 51.0, 50.0)]).is_empty());
        let v = t.predict(&[det(12.0, 10.0, 52.0, 50.0)]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].id, 1);
        assert_eq!(v[0].hits, 2);
    }

    #[test]
    fn moving_objects() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut t = GatedSort::new(SortOptions::default().history_length(5)).unwrap();
        let mut first = BoxGen2::new_monotonous(10.0, 10.0, 40.0, 80.0, 2.0, 0.5);
        let mut second = BoxGen2::new_monotonous(300.0, 300.0, 40.0, 80.0, 2.0, 0.5);

        let mut issued = HashSet::new();
        for _ in 0..50 {
            let detections = [
                Detection::from(first.next().unwrap()),
                Detection::from(second.next().unwrap()),
            ];
            let v = t.predict(&detections);
            assert_eq!(v.len(), 2);
            for track in v {
                issued.insert(track.id);
            }
        }
        assert_eq!(issued, HashSet::from([1, 2]));

        // every live track is predicted exactly once per frame of its life
        for track in t.store.tracks() {
            assert_eq!(track.estimator().predictions(), track.age());
            assert_eq!(track.estimator().updates(), track.hits());
        }
    }

    #[test]
    fn identities_grow_monotonically() {
        let mut t = GatedSort::new(SortOptions::default().max_disappeared(2)).unwrap();
        let mut rng = rand::thread_rng();
        let mut last_issued = 0;
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let detections = (0..rng.gen_range(0..4))
                .map(|_| {
                    let x = rng.gen_range(0.0..500.0);
                    let y = rng.gen_range(0.0..500.0);
                    det(x, y, x + 30.0, y + 30.0)
                })
                .collect::<Vec<_>>();
            let v = t.predict(&detections);

            let ids = v.iter().map(|t| t.id).collect::<Vec<_>>();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));

            for id in ids {
                if seen.insert(id) {
                    assert!(id > last_issued);
                    last_issued = id;
                }
            }
        }
    }

    #[test]
    fn accepted_matches_respect_gates() {
        let opts = SortOptions::default().young_track_age_threshold(2);
        let filter = Arc::new(SortBoxKalmanFilter::default());
        let voting = SortVoting::default();
        let mut rng = rand::thread_rng();

        for round in 0..100 {
            let mut tracks = (0..rng.gen_range(1..6))
                .map(|i| {
                    let x = rng.gen_range(0.0..200.0);
                    let y = rng.gen_range(0.0..200.0);
                    Track::new(
                        i as u64 + 1,
                        1,
                        &BoundingBox::ltwh(x, y, 40.0, 40.0),
                        filter.clone(),
                        1,
                    )
                })
                .collect::<Vec<_>>();

            // half of the tracks get old enough for the relaxed gates
            for frame in 2..(2 + round % 4) {
                for t in tracks.iter_mut() {
                    t.predict(frame).unwrap();
                    t.mark_missed();
                }
            }
            for t in tracks.iter_mut() {
                t.predict(10).unwrap();
            }

            let detections = (0..rng.gen_range(0..6))
                .map(|_| {
                    let x = rng.gen_range(0.0..200.0);
                    let y = rng.gen_range(0.0..200.0);
                    Detection::new(BoundingBox::ltwh(x, y, 40.0, 40.0), 1.0)
                })
                .collect::<Vec<_>>();

            let refs = tracks.iter().collect::<Vec<_>>();
            let costs = build_costs(&refs, &detections, &opts);
            let assignment = voting.winners(&costs);

            let mut rows = HashSet::new();
            let mut cols = HashSet::new();
            for &(r, c) in &assignment.matches {
                assert!(rows.insert(r));
                assert!(cols.insert(c));
                let m = PairMetric::calculate(&tracks[r].current_box(), &detections[c].bbox);
                assert!(costs.gates[r].admits(m.iou, m.distance));
            }
            assert_eq!(
                assignment.matches.len() + assignment.unmatched_tracks.len(),
                tracks.len()
            );
            assert_eq!(
                assignment.matches.len() + assignment.unmatched_detections.len(),
                detections.len()
            );
        }
    }
}
