use crate::trackers::sort::track::Track;
use crate::trackers::sort::{Detection, SortOptions, SortTrack, TrackState, WastedSortTrack};
use crate::utils::kalman::kalman_sort_box::SortBoxKalmanFilter;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::Arc;

/// Owner of all live tracks. Nothing else inserts or removes tracks, the identities are
/// issued here as well.
///
pub struct TrackStore {
    tracks: Vec<Track>,
    wasted: Vec<WastedSortTrack>,
    track_id: u64,
    filter: Arc<SortBoxKalmanFilter>,
    opts: Arc<SortOptions>,
}

impl TrackStore {
    pub fn new(opts: Arc<SortOptions>) -> Self {
        Self {
            tracks: Vec::default(),
            wasted: Vec::default(),
            track_id: 0,
            filter: Arc::new(SortBoxKalmanFilter::new(opts.kalman_noise)),
            opts,
        }
    }

    fn gen_track_id(&mut self) -> u64 {
        self.track_id += 1;
        self.track_id
    }

    /// Live tracks ordered by identity
    ///
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The last identity issued, `0` when no track has been created yet
    ///
    pub fn last_track_id(&self) -> u64 {
        self.track_id
    }

    /// Predicts every live track for the frame.
    ///
    /// Returns the store indices of the tracks that take part in matching. Tracks whose
    /// estimator can't produce a valid prediction are left out; they are removed by the
    /// following [`TrackStore::reconcile`].
    ///
    pub fn predict(&mut self, frame: usize) -> Vec<usize> {
        let results = self
            .tracks
            .par_iter_mut()
            .map(|t| t.predict(frame))
            .collect::<Vec<_>>();

        results
            .into_iter()
            .enumerate()
            .filter_map(|(i, res)| match res {
                Ok(()) => Some(i),
                Err(e) => {
                    let track = &self.tracks[i];
                    warn!("Track {} is excluded from matching: {}", track.id(), e);
                    debug!("{}", track.estimator().state().dump());
                    None
                }
            })
            .collect()
    }

    /// Applies the frame assignment to the track set and returns the frame output.
    ///
    /// # Parameters
    /// * `frame` - current frame
    /// * `matches` - pairs of (store index, detection index)
    /// * `detections` - valid detections of the frame
    ///
    /// Steps, in order: matched tracks are updated, unmatched tracks are aged, unmatched
    /// detections spawn tentative tracks, expired tracks are moved to the wasted store.
    ///
    pub fn reconcile(
        &mut self,
        frame: usize,
        matches: &[(usize, usize)],
        detections: &[Detection],
    ) -> Vec<SortTrack> {
        let mut track_matched = vec![false; self.tracks.len()];
        let mut detection_taken = vec![false; detections.len()];

        for &(track_idx, det_idx) in matches {
            let (Some(track), Some(detection)) =
                (self.tracks.get_mut(track_idx), detections.get(det_idx))
            else {
                warn!(
                    "Assignment ({}, {}) is out of range, ignored",
                    track_idx, det_idx
                );
                continue;
            };
            if track_matched[track_idx] || detection_taken[det_idx] {
                warn!(
                    "Assignment ({}, {}) reuses a track or a detection, ignored",
                    track_idx, det_idx
                );
                continue;
            }

            match track.apply_match(frame, &detection.bbox, self.opts.confirmation_hits) {
                Ok(()) => {
                    track_matched[track_idx] = true;
                    detection_taken[det_idx] = true;
                }
                Err(e) => {
                    warn!(
                        "Track {} failed to accept detection {}: {}",
                        track.id(),
                        det_idx,
                        e
                    );
                }
            }
        }

        for (track, matched) in self.tracks.iter_mut().zip(track_matched) {
            if !matched {
                track.mark_missed();
            }
        }

        for (detection, taken) in detections.iter().zip(detection_taken) {
            if !taken {
                let track_id = self.gen_track_id();
                info!("New track {} at frame {}: {:?}", track_id, frame, detection.bbox);
                self.tracks.push(Track::new(
                    track_id,
                    frame,
                    &detection.bbox,
                    self.filter.clone(),
                    self.opts.history_length,
                ));
            }
        }

        let max_disappeared = self.opts.max_disappeared;
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tracks)
            .into_iter()
            .partition(|t| t.is_expired(max_disappeared));
        self.tracks = live;

        for track in expired {
            let wasted = track.into_wasted(frame);
            info!(
                "Track {} is lost at frame {} ({:?}), last updated at frame {}",
                wasted.id, frame, wasted.reason, wasted.last_updated_frame
            );
            self.wasted.push(wasted);
        }

        self.tracks
            .iter()
            .filter(|t| self.opts.emit_tentative || t.state() == TrackState::Confirmed)
            .map(|t| t.to_sort_track(frame))
            .collect()
    }

    /// Live tracks which were not updated in the frame
    ///
    pub fn idle_tracks(&self, frame: usize) -> Vec<SortTrack> {
        self.tracks
            .iter()
            .filter(|t| t.last_updated_frame() < frame)
            .map(|t| t.to_sort_track(frame))
            .collect()
    }

    /// Removes and returns the tracks deleted so far
    ///
    pub fn wasted(&mut self) -> Vec<WastedSortTrack> {
        std::mem::take(&mut self.wasted)
    }
}
