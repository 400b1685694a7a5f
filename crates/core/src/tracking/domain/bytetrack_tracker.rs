//! Simplified ByteTrack association for face identities.
//!
//! Confident detections are matched to existing tracks first; weaker ones
//! are matched only against tracks left over by the first pass. Every
//! detection still unmatched starts a new track, so no detected face goes
//! without an id. A track survives `max_lost` consecutive frames without a
//! match.

use std::collections::HashSet;

use super::landmark_detector::LandmarkDetection;
use super::math::bbox_iou;

/// Score at or above which a detection joins the first association pass.
pub const HIGH_THRESH: f64 = 0.5;

/// Minimum IoU between a track's last box and a detection to match.
pub const MATCH_THRESH: f64 = 0.3;

/// A track matched in the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackAssignment {
    pub id: u32,
    /// Index into the detections passed to [`ByteTracker::update`].
    pub det_index: usize,
}

#[derive(Clone, Debug)]
struct TrackState {
    id: u32,
    bbox: [f64; 4],
    frames_lost: usize,
    det_index: Option<usize>,
}

pub struct ByteTracker {
    tracks: Vec<TrackState>,
    next_id: u32,
    max_lost: usize,
}

impl ByteTracker {
    pub fn new(max_lost: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_lost,
        }
    }

    /// Associates this frame's detections with tracks.
    ///
    /// Returns exactly one assignment per detection, sorted by detection
    /// index.
    pub fn update(&mut self, detections: &[LandmarkDetection]) -> Vec<TrackAssignment> {
        let (high, low): (Vec<usize>, Vec<usize>) =
            (0..detections.len()).partition(|&i| detections[i].score >= HIGH_THRESH);

        for track in &mut self.tracks {
            track.det_index = None;
        }
        let num_existing = self.tracks.len();

        let mut matched = self.associate(&high, detections);
        matched.extend(self.associate(&low, detections));

        for di in 0..detections.len() {
            if !matched.contains(&di) {
                self.tracks.push(TrackState {
                    id: self.next_id,
                    bbox: detections[di].bbox,
                    frames_lost: 0,
                    det_index: Some(di),
                });
                self.next_id += 1;
            }
        }

        for track in self.tracks.iter_mut().take(num_existing) {
            if track.det_index.is_none() {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| t.frames_lost <= max_lost);

        let mut assignments: Vec<TrackAssignment> = self
            .tracks
            .iter()
            .filter_map(|t| {
                t.det_index.map(|det_index| TrackAssignment {
                    id: t.id,
                    det_index,
                })
            })
            .collect();
        assignments.sort_by_key(|a| a.det_index);
        assignments
    }

    /// Number of tracks kept, including ones currently lost.
    pub fn live_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Greedy IoU matching of `candidates` against tracks still unmatched
    /// this frame. Returns the matched detection indices.
    fn associate(
        &mut self,
        candidates: &[usize],
        detections: &[LandmarkDetection],
    ) -> HashSet<usize> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            if track.det_index.is_some() {
                continue;
            }
            for &di in candidates {
                let iou = bbox_iou(&track.bbox, &detections[di].bbox);
                if iou >= MATCH_THRESH {
                    pairs.push((ti, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut used_tracks = HashSet::new();
        let mut matched = HashSet::new();
        for (ti, di, _) in pairs {
            if used_tracks.contains(&ti) || matched.contains(&di) {
                continue;
            }
            used_tracks.insert(ti);
            matched.insert(di);
            let track = &mut self.tracks[ti];
            track.bbox = detections[di].bbox;
            track.frames_lost = 0;
            track.det_index = Some(di);
        }
        matched
    }
}
