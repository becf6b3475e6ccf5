use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    gesture::{self, GestureLabel, GestureReading},
    landmarks::{BoundingBox, DetectionFrame, HandSide, Landmark},
    TrackerConfig,
};

/// Debounced state for one gesture label inside one hand slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureTrack {
    pub label: Option<GestureLabel>,
    pub intensity: f32,
    /// How consistently this label has been reported, in [0,1].
    pub confidence: f32,
    pub last_seen_ms: f64,
    pub consecutive_frames: u32,
}

impl GestureTrack {
    fn is_empty(&self) -> bool {
        self.label.is_none()
    }

    /// Clears everything except the last-seen time, making the track
    /// eligible for reclamation.
    fn expire(&mut self) {
        self.label = None;
        self.intensity = 0.0;
        self.confidence = 0.0;
        self.consecutive_frames = 0;
    }
}

/// Per-slot temporal state machine over successive classifier outputs.
///
/// Each observed label gets its own track. The track matching this tick's
/// reading gains confidence with consecutive frames; every other track
/// softly decays so a gesture flickering out for a frame or two is bridged
/// rather than reset. Tracks unseen past the timeout are cleared outright.
#[derive(Debug, Clone, Default)]
pub struct SlotTracker {
    tracks: Vec<GestureTrack>,
}

impl SlotTracker {
    /// Folds one classification into the slot and returns the current best
    /// track (highest confidence, first seen wins ties).
    pub fn observe(
        &mut self,
        reading: GestureReading,
        now_ms: f64,
        config: &TrackerConfig,
    ) -> GestureTrack {
        let updated = match reading.label {
            Some(label) if reading.intensity > config.min_activation => {
                Some(self.reinforce(label, reading.intensity, now_ms, config))
            }
            _ => None,
        };

        for (index, track) in self.tracks.iter_mut().enumerate() {
            if updated != Some(index) {
                decay_track(
                    track,
                    now_ms,
                    config,
                    config.idle_confidence_decay,
                    config.idle_intensity_decay,
                );
            }
        }
        self.tracks.retain(|track| !track.is_empty());

        self.best()
    }

    /// Steeper decay applied when the slot's hand is not present at all.
    pub fn decay_absent(&mut self, now_ms: f64, config: &TrackerConfig) {
        for track in &mut self.tracks {
            decay_track(
                track,
                now_ms,
                config,
                config.absent_confidence_decay,
                config.absent_intensity_decay,
            );
        }
        self.tracks.retain(|track| !track.is_empty());
    }

    /// The most confident track, or an empty one when nothing is tracked.
    pub fn best(&self) -> GestureTrack {
        let mut best: Option<&GestureTrack> = None;
        for track in &self.tracks {
            if best.map_or(true, |current| track.confidence > current.confidence) {
                best = Some(track);
            }
        }
        best.cloned().unwrap_or_default()
    }

    fn reinforce(
        &mut self,
        label: GestureLabel,
        intensity: f32,
        now_ms: f64,
        config: &TrackerConfig,
    ) -> usize {
        match self
            .tracks
            .iter()
            .position(|track| track.label == Some(label))
        {
            Some(index) => {
                let track = &mut self.tracks[index];
                track.consecutive_frames += 1;
                track.last_seen_ms = now_ms;
                track.intensity = track.intensity * config.intensity_smoothing
                    + intensity * (1.0 - config.intensity_smoothing);
                track.confidence = (track.consecutive_frames as f32
                    / config.required_frames.max(1) as f32)
                    .min(1.0);
                index
            }
            None => {
                self.tracks.push(GestureTrack {
                    label: Some(label),
                    intensity,
                    confidence: 0.0,
                    last_seen_ms: now_ms,
                    consecutive_frames: 1,
                });
                self.tracks.len() - 1
            }
        }
    }
}

fn decay_track(
    track: &mut GestureTrack,
    now_ms: f64,
    config: &TrackerConfig,
    confidence_decay: f32,
    intensity_decay: f32,
) {
    if now_ms - track.last_seen_ms > config.timeout_ms {
        track.expire();
    } else {
        track.confidence *= confidence_decay;
        track.intensity *= intensity_decay;
        track.consecutive_frames = track.consecutive_frames.saturating_sub(1);
    }
}

/// One hand in the outgoing per-frame summary. The label is only populated
/// once the slot's tracker clears the confidence gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandSummary {
    pub slot: usize,
    pub landmarks: Vec<Landmark>,
    pub center: Landmark,
    pub side: Option<HandSide>,
    pub label: Option<GestureLabel>,
    pub intensity: f32,
}

/// One face in the outgoing per-frame summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSummary {
    pub landmarks: Vec<Landmark>,
    pub bounding_box: BoundingBox,
    pub center: Landmark,
}

/// Everything published to the renderer for one processed camera frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureUpdate {
    pub hands: Vec<HandSummary>,
    pub faces: Vec<FaceSummary>,
    pub timestamp_ms: f64,
}

/// Tracks every hand slot across frames.
///
/// Slots are keyed by position in the detector output; those indices are
/// only best-effort stable, so per-slot state is disposable. A slot whose
/// hand vanished keeps its (decaying) tracker rather than being removed, so
/// a reappearing index reuses the entry cleanly.
#[derive(Debug)]
pub struct GestureSession {
    config: TrackerConfig,
    slots: HashMap<usize, SlotTracker>,
}

impl GestureSession {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            slots: HashMap::new(),
        }
    }

    /// Runs one detection frame through the per-slot trackers and builds
    /// the outgoing summary. Slots absent from this frame take the steeper
    /// decay path.
    pub fn process(&mut self, frame: &DetectionFrame) -> GestureUpdate {
        let now_ms = frame.timestamp_ms;
        let mut hands = Vec::with_capacity(frame.hands.len());

        for (slot, detection) in frame.hands.iter().enumerate() {
            let reading = gesture::classify(&detection.landmarks);
            let tracker = self.slots.entry(slot).or_default();
            let best = tracker.observe(reading, now_ms, &self.config);

            let (label, intensity) = if best.confidence >= self.config.confidence_gate {
                (best.label, best.intensity)
            } else {
                (None, 0.0)
            };

            hands.push(HandSummary {
                slot,
                landmarks: detection.landmarks.clone(),
                center: detection.center(),
                side: detection.side,
                label,
                intensity,
            });
        }

        for (&slot, tracker) in &mut self.slots {
            if slot >= frame.hands.len() {
                tracker.decay_absent(now_ms, &self.config);
            }
        }

        let faces = frame
            .faces
            .iter()
            .map(|face| FaceSummary {
                landmarks: face.landmarks.clone(),
                bounding_box: face.bounding_box(),
                center: face.center(),
            })
            .collect();

        GestureUpdate {
            hands,
            faces,
            timestamp_ms: now_ms,
        }
    }

    /// Current best track for a slot, mainly for diagnostics.
    pub fn slot_state(&self, slot: usize) -> Option<GestureTrack> {
        self.slots.get(&slot).map(SlotTracker::best)
    }

    /// Drops all per-slot state. Called on disable.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::fixtures;
    use crate::landmarks::{FaceDetection, HandDetection};

    const FRAME_MS: f64 = 33.0;

    fn config() -> TrackerConfig {
        TrackerConfig::default()
    }

    fn reading(label: GestureLabel, intensity: f32) -> GestureReading {
        GestureReading {
            label: Some(label),
            intensity,
        }
    }

    #[test]
    fn confidence_ramps_to_one_over_required_frames() {
        let config = config();
        let mut tracker = SlotTracker::default();

        let mut best = GestureTrack::default();
        for frame in 0..config.required_frames {
            best = tracker.observe(
                reading(GestureLabel::ThumbUp, 0.8),
                frame as f64 * FRAME_MS,
                &config,
            );
        }
        assert_eq!(best.label, Some(GestureLabel::ThumbUp));
        assert_eq!(best.confidence, 1.0);
    }

    #[test]
    fn single_sighting_times_out_and_clears() {
        let config = config();
        let mut tracker = SlotTracker::default();
        tracker.observe(reading(GestureLabel::Victory, 0.9), 0.0, &config);

        let best = tracker.observe(GestureReading::default(), 250.0, &config);
        assert_eq!(best.label, None);
        assert_eq!(best.confidence, 0.0);
    }

    #[test]
    fn brief_flicker_is_bridged_not_reset() {
        let config = config();
        let mut tracker = SlotTracker::default();

        let mut now = 0.0;
        for _ in 0..3 {
            tracker.observe(reading(GestureLabel::ThumbUp, 0.8), now, &config);
            now += FRAME_MS;
        }
        // One missed frame inside the timeout window.
        tracker.observe(GestureReading::default(), now, &config);
        now += FRAME_MS;

        let best = tracker.observe(reading(GestureLabel::ThumbUp, 0.8), now, &config);
        assert_eq!(best.label, Some(GestureLabel::ThumbUp));
        assert!(best.confidence > 0.5, "flicker should not restart the ramp");
    }

    #[test]
    fn weak_detections_are_ignored() {
        let config = config();
        let mut tracker = SlotTracker::default();
        let best = tracker.observe(reading(GestureLabel::Victory, 0.05), 0.0, &config);
        assert_eq!(best.label, None);
    }

    #[test]
    fn competing_labels_resolve_to_the_most_consistent() {
        let config = config();
        let mut tracker = SlotTracker::default();

        let mut now = 0.0;
        for _ in 0..4 {
            tracker.observe(reading(GestureLabel::Victory, 0.9), now, &config);
            now += FRAME_MS;
        }
        // A single misclassification as love sign must not win.
        let best = tracker.observe(reading(GestureLabel::LoveSign, 0.9), now, &config);
        assert_eq!(best.label, Some(GestureLabel::Victory));
    }

    #[test]
    fn absent_hand_decays_faster_than_idle() {
        let config = config();
        let mut idle = SlotTracker::default();
        let mut absent = SlotTracker::default();

        for tracker in [&mut idle, &mut absent] {
            for frame in 0..3 {
                tracker.observe(
                    reading(GestureLabel::ThumbUp, 0.8),
                    frame as f64 * FRAME_MS,
                    &config,
                );
            }
        }

        let now = 3.0 * FRAME_MS;
        idle.observe(GestureReading::default(), now, &config);
        absent.decay_absent(now, &config);
        assert!(absent.best().confidence < idle.best().confidence);
    }

    #[test]
    fn session_gates_low_confidence_gestures() {
        let mut session = GestureSession::new(config());
        let hand = HandDetection::new(fixtures::thumbs_up_hand());

        // First frame: tracked but not yet confident enough to report.
        let update = session.process(&DetectionFrame {
            hands: vec![hand.clone()],
            faces: Vec::new(),
            timestamp_ms: 0.0,
        });
        assert_eq!(update.hands[0].label, None);

        // By the third consecutive frame the gate opens.
        let mut last = update;
        for frame in 1..3 {
            last = session.process(&DetectionFrame {
                hands: vec![hand.clone()],
                faces: Vec::new(),
                timestamp_ms: frame as f64 * FRAME_MS,
            });
        }
        assert_eq!(last.hands[0].label, Some(GestureLabel::ThumbUp));
        assert!(last.hands[0].intensity > 0.0);
    }

    #[test]
    fn vanished_slot_decays_without_touching_others() {
        let mut session = GestureSession::new(config());
        let hand = HandDetection::new(fixtures::thumbs_up_hand());

        let mut now = 0.0;
        for _ in 0..4 {
            session.process(&DetectionFrame {
                hands: vec![hand.clone(), hand.clone()],
                faces: Vec::new(),
                timestamp_ms: now,
            });
            now += FRAME_MS;
        }
        assert_eq!(session.slot_state(1).unwrap().confidence, 1.0);

        // Slot 1 disappears for longer than the timeout.
        for _ in 0..10 {
            session.process(&DetectionFrame {
                hands: vec![hand.clone()],
                faces: Vec::new(),
                timestamp_ms: now,
            });
            now += FRAME_MS;
        }

        let gone = session.slot_state(1).unwrap();
        assert_eq!(gone.label, None);
        assert_eq!(gone.confidence, 0.0);
        assert_eq!(session.slot_state(0).unwrap().confidence, 1.0);
    }

    #[test]
    fn faces_are_summarized_with_bounds() {
        let mut session = GestureSession::new(config());
        let update = session.process(&DetectionFrame {
            hands: Vec::new(),
            faces: vec![FaceDetection::new(vec![
                Landmark::new(0.3, 0.3),
                Landmark::new(0.5, 0.6),
            ])],
            timestamp_ms: 0.0,
        });
        assert_eq!(update.faces.len(), 1);
        assert!((update.faces[0].center.x - 0.4).abs() < 1e-6);
    }
}
