use serde::{Deserialize, Serialize};

use crate::landmarks::{hand, Landmark, HAND_LANDMARK_COUNT};

/// Vertical offset from the thumb IP joint required before the thumb counts
/// as extended up or down.
const THUMB_MARGIN: f32 = 0.05;
/// Minimum index-to-middle tip spread for a victory sign.
const VICTORY_SPREAD: f32 = 0.05;
/// Minimum index-to-pinky tip spread for a love sign.
const LOVE_SPREAD: f32 = 0.08;

/// The discrete gesture vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureLabel {
    ThumbUp,
    ThumbDown,
    Victory,
    LoveSign,
}

/// One classification result: a label (or none) plus a continuous strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureReading {
    pub label: Option<GestureLabel>,
    pub intensity: f32,
}

impl GestureReading {
    fn none() -> Self {
        Self::default()
    }

    fn new(label: GestureLabel, intensity: f32) -> Self {
        Self {
            label: Some(label),
            intensity,
        }
    }
}

/// Rule-based, stateless classification of one hand's landmarks.
///
/// Coordinates are normalized image space with y growing downward, so a tip
/// numerically above (less than) its PIP joint means the finger is extended.
/// Rules are checked in fixed priority order; their finger preconditions do
/// not overlap, so the first match is the only match. Anything short of 21
/// landmarks reads as no gesture.
pub fn classify(landmarks: &[Landmark]) -> GestureReading {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return GestureReading::none();
    }

    let thumb_tip = landmarks[hand::THUMB_TIP];
    let thumb_ip = landmarks[hand::THUMB_IP];
    let thumb_mcp = landmarks[hand::THUMB_MCP];
    let index_tip = landmarks[hand::INDEX_TIP];
    let middle_tip = landmarks[hand::MIDDLE_TIP];
    let ring_tip = landmarks[hand::RING_TIP];
    let pinky_tip = landmarks[hand::PINKY_TIP];

    let index_extended = index_tip.y < landmarks[hand::INDEX_PIP].y;
    let middle_extended = middle_tip.y < landmarks[hand::MIDDLE_PIP].y;
    let ring_extended = ring_tip.y < landmarks[hand::RING_PIP].y;
    let pinky_extended = pinky_tip.y < landmarks[hand::PINKY_PIP].y;

    let thumb_up = thumb_tip.y < thumb_ip.y - THUMB_MARGIN;
    let thumb_down = thumb_tip.y > thumb_ip.y + THUMB_MARGIN;
    let thumb_out = thumb_tip.x > thumb_mcp.x;

    let fingers_curled = !index_extended && !middle_extended && !ring_extended && !pinky_extended;

    if thumb_up && fingers_curled {
        let height = thumb_ip.y - thumb_tip.y;
        return GestureReading::new(GestureLabel::ThumbUp, (height * 5.0).clamp(0.5, 1.0));
    }

    if thumb_down && fingers_curled {
        let depth = thumb_tip.y - thumb_ip.y;
        return GestureReading::new(GestureLabel::ThumbDown, (depth * 5.0).clamp(0.5, 1.0));
    }

    if index_extended && middle_extended && !ring_extended && !pinky_extended {
        let spread = index_tip.distance_to(&middle_tip);
        if spread > VICTORY_SPREAD {
            return GestureReading::new(GestureLabel::Victory, (spread * 8.0).clamp(0.6, 1.0));
        }
    }

    if index_extended && !middle_extended && !ring_extended && pinky_extended && thumb_out {
        let spread = index_tip.distance_to(&pinky_tip);
        if spread > LOVE_SPREAD {
            return GestureReading::new(GestureLabel::LoveSign, (spread * 5.0).clamp(0.6, 1.0));
        }
    }

    GestureReading::none()
}
