use serde::{Deserialize, Serialize};

/// Landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;
/// Landmarks per detected face.
pub const FACE_LANDMARK_COUNT: usize = 468;

/// Well-known hand landmark indices, matching the external detector's
/// ordering (wrist first, then four joints per digit).
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

/// One keypoint in normalized image space: x and y in [0,1] with y growing
/// downward, z an optional relative depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance to another landmark, ignoring depth.
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Which physical hand the detector believes a detection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    Left,
    Right,
}

/// One hand as reported by the external landmark detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub landmarks: Vec<Landmark>,
    pub side: Option<HandSide>,
}

impl HandDetection {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            side: None,
        }
    }

    /// Anchor point for the hand: the wrist landmark.
    pub fn center(&self) -> Landmark {
        self.landmarks
            .first()
            .copied()
            .unwrap_or_default()
    }
}

/// Axis-aligned box in normalized image space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One face as reported by the external landmark detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub landmarks: Vec<Landmark>,
}

impl FaceDetection {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        if self.landmarks.is_empty() {
            return BoundingBox::default();
        }
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for point in &self.landmarks {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn center(&self) -> Landmark {
        let bounds = self.bounding_box();
        Landmark::new(bounds.x + bounds.width / 2.0, bounds.y + bounds.height / 2.0)
    }
}

/// Everything the external detector produced for one camera frame. Hands
/// are indexed by position in the vector; that index is the hand slot and
/// is only best-effort stable across frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub hands: Vec<HandDetection>,
    pub faces: Vec<FaceDetection>,
    /// Caller-supplied monotonic timestamp in milliseconds.
    pub timestamp_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_bounds_cover_all_keypoints() {
        let face = FaceDetection::new(vec![
            Landmark::new(0.2, 0.3),
            Landmark::new(0.6, 0.1),
            Landmark::new(0.4, 0.5),
        ]);
        let bounds = face.bounding_box();
        assert!((bounds.x - 0.2).abs() < 1e-6);
        assert!((bounds.y - 0.1).abs() < 1e-6);
        assert!((bounds.width - 0.4).abs() < 1e-6);
        assert!((bounds.height - 0.4).abs() < 1e-6);

        let center = face.center();
        assert!((center.x - 0.4).abs() < 1e-6);
        assert!((center.y - 0.3).abs() < 1e-6);
    }

    #[test]
    fn hand_center_is_the_wrist() {
        let mut points = vec![Landmark::default(); HAND_LANDMARK_COUNT];
        points[hand::WRIST] = Landmark::new(0.7, 0.8);
        let detection = HandDetection::new(points);
        assert_eq!(detection.center(), Landmark::new(0.7, 0.8));
    }

    #[test]
    fn empty_detections_do_not_panic() {
        assert_eq!(HandDetection::new(Vec::new()).center(), Landmark::default());
        assert_eq!(FaceDetection::new(Vec::new()).bounding_box(), BoundingBox::default());
    }
}
