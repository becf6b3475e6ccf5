use crate::{
    channel::{self, CameraImage, ChannelMode, SignalPublisher, SignalSubscriber},
    landmarks::{DetectionFrame, HAND_LANDMARK_COUNT},
    pipeline::AudioSignalPipeline,
    tracking::{GestureSession, GestureUpdate},
    AudioSignalFrame, EngineConfig, SpectrumFrame,
};

/// High level façade over the audio pipeline, the gesture session and the
/// cross-thread channel.
///
/// The producer side (audio callbacks, camera callbacks) drives
/// [`SignalEngine::audio_tick`] and [`SignalEngine::video_tick`]; the
/// consumer side reads through the [`SignalSubscriber`] taken after enable.
/// Neither direction ever blocks on the other.
#[derive(Debug)]
pub struct SignalEngine {
    config: EngineConfig,
    enabled: bool,
    pipeline: AudioSignalPipeline,
    session: GestureSession,
    publisher: Option<SignalPublisher>,
    subscriber: Option<SignalSubscriber>,
    video_frame_count: u64,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pipeline = AudioSignalPipeline::new(&config.audio, config.beat.clone());
        let session = GestureSession::new(config.tracker.clone());
        Self {
            config,
            enabled: false,
            pipeline,
            session,
            publisher: None,
            subscriber: None,
            video_frame_count: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Brings the engine up with the requested channel mode. Idempotent: a
    /// second call on an enabled engine is a no-op.
    pub fn enable(&mut self, mode: ChannelMode) {
        if self.enabled {
            return;
        }

        let (publisher, subscriber) = channel::channel(mode);
        if let Some(shared) = publisher.shared() {
            self.pipeline.attach_shared(shared.clone());
        } else {
            tracing::info!("shared memory unavailable, using message passing");
        }
        self.publisher = Some(publisher);
        self.subscriber = Some(subscriber);
        self.enabled = true;
    }

    /// Hands out the consumer-side endpoint. Available once per enable.
    pub fn take_subscriber(&mut self) -> Option<SignalSubscriber> {
        self.subscriber.take()
    }

    /// Tears the engine down into a safe idle state: releases the shared
    /// buffer handle, drops the message sender and clears all per-tick
    /// state. Idempotent; the consumer is not notified and simply stops
    /// receiving fresh data.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.pipeline.detach_shared();
        self.pipeline.reset();
        self.session.reset();
        self.publisher = None;
        self.subscriber = None;
        self.video_frame_count = 0;
        self.enabled = false;
    }

    /// One audio analysis tick. Returns the published frame; a disabled
    /// engine reports zeros and publishes nothing.
    pub fn audio_tick(&mut self, frame: &SpectrumFrame, dt: f32) -> AudioSignalFrame {
        if !self.enabled {
            return AudioSignalFrame::default();
        }
        let published = self.pipeline.tick(frame, dt);
        if let Some(publisher) = &self.publisher {
            publisher.publish_audio(published);
        }
        published
    }

    /// One camera frame. Applies the frame-skip throttle, runs the gesture
    /// session and publishes the summary over the message path. Returns
    /// `None` for skipped frames or while disabled.
    pub fn video_tick(&mut self, detections: &DetectionFrame) -> Option<GestureUpdate> {
        if !self.enabled {
            return None;
        }

        self.video_frame_count += 1;
        let skip = self.config.tracker.frame_skip.max(1);
        if self.video_frame_count % skip != 0 {
            return None;
        }

        for (slot, hand) in detections.hands.iter().enumerate() {
            if hand.landmarks.len() < HAND_LANDMARK_COUNT {
                // Malformed detector output: the classifier treats this as
                // "no gesture", which feeds the normal decay path.
                tracing::warn!(slot, count = hand.landmarks.len(), "short hand landmark list");
            }
        }

        let update = self.session.process(detections);
        if let Some(publisher) = &self.publisher {
            publisher.publish_gestures(update.clone());
        }
        Some(update)
    }

    /// Forwards a camera image to the consumer alongside the gesture data.
    pub fn publish_camera_frame(&self, image: CameraImage) {
        if let Some(publisher) = &self.publisher {
            publisher.publish_camera_frame(image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{fixtures, GestureLabel};
    use crate::landmarks::HandDetection;
    use crate::spectrum;

    const DT: f32 = 1.0 / 60.0;

    fn low_heavy_frame() -> SpectrumFrame {
        let edges = spectrum::band_edges(1025, 44_100, 2048);
        let mut magnitudes = vec![10u8; 1025];
        for value in magnitudes.iter_mut().take(edges.low_end) {
            *value = 220;
        }
        SpectrumFrame::new(magnitudes, 44_100, 2048)
    }

    fn enabled_engine(mode: ChannelMode) -> SignalEngine {
        let mut engine = SignalEngine::new(EngineConfig::default());
        engine.enable(mode);
        engine
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut engine = SignalEngine::new(EngineConfig::default());
        engine.disable();
        assert!(!engine.enabled());

        engine.enable(ChannelMode::Messages);
        engine.enable(ChannelMode::Messages);
        assert!(engine.enabled());

        engine.disable();
        engine.disable();
        assert!(!engine.enabled());
    }

    #[test]
    fn disabled_engine_reports_zeros() {
        let mut engine = SignalEngine::new(EngineConfig::default());
        let frame = engine.audio_tick(&low_heavy_frame(), DT);
        assert_eq!(frame, AudioSignalFrame::default());
        assert!(engine
            .video_tick(&DetectionFrame::default())
            .is_none());
    }

    #[test]
    fn shared_mode_flows_from_tick_to_subscriber() {
        let mut engine = enabled_engine(ChannelMode::Shared { bin_count: 1025 });
        let mut subscriber = engine.take_subscriber().unwrap();

        let mut published = AudioSignalFrame::default();
        for _ in 0..10 {
            published = engine.audio_tick(&low_heavy_frame(), DT);
        }
        let seen = subscriber.audio();
        assert_eq!(seen.lows.to_bits(), published.lows.to_bits());
        assert!(subscriber.spectrum_bin(0).unwrap() > 0.8);
    }

    #[test]
    fn message_mode_flows_from_tick_to_subscriber() {
        let mut engine = enabled_engine(ChannelMode::Messages);
        let mut subscriber = engine.take_subscriber().unwrap();

        let published = engine.audio_tick(&low_heavy_frame(), DT);
        assert_eq!(subscriber.audio(), published);
        assert!(subscriber.spectrum_bin(0).is_none());
    }

    #[test]
    fn gesture_updates_reach_the_subscriber() {
        let mut engine = enabled_engine(ChannelMode::Messages);
        let mut subscriber = engine.take_subscriber().unwrap();

        let hand = HandDetection::new(fixtures::thumbs_up_hand());
        let mut reported = None;
        // Frame-skip drops every other frame; run enough frames for the
        // tracker to clear its confidence gate on the processed ones.
        for frame in 0..10u32 {
            let update = engine.video_tick(&DetectionFrame {
                hands: vec![hand.clone()],
                faces: Vec::new(),
                timestamp_ms: frame as f64 * 33.0,
            });
            if let Some(update) = update {
                reported = update.hands.first().and_then(|h| h.label).or(reported);
            }
        }
        assert_eq!(reported, Some(GestureLabel::ThumbUp));
        assert!(subscriber.gestures().is_some());
    }

    #[test]
    fn subscriber_holds_values_after_disable() {
        let mut engine = enabled_engine(ChannelMode::Messages);
        let mut subscriber = engine.take_subscriber().unwrap();

        let published = engine.audio_tick(&low_heavy_frame(), DT);
        assert_eq!(subscriber.audio(), published);

        engine.disable();
        // No fresh data, but the last frame is still readable.
        assert_eq!(subscriber.audio(), published);
    }
}
