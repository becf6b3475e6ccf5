//! Core library for the Lumina reactive visual engine.
//!
//! The crate extracts low-dimensional signals from live audio and from
//! camera-derived hand/face landmarks, stabilizes them over time, and
//! republishes them at frame rate to a rendering stage running in another
//! thread. The landmark detector itself and the rendering surface are
//! external collaborators; this crate owns everything between them.

pub mod analysis;
pub mod beat;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod landmarks;
pub mod pipeline;
pub mod spectrum;
pub mod tracking;

pub use analysis::SpectrumProcessor;
pub use beat::BeatState;
pub use channel::{
    CameraImage, ChannelMode, EngineMessage, SharedAudioBuffer, SignalPublisher, SignalSubscriber,
};
pub use config::{AudioConfig, BeatConfig, EngineConfig, TrackerConfig};
pub use engine::SignalEngine;
pub use error::{LuminaError, Result};
pub use gesture::{GestureLabel, GestureReading};
pub use landmarks::{
    BoundingBox, DetectionFrame, FaceDetection, HandDetection, HandSide, Landmark,
};
pub use pipeline::{AudioSignalFrame, AudioSignalPipeline};
pub use spectrum::{BandEnergies, SpectrumFrame};
pub use tracking::{FaceSummary, GestureSession, GestureTrack, GestureUpdate, HandSummary};
