use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::{AudioSignalFrame, GestureUpdate};

/// Number of 32-bit float slots reserved at the front of the shared buffer.
pub const HEADER_SLOTS: usize = 8;

/// Fixed header slot indices.
pub mod slot {
    pub const ENERGY: usize = 0;
    pub const TREBLE: usize = 1;
    pub const BASS: usize = 2;
    pub const MIDS: usize = 3;
    pub const HIGHS: usize = 4;
    pub const LOWS: usize = 5;
    pub const BEAT: usize = 6;
    pub const RESERVED: usize = 7;
}

/// Capacity of the message fallback queue. Producers drop on overflow
/// rather than block.
const MESSAGE_CAPACITY: usize = 64;

/// Fixed-layout block of floats shared between the producer and consumer
/// sides: an 8-slot header of audio metrics followed by one slot per
/// frequency bin.
///
/// Each slot is an independent `AtomicU32` holding an `f32` bit pattern and
/// is accessed with relaxed ordering. There is deliberately no cross-field
/// synchronization: with a single writer and scalar fields, a reader racing
/// a write sees a mix of this tick's and last tick's values, which is
/// imperceptible at sampling rates the consumer runs at.
#[derive(Clone)]
pub struct SharedAudioBuffer {
    slots: Arc<[AtomicU32]>,
}

impl SharedAudioBuffer {
    pub fn new(bin_count: usize) -> Self {
        let slots: Vec<AtomicU32> = (0..HEADER_SLOTS + bin_count)
            .map(|_| AtomicU32::new(0))
            .collect();
        Self {
            slots: slots.into(),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.slots.len() - HEADER_SLOTS
    }

    /// Writes one float slot. Out-of-range indices are ignored.
    pub fn write(&self, index: usize, value: f32) {
        if let Some(slot) = self.slots.get(index) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Reads one float slot, 0.0 when out of range.
    pub fn read(&self, index: usize) -> f32 {
        self.slots
            .get(index)
            .map(|slot| f32::from_bits(slot.load(Ordering::Relaxed)))
            .unwrap_or(0.0)
    }

    pub fn write_bin(&self, bin: usize, value: f32) {
        self.write(HEADER_SLOTS + bin, value);
    }

    pub fn read_bin(&self, bin: usize) -> f32 {
        self.read(HEADER_SLOTS + bin)
    }

    pub fn write_header(&self, frame: &AudioSignalFrame) {
        self.write(slot::ENERGY, frame.energy);
        self.write(slot::TREBLE, frame.treble);
        self.write(slot::BASS, frame.bass);
        self.write(slot::MIDS, frame.mids);
        self.write(slot::HIGHS, frame.highs);
        self.write(slot::LOWS, frame.lows);
        self.write(slot::BEAT, frame.beat);
    }

    pub fn read_header(&self) -> AudioSignalFrame {
        AudioSignalFrame {
            energy: self.read(slot::ENERGY),
            treble: self.read(slot::TREBLE),
            bass: self.read(slot::BASS),
            mids: self.read(slot::MIDS),
            highs: self.read(slot::HIGHS),
            lows: self.read(slot::LOWS),
            beat: self.read(slot::BEAT),
        }
    }
}

impl std::fmt::Debug for SharedAudioBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAudioBuffer")
            .field("bin_count", &self.bin_count())
            .finish()
    }
}

/// A camera frame handed through the channel as an opaque pixel handle.
#[derive(Debug, Clone)]
pub struct CameraImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

/// Closed set of messages the producer side can emit. Audio metrics only
/// travel this way when no shared buffer is available; gesture and camera
/// data always do.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    Audio(AudioSignalFrame),
    Gestures(GestureUpdate),
    CameraFrame(CameraImage),
}

/// How audio metrics cross the producer/consumer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Zero-copy shared buffer sized for `bin_count` frequency bins.
    Shared { bin_count: usize },
    /// Message passing for everything, used when shared memory is
    /// unavailable.
    Messages,
}

/// Creates a connected publisher/subscriber pair.
pub fn channel(mode: ChannelMode) -> (SignalPublisher, SignalSubscriber) {
    let shared = match mode {
        ChannelMode::Shared { bin_count } => Some(SharedAudioBuffer::new(bin_count)),
        ChannelMode::Messages => None,
    };
    let (tx, rx) = bounded(MESSAGE_CAPACITY);

    let publisher = SignalPublisher {
        shared: shared.clone(),
        tx,
    };
    let subscriber = SignalSubscriber {
        shared,
        rx,
        last_audio: AudioSignalFrame::default(),
        last_gestures: None,
        last_camera: None,
    };
    (publisher, subscriber)
}

/// Producer-side handle. Every operation is fire-and-forget; when the
/// message queue is full the update is dropped, never blocked on.
pub struct SignalPublisher {
    shared: Option<SharedAudioBuffer>,
    tx: Sender<EngineMessage>,
}

impl SignalPublisher {
    /// View of the shared buffer, when operating in shared mode.
    pub fn shared(&self) -> Option<&SharedAudioBuffer> {
        self.shared.as_ref()
    }

    /// Publishes this tick's audio metrics. In shared mode the pipeline has
    /// already written them into the buffer, so nothing is sent.
    pub fn publish_audio(&self, frame: AudioSignalFrame) {
        if self.shared.is_none() {
            self.send(EngineMessage::Audio(frame));
        }
    }

    pub fn publish_gestures(&self, update: GestureUpdate) {
        self.send(EngineMessage::Gestures(update));
    }

    pub fn publish_camera_frame(&self, image: CameraImage) {
        self.send(EngineMessage::CameraFrame(image));
    }

    fn send(&self, message: EngineMessage) {
        if self.tx.try_send(message).is_err() {
            tracing::debug!("signal channel full, dropping update");
        }
    }
}

impl std::fmt::Debug for SignalPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalPublisher")
            .field("shared", &self.shared.is_some())
            .finish()
    }
}

/// Consumer-side handle. Non-blocking: reads the shared buffer directly and
/// drains pending messages, holding the last-known value of each stream so a
/// stalled or disabled producer never faults the consumer.
pub struct SignalSubscriber {
    shared: Option<SharedAudioBuffer>,
    rx: Receiver<EngineMessage>,
    last_audio: AudioSignalFrame,
    last_gestures: Option<GestureUpdate>,
    last_camera: Option<CameraImage>,
}

impl SignalSubscriber {
    /// Most recent audio metrics.
    pub fn audio(&mut self) -> AudioSignalFrame {
        if let Some(shared) = &self.shared {
            return shared.read_header();
        }
        self.pump();
        self.last_audio
    }

    /// Most recent gesture summary, if any frame has been processed yet.
    pub fn gestures(&mut self) -> Option<&GestureUpdate> {
        self.pump();
        self.last_gestures.as_ref()
    }

    /// Takes the most recently delivered camera frame.
    pub fn take_camera_frame(&mut self) -> Option<CameraImage> {
        self.pump();
        self.last_camera.take()
    }

    /// One normalized spectrum bin from the shared buffer. `None` in
    /// message-passing mode.
    pub fn spectrum_bin(&self, bin: usize) -> Option<f32> {
        self.shared.as_ref().map(|shared| shared.read_bin(bin))
    }

    fn pump(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                EngineMessage::Audio(frame) => self.last_audio = frame,
                EngineMessage::Gestures(update) => self.last_gestures = Some(update),
                EngineMessage::CameraFrame(image) => self.last_camera = Some(image),
            }
        }
    }
}

impl std::fmt::Debug for SignalSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSubscriber")
            .field("shared", &self.shared.is_some())
            .finish()
    }
}
