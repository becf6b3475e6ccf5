use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, InputCallbackInfo, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    StreamError,
};
use crossbeam_channel::Sender;
use lumina_core::{LuminaError, Result};

/// A running microphone stream. Capture stops when this is dropped.
pub struct CaptureHandle {
    // Held for its lifetime; dropping stops the callbacks.
    _stream: Stream,
    pub sample_rate: u32,
}

/// Acquires the default input device and streams mono f32 blocks into
/// `tx_frames`. Failure here is the one unrecoverable enable-time error:
/// the caller is expected to leave the engine disabled.
pub fn start_microphone(tx_frames: Sender<Vec<f32>>) -> Result<CaptureHandle> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| LuminaError::CaptureUnavailable("no default input device".into()))?;

    let supported = device
        .default_input_config()
        .map_err(|err| LuminaError::CaptureUnavailable(err.to_string()))?;
    let config = supported.config();
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;

    let stream = match supported.sample_format() {
        SampleFormat::F32 => build_input_stream::<f32>(&device, &config, channels, tx_frames)?,
        SampleFormat::I16 => build_input_stream::<i16>(&device, &config, channels, tx_frames)?,
        SampleFormat::U16 => build_input_stream::<u16>(&device, &config, channels, tx_frames)?,
        other => {
            return Err(LuminaError::CaptureUnavailable(format!(
                "unsupported sample format {other:?}"
            )))
        }
    };

    Ok(CaptureHandle {
        _stream: stream,
        sample_rate,
    })
}

fn build_input_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    tx_frames: Sender<Vec<f32>>,
) -> Result<Stream>
where
    T: Sample + Send + 'static + SizedSample + std::fmt::Debug,
    f32: FromSample<<T as Sample>::Float>,
{
    let err_callback = |err: StreamError| tracing::warn!(%err, "input stream error");

    let input_callback = move |data: &[T], _info: &InputCallbackInfo| {
        // Downmix interleaved frames to mono before handing them off.
        let mut mono = Vec::with_capacity(data.len() / channels.max(1));
        for frame in data.chunks(channels.max(1)) {
            let sum: f32 = frame
                .iter()
                .map(|s| f32::from_sample(s.to_float_sample()))
                .sum();
            mono.push(sum / channels.max(1) as f32);
        }
        // Fire-and-forget: dropping a block is better than stalling the
        // audio callback.
        let _ = tx_frames.try_send(mono);
    };

    let latency = Some(Duration::from_millis(20));
    let stream = device
        .build_input_stream(config, input_callback, err_callback, latency)
        .map_err(|err| LuminaError::CaptureUnavailable(err.to_string()))?;
    stream
        .play()
        .map_err(|err| LuminaError::CaptureUnavailable(err.to_string()))?;
    Ok(stream)
}
