use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use lumina_core::{
    spectrum, ChannelMode, EngineConfig, SignalEngine, SpectrumFrame, SpectrumProcessor,
};
use tracing_subscriber::EnvFilter;

mod capture;

fn main() -> lumina_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            preset,
            duration,
            no_shared,
        } => run_live(preset.as_deref(), duration, no_shared),
        Commands::Demo { duration } => run_demo(duration),
    }
}

fn run_live(
    preset: Option<&std::path::Path>,
    duration: u64,
    no_shared: bool,
) -> lumina_core::Result<()> {
    let mut config = match preset {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let (tx_frames, rx_frames) = crossbeam_channel::bounded::<Vec<f32>>(16);
    let capture = capture::start_microphone(tx_frames)?;
    config.audio.sample_rate = capture.sample_rate;
    tracing::info!(sample_rate = capture.sample_rate, "microphone capture started");

    let fft_size = config.audio.fft_size;
    let mut processor = SpectrumProcessor::new(capture.sample_rate, fft_size)?;
    let bin_count = processor.bin_count();

    let mut engine = SignalEngine::new(config);
    let mode = if no_shared {
        ChannelMode::Messages
    } else {
        ChannelMode::Shared { bin_count }
    };
    engine.enable(mode);
    let subscriber = engine
        .take_subscriber()
        .expect("fresh engine has a subscriber");

    let deadline = Instant::now() + Duration::from_secs(duration);
    let consumer = std::thread::spawn(move || run_consumer(subscriber, deadline));

    // Producer loop: every captured block may complete one or more FFT
    // frames, each of which becomes one analysis tick.
    let mut last_tick = Instant::now();
    while Instant::now() < deadline {
        let block = match rx_frames.recv_timeout(Duration::from_millis(100)) {
            Ok(block) => block,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        };

        match processor.push_samples(&block) {
            Ok(Some(frame)) => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;
                engine.audio_tick(&frame, dt);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "skipping audio block"),
        }
    }

    engine.disable();
    let _ = consumer.join();
    Ok(())
}

fn run_consumer(mut subscriber: lumina_core::SignalSubscriber, deadline: Instant) {
    let frame_duration = Duration::from_millis(16);
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        let frame = subscriber.audio();
        if last_report.elapsed() >= Duration::from_millis(500) {
            last_report = Instant::now();
            tracing::info!(
                energy = frame.energy,
                bass = frame.bass,
                lows = frame.lows,
                mids = frame.mids,
                treble = frame.treble,
                beat = frame.beat,
                "audio signals"
            );
        }
        std::thread::sleep(frame_duration);
    }
}

/// Deterministic synthetic source for machines without a microphone: a
/// pulsing low-frequency spectrum pushed through the same engine path.
fn run_demo(duration: u64) -> lumina_core::Result<()> {
    let config = EngineConfig::default();
    let sample_rate = config.audio.sample_rate;
    let fft_size = config.audio.fft_size;
    let bin_count = fft_size / 2 + 1;

    let mut engine = SignalEngine::new(config);
    engine.enable(ChannelMode::Shared { bin_count });
    let subscriber = engine
        .take_subscriber()
        .expect("fresh engine has a subscriber");

    let deadline = Instant::now() + Duration::from_secs(duration);
    let consumer = std::thread::spawn(move || run_consumer(subscriber, deadline));

    let edges = spectrum::band_edges(bin_count, sample_rate, fft_size);
    let mut last_tick = Instant::now();
    let mut tick = 0u64;
    while Instant::now() < deadline {
        // Two pulses per second at 60 ticks.
        let pulsing = tick % 30 < 6;
        let mut magnitudes = vec![30u8; bin_count];
        let level = if pulsing { 230 } else { 50 };
        for value in magnitudes.iter_mut().take(edges.low_end) {
            *value = level;
        }

        let frame = SpectrumFrame::new(magnitudes, sample_rate, fft_size);
        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;
        engine.audio_tick(&frame, dt);

        tick += 1;
        std::thread::sleep(Duration::from_millis(16));
    }

    engine.disable();
    let _ = consumer.join();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio/gesture-reactive signal engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture the default microphone and publish live audio signals.
    Live {
        /// Optional JSON preset with engine tuning.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// How long to run, in seconds.
        #[arg(short, long, default_value_t = 30)]
        duration: u64,
        /// Force the message-passing channel instead of shared memory.
        #[arg(long)]
        no_shared: bool,
    },
    /// Run a synthetic pulsing-bass source instead of a microphone.
    Demo {
        /// How long to run, in seconds.
        #[arg(short, long, default_value_t = 10)]
        duration: u64,
    },
}
