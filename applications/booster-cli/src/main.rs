/// Voice Booster - live microphone enhancement from the terminal
use anyhow::Context;
use booster_audio::{EngineConfig, SampleBank};
use booster_audio_desktop::{
    list_input_devices, list_output_devices, AudioDeviceInfo, AudioEngine, CpalAssetPlayer,
    EngineEvent, Recorder, RecorderStatus, SaveOutcome,
};
use booster_cli::{commands, BoosterConfig, Command, Flow};
use clap::{Parser, Subcommand};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the control loop checks engine events
const EVENT_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "booster")]
#[command(
    about = "Real-time voice booster: mic to speakers with tone, noise and gain control",
    long_about = None
)]
struct Cli {
    /// Configuration file path (default: ./booster.toml if present)
    #[arg(short, long, global = true, env = "BOOSTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio input and output devices
    Devices,
    /// Run the engine and read commands from stdin
    Run {
        /// Sound to load at startup (repeatable)
        #[arg(short, long)]
        sound: Vec<PathBuf>,
        /// Record the microphone from startup; saved here on exit
        #[arg(short, long)]
        record: Option<PathBuf>,
        /// Run for this many seconds without reading stdin
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Decode a sound file and play it once
    Play {
        /// Audio file (WAV, MP3, FLAC, OGG)
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "booster=info,booster_cli=info,booster_audio=info,booster_audio_desktop=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = BoosterConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate().context("validating configuration")?;

    match cli.command {
        Commands::Devices => list_devices(),
        Commands::Run {
            sound,
            record,
            seconds,
        } => run(&config, &sound, record, seconds),
        Commands::Play { path } => play_file(&config, &path),
    }
}

fn print_devices(title: &str, devices: &[AudioDeviceInfo]) {
    println!("{title}:");
    if devices.is_empty() {
        println!("  (none)");
    }
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        let range = device
            .sample_rate_range
            .map(|(min, max)| format!(", {min}-{max} Hz"))
            .unwrap_or_default();
        println!(
            "{} {} ({} Hz, {} ch{})",
            marker, device.name, device.sample_rate, device.channels, range
        );
    }
}

fn list_devices() -> anyhow::Result<()> {
    let inputs = list_input_devices().context("listing input devices")?;
    let outputs = list_output_devices().context("listing output devices")?;
    print_devices("Input devices", &inputs);
    print_devices("Output devices", &outputs);
    Ok(())
}

fn play_file(config: &BoosterConfig, path: &Path) -> anyhow::Result<()> {
    let mut bank = SampleBank::new(config.engine.sample_rate);
    let id = bank
        .load(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let player = CpalAssetPlayer::with_device(config.devices.output.clone());
    bank.play(&id, &player)
        .with_context(|| format!("playing {}", path.display()))?;
    Ok(())
}

fn build_engine(config: &BoosterConfig) -> anyhow::Result<AudioEngine> {
    let engine_config = EngineConfig::from_settings(&config.engine)?;
    Ok(
        AudioEngine::new(Arc::new(engine_config), config.devices.clone())
            .with_recorder(Recorder::with_chunk_seconds(config.recording.chunk_seconds)),
    )
}

fn run(
    config: &BoosterConfig,
    sounds: &[PathBuf],
    record: Option<PathBuf>,
    seconds: Option<u64>,
) -> anyhow::Result<()> {
    let mut engine = build_engine(config)?;

    for path in config.sounds.iter().chain(sounds) {
        engine
            .load_sound(path)
            .with_context(|| format!("loading sound {}", path.display()))?;
    }

    engine.start().context("starting audio engine")?;

    let recording_path = record.or_else(|| config.recording.default_path.clone());
    if recording_path.is_some() {
        engine.start_recording().context("starting recording")?;
    }

    match seconds {
        Some(secs) => run_for(&mut engine, Duration::from_secs(secs)),
        None => run_interactive(&mut engine, recording_path.as_deref()),
    }

    if engine.recorder_status() == RecorderStatus::Recording {
        match engine.stop_recording(recording_path.as_deref())? {
            SaveOutcome::Saved { path, frames } => {
                println!("saved {} frames to {}", frames, path.display());
            }
            SaveOutcome::Cancelled { discarded_frames } => {
                println!("recording discarded ({discarded_frames} frames)");
            }
        }
    }

    engine.stop().context("stopping audio engine")?;
    Ok(())
}

fn report_events(engine: &mut AudioEngine) {
    while let Some(event) = engine.poll_event() {
        match event {
            EngineEvent::Started { sample_rate } => println!("engine running at {sample_rate} Hz"),
            EngineEvent::Stopped => println!("engine stopped"),
            EngineEvent::DeviceLost(which) => {
                eprintln!("audio device lost ({which}); use 'start' to retry");
            }
        }
    }
}

fn run_for(engine: &mut AudioEngine, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        thread::sleep(EVENT_POLL);
        report_events(engine);
        if !engine.is_running() {
            break;
        }
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_interactive(engine: &mut AudioEngine, default_recording: Option<&Path>) {
    println!("{}", commands::HELP);
    let lines = spawn_stdin_reader();

    loop {
        report_events(engine);

        let line = match lines.recv_timeout(EVENT_POLL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match commands::execute(engine, command, default_recording) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
}
