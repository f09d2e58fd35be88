//! Line commands accepted by `booster run`

use crate::error::{CliError, Result};
use booster_audio_desktop::{AudioEngine, SaveOutcome};
use booster_core::AssetId;
use std::path::{Path, PathBuf};

pub const HELP: &str = "\
commands:
  mic <pct>          microphone volume
  out <pct>          output volume
  bass <pct>         bass boost 0-100
  treble <pct>       treble boost 0-100
  nr on|off          noise reduction
  load <path>        load a sound (switches to sample injection)
  unload <path>      remove a sound
  cue <path>         replay a loaded sound from the start
  play <path>        play a loaded sound on the output device
  rec start          start recording the microphone
  rec stop [path]    stop recording and save (discard without a path)
  status             show engine state
  start | stop       start or stop the engine
  quit               exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MicVolume(f32),
    OutputVolume(f32),
    Bass(f32),
    Treble(f32),
    NoiseReduction(bool),
    Load(PathBuf),
    Unload(PathBuf),
    Cue(PathBuf),
    Play(PathBuf),
    RecordStart,
    RecordStop(Option<PathBuf>),
    Status,
    Start,
    Stop,
    Help,
    Quit,
}

/// What the control loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn percent(arg: Option<&str>, usage: &'static str) -> Result<f32> {
    arg.and_then(|a| a.parse::<f32>().ok())
        .ok_or(CliError::Usage(usage))
}

fn path(rest: &str, usage: &'static str) -> Result<PathBuf> {
    if rest.is_empty() {
        return Err(CliError::Usage(usage));
    }
    Ok(PathBuf::from(rest))
}

impl Command {
    /// Parse one input line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let arg = rest.split_whitespace().next();

        let command = match word.to_ascii_lowercase().as_str() {
            "mic" => Self::MicVolume(percent(arg, "mic <pct>")?),
            "out" => Self::OutputVolume(percent(arg, "out <pct>")?),
            "bass" => Self::Bass(percent(arg, "bass <pct>")?),
            "treble" => Self::Treble(percent(arg, "treble <pct>")?),
            "nr" => match arg {
                Some("on") => Self::NoiseReduction(true),
                Some("off") => Self::NoiseReduction(false),
                _ => return Err(CliError::Usage("nr on|off")),
            },
            "load" => Self::Load(path(rest, "load <path>")?),
            "unload" => Self::Unload(path(rest, "unload <path>")?),
            "cue" => Self::Cue(path(rest, "cue <path>")?),
            "play" => Self::Play(path(rest, "play <path>")?),
            "rec" => match rest.split_once(char::is_whitespace).unwrap_or((rest, "")) {
                ("start", _) => Self::RecordStart,
                ("stop", "") => Self::RecordStop(None),
                ("stop", dest) => Self::RecordStop(Some(PathBuf::from(dest.trim()))),
                _ => return Err(CliError::Usage("rec start | rec stop [path]")),
            },
            "status" => Self::Status,
            "start" => Self::Start,
            "stop" => Self::Stop,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Run `command` against the engine
///
/// `default_recording` is used by `rec stop` when no path is given.
pub fn execute(
    engine: &mut AudioEngine,
    command: Command,
    default_recording: Option<&Path>,
) -> anyhow::Result<Flow> {
    match command {
        Command::MicVolume(pct) => engine.set_mic_volume(pct)?,
        Command::OutputVolume(pct) => engine.set_output_volume(pct)?,
        Command::Bass(pct) => engine.set_bass_percent(pct)?,
        Command::Treble(pct) => engine.set_treble_percent(pct)?,
        Command::NoiseReduction(enabled) => engine.set_noise_reduction(enabled),
        Command::Load(path) => {
            let id = engine.load_sound(&path)?;
            println!("loaded {id}; sample injection active");
        }
        Command::Unload(path) => {
            engine.unload_sound(&AssetId::from_path(&path))?;
            if engine.sample_bank().is_empty() {
                println!("bank empty; live input active");
            }
        }
        Command::Cue(path) => engine.cue_sound(&AssetId::from_path(&path))?,
        Command::Play(path) => engine.play_sound(&AssetId::from_path(&path))?,
        Command::RecordStart => {
            engine.start_recording()?;
            println!("recording");
        }
        Command::RecordStop(dest) => {
            let dest = dest.as_deref().or(default_recording);
            match engine.stop_recording(dest)? {
                SaveOutcome::Saved { path, frames } => {
                    println!("saved {} frames to {}", frames, path.display());
                }
                SaveOutcome::Cancelled { discarded_frames } => {
                    println!("recording discarded ({discarded_frames} frames); no path given");
                }
            }
        }
        Command::Status => print_status(engine),
        Command::Start => engine.start()?,
        Command::Stop => engine.stop()?,
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

pub fn print_status(engine: &AudioEngine) {
    let config = engine.config();
    match engine.sample_rate() {
        Some(rate) => println!("engine:    running at {rate} Hz"),
        None => println!("engine:    stopped"),
    }
    println!(
        "volume:    mic {:.0}%  out {:.0}%  (max {:.0}%)",
        config.mic_volume(),
        config.output_volume(),
        config.max_safe_volume()
    );
    println!(
        "tone:      bass {:.0}%  treble {:.0}%  nr {}",
        config.bass_level() * 100.0,
        config.treble_level() * 100.0,
        if config.noise_reduction() { "on" } else { "off" }
    );

    let ids = engine.sample_bank().ids();
    if ids.is_empty() {
        println!("source:    live input");
    } else {
        let names: Vec<_> = ids.iter().map(AssetId::as_str).collect();
        println!("source:    sample injection [{}]", names.join(", "));
    }
    println!("recorder:  {:?}", engine.recorder_status());

    if let Some(stats) = engine.stats() {
        println!(
            "ticks:     {} ({} injected, {} silenced)",
            stats.ticks(),
            stats.injected_ticks(),
            stats.silenced_ticks()
        );
    }
}
