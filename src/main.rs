use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use simple_audio::error::AppResult;
use simple_audio::{context, AudioConfig};

const LOG_TARGET_STARTUP: &str = "simple_audio::startup";

/// Initialize tracing with file rotation
///
/// Logs are written to `<local data dir>/SimpleAudio/logs/`, one file per
/// day named `simple-audio.YYYY-MM-DD.log`. Debug builds also log to the
/// console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("SimpleAudio").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "simple-audio.log");

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!(target: LOG_TARGET_STARTUP, "Log directory: {}", log_dir.display());
}

struct Args {
    config: Option<PathBuf>,
    bg: Option<PathBuf>,
    seconds: u64,
    effects: Vec<PathBuf>,
}

fn parse_args() -> AppResult<Args> {
    let mut args = Args {
        config: None,
        bg: None,
        seconds: 5,
        effects: Vec::new(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--bg" => args.bg = Some(iter.next().context("--bg needs a file")?.into()),
            "--seconds" => {
                let value = iter.next().context("--seconds needs a number")?;
                args.seconds = value
                    .parse()
                    .with_context(|| format!("Invalid --seconds value: {}", value))?;
            }
            "-h" | "--help" => {
                println!("Usage: simple-audio [--config <path>] [--bg <file>] [--seconds <n>] [effect files...]");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ => args.effects.push(PathBuf::from(&arg)),
        }
    }

    Ok(args)
}

fn main() -> AppResult<()> {
    initialize_tracing();
    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting simple-audio v{} on ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    );

    let args = parse_args()?;

    let config_path = args.config.clone().unwrap_or_else(AudioConfig::default_path);
    let config = AudioConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let audio = context::initialize(&config).context("Failed to initialize audio output")?;

    for effect in &args.effects {
        if let Err(e) = audio.preload_effect(effect) {
            tracing::warn!("Skipping {}: {}", effect.display(), e);
        }
    }
    tracing::info!("{} effects preloaded", audio.preload_cache_count());

    if let Some(bg) = &args.bg {
        audio
            .play_bg_file_with_loop(bg, true)
            .with_context(|| format!("Failed to play background track {}", bg.display()))?;
    }

    for effect in &args.effects {
        match audio.play_effect(effect) {
            Ok(handle) => tracing::info!("Playing {} on {}", effect.display(), handle.id()),
            Err(e) => tracing::warn!("Failed to play {}: {}", effect.display(), e),
        }
        thread::sleep(Duration::from_millis(500));
    }

    thread::sleep(Duration::from_secs(args.seconds));
    audio.stop_everything();
    tracing::info!("Playback finished");

    Ok(())
}
