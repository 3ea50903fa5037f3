use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use voice_robot::audio::{shared, SharedSource, SpectrumAnalyser, WavSource};
use voice_robot::config::Config;
use voice_robot::recognizer::spawn_line_reader;
use voice_robot::server;
use voice_robot::{classify_audio, AudioFeatures, Emotion, Session, SessionEvent, SessionRunner};

/// Drive a simulated robot with spoken (or typed) commands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.voicerobot/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the demo HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static assets served at /
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Monitor voice energy and read utterances from stdin
    Live {
        /// Play a WAV recording instead of the microphone
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Input device ID (use "default" or run list-devices)
        #[arg(short, long)]
        device: Option<String>,

        /// Disable audio monitoring; emotion comes from text only
        #[arg(long)]
        no_audio: bool,

        /// Write the SVG frame here after every command
        #[arg(long)]
        frame_out: Option<PathBuf>,
    },

    /// Run one utterance through the pipeline and print the commit
    Say {
        /// Recognized utterance
        text: String,

        /// Average frequency-bin level (0-255)
        #[arg(long)]
        average: Option<f32>,

        /// Peak frequency-bin level (0-255)
        #[arg(long)]
        peak: Option<f32>,

        /// Write the SVG frame here
        #[arg(long)]
        frame_out: Option<PathBuf>,
    },

    /// List available input devices
    #[cfg(feature = "capture")]
    ListDevices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { port, static_dir } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                static_dir: static_dir.or(config.static_dir),
                ..config
            };
            server::serve(config).await
        }
        Command::Live {
            wav,
            device,
            no_audio,
            frame_out,
        } => {
            let device = device.or_else(|| config.input_device_id.clone());
            run_live(config, wav, device, no_audio, frame_out).await
        }
        Command::Say {
            text,
            average,
            peak,
            frame_out,
        } => run_say(&config, &text, average, peak, frame_out),
        #[cfg(feature = "capture")]
        Command::ListDevices => list_devices_and_exit(),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => match Config::default_config_path() {
            Ok(path) => Config::load(&path),
            Err(e) => {
                warn!("No config directory ({}), using defaults", e);
                Ok(Config::default())
            }
        },
    }
}

async fn run_live(
    config: Config,
    wav: Option<PathBuf>,
    device: Option<String>,
    no_audio: bool,
    frame_out: Option<PathBuf>,
) -> Result<()> {
    let analyser = SpectrumAnalyser::new(config.analyser);
    let interval = config.sample_interval();

    // Keeps the microphone stream alive for the whole session
    #[cfg(feature = "capture")]
    let mut _capture = None;

    let source: Option<SharedSource> = if no_audio {
        info!("Audio monitoring disabled");
        None
    } else if let Some(path) = wav {
        let source = WavSource::open(&path, analyser, interval)
            .with_context(|| format!("Failed to open recording {:?}", path))?;
        Some(shared(source))
    } else {
        #[cfg(feature = "capture")]
        {
            match voice_robot::audio::open_capture_source(device.as_deref(), analyser) {
                Ok((capture, source)) => {
                    _capture = Some(capture);
                    Some(shared(source))
                }
                Err(e) => {
                    let err = voice_robot::SessionError::CaptureUnavailable(e.to_string());
                    tracing::error!("{}", err);
                    eprintln!("\n{}\nUse --wav FILE or --no-audio to run without a microphone.", err);
                    return Err(err.into());
                }
            }
        }
        #[cfg(not(feature = "capture"))]
        {
            if let Some(id) = &device {
                warn!("Ignoring device {:?}: built without microphone support", id);
            }
            warn!("Built without microphone support; use --wav FILE for voice energy");
            None
        }
    };

    let runner = SessionRunner::new(
        Session::new(config.arena, config.emotion_thresholds),
        source,
        interval,
    );

    // Stdin stands in for the speech recognizer. Left detached: a pending
    // read must not hold up exit after Ctrl+C.
    let _input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()), runner.sender())?;

    // Set up Ctrl+C handler
    let ctrlc_tx = runner.sender();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, stopping...");
        let _ = ctrlc_tx.send(SessionEvent::Stop).await;
        let _ = ctrlc_tx.send(SessionEvent::Shutdown).await;
    });

    println!("\nListening... type a command and press Enter.");
    println!("(empty line = not understood, :stop / :start to toggle monitoring, :quit to exit)\n");

    let session = runner
        .run(|commit, session| {
            println!(
                "[{}] {} | emotion {} (audio {}, text {}) | pose ({:.2}, {:.2}) heading {:.2} rad",
                commit.intent,
                commit.transcript,
                commit.emotion,
                commit.audio_emotion,
                commit.text_emotion,
                commit.pose.x,
                commit.pose.y,
                commit.pose.heading
            );
            if let Some(path) = &frame_out {
                if let Err(e) = std::fs::write(path, session.frame()) {
                    warn!("Failed to write frame to {:?}: {}", path, e);
                }
            }
        })
        .await;

    let status = session.status();
    println!("\n--- Session Summary ---");
    println!("Commands: {}", status.commit_count);
    println!(
        "Final pose: ({:.2}, {:.2}) heading {:.2} rad",
        status.pose.x, status.pose.y, status.pose.heading
    );
    if let Some(message) = status.error_message {
        println!("Last error: {}", message);
    }

    info!("Session complete");
    Ok(())
}

fn run_say(
    config: &Config,
    text: &str,
    average: Option<f32>,
    peak: Option<f32>,
    frame_out: Option<PathBuf>,
) -> Result<()> {
    let audio_emotion = if average.is_none() && peak.is_none() {
        Emotion::Neutral
    } else {
        let features = AudioFeatures {
            average_level: average.unwrap_or(0.0),
            peak_level: peak.unwrap_or(0.0),
        };
        classify_audio(&features, &config.emotion_thresholds)
    };

    let mut session = Session::new(config.arena, config.emotion_thresholds);
    let commit = session.commit_with_audio(text, audio_emotion);
    println!("{}", serde_json::to_string_pretty(&commit)?);

    if let Some(path) = frame_out {
        std::fs::write(&path, session.frame())
            .with_context(|| format!("Failed to write frame to {:?}", path))?;
    }
    Ok(())
}

#[cfg(feature = "capture")]
fn list_devices_and_exit() -> Result<()> {
    println!("Available input devices:\n");

    match voice_robot::audio::list_input_devices() {
        Ok(devices) if devices.is_empty() => println!("  No input devices found."),
        Ok(devices) => {
            for device in devices {
                let default_marker = if device.is_default { " (default)" } else { "" };
                println!("  - {}{}", device.name, default_marker);
            }
        }
        Err(e) => {
            tracing::error!("Failed to list devices: {}", e);
            println!("  Error: {}", e);
        }
    }

    Ok(())
}
