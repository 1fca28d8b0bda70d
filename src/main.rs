use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeitgeist::audio::{OutputDevice, PlaybackController, PlaybackEvent, SilentOutputDevice};
use zeitgeist::backend::GeminiClient;
use zeitgeist::integration::{AppConfig, ChatEvents, TurnOrchestrator};
use zeitgeist::ui::terminal::render_persona;
use zeitgeist::ui::{execute, handle_event, parse_command, ChatState, Command, Flow};

#[derive(Parser)]
#[command(name = "zeitgeist")]
#[command(about = "Talk design with historical personas, spoken aloud", long_about = None)]
struct Cli {
    /// Start talking to this persona right away
    #[arg(short, long, value_name = "ID")]
    persona: Option<String>,

    /// Configuration file (defaults to <config dir>/zeitgeist/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not open the sound card
    #[arg(long)]
    no_audio: bool,

    /// Only play speech on request
    #[arg(long)]
    no_autoplay: bool,

    /// Print the persona roster and exit
    #[arg(long)]
    list_personas: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zeitgeist=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.no_audio {
        config = config.without_audio_output();
    }
    if cli.no_autoplay {
        config = config.without_auto_play();
    }

    if cli.list_personas {
        for persona in config.roster() {
            println!("{}", render_persona(&persona));
        }
        return Ok(());
    }

    config.validate()?;
    info!("Starting Zeitgeist");

    let backend = Arc::new(GeminiClient::new(config.backend.clone())?);
    let (orchestrator, events) = TurnOrchestrator::new(backend, config.audio.pcm_format());

    #[cfg(feature = "audio-io")]
    if config.audio.enable_output {
        let device = zeitgeist::audio::CpalOutputDevice::new();
        return run(device, &config, orchestrator, events, cli.persona).await;
    }

    info!("Audio output disabled, speech will not be audible");
    run(SilentOutputDevice::new(), &config, orchestrator, events, cli.persona).await
}

async fn run<D: OutputDevice>(
    device: D,
    config: &AppConfig,
    orchestrator: TurnOrchestrator,
    mut events: ChatEvents,
    persona: Option<String>,
) -> Result<()> {
    let playback = PlaybackController::with_policy(device, config.audio.activation_policy());
    let mut chat =
        ChatState::new(config.roster(), orchestrator, playback).with_auto_play(config.audio.auto_play);

    let mut out = std::io::stdout();
    writeln!(out, "Zeitgeist Interviews. Type /help for commands.")?;

    let opening = match persona {
        Some(id) => Command::Select(id),
        None => Command::Personas,
    };
    execute(&mut chat, opening, &mut out).await?;
    out.flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(command) => {
                        if execute(&mut chat, command, &mut out).await? == Flow::Quit {
                            break;
                        }
                    }
                    Err(usage) => writeln!(out, "{}", usage)?,
                }
            }
            Some(event) = events.recv() => {
                handle_event(&mut chat, event, &mut out).await?;
            }
            _ = ticker.tick() => {
                for event in chat.poll_playback() {
                    if let PlaybackEvent::Finished { session } = event {
                        debug!("Session {} played to the end", session);
                    }
                }
            }
        }
        out.flush()?;
    }

    chat.leave_conversation();
    info!("Goodbye");
    Ok(())
}
