//! Line-oriented terminal front-end
//!
//! Parses REPL commands, runs them against a [`ChatState`] and renders the
//! transcript as plain text.

use crate::audio::{write_wav, OutputDevice};
use crate::integration::orchestrator::ChatEvent;
use crate::messages::{ImageAttachment, Message, Role};
use crate::persona::Persona;
use crate::ui::state::{ChatState, SendRejection};
use crate::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

pub const HELP: &str = "\
Commands:
  /personas        list personas
  /select ID       talk to a persona
  /back            return to persona selection
  /image PATH      attach an image to the next message
  /clear-image     drop the attached image
  /play N          play (or stop) the audio of message N
  /stop            stop playback
  /save N PATH     export the audio of message N as WAV
  /suggest [N]     list suggested questions, or ask question N
  /help            show this help
  /quit            exit
Anything else is sent to the persona.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Personas,
    Select(String),
    Back,
    Image(PathBuf),
    ClearImage,
    Play(usize),
    Stop,
    Save(usize, PathBuf),
    Suggest(Option<usize>),
    Help,
    Quit,
    /// Plain text for the persona
    Say(String),
}

/// Whether the REPL keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn position(arg: Option<&str>, usage: &str) -> std::result::Result<usize, String> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("Usage: {}", usage))
}

/// Parse one input line
pub fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Say(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let arg = (!args.is_empty()).then_some(args);

    match name {
        "personas" => Ok(Command::Personas),
        "select" => arg
            .map(|id| Command::Select(id.to_string()))
            .ok_or_else(|| "Usage: /select ID".to_string()),
        "back" => Ok(Command::Back),
        "image" => arg
            .map(|path| Command::Image(PathBuf::from(path)))
            .ok_or_else(|| "Usage: /image PATH".to_string()),
        "clear-image" => Ok(Command::ClearImage),
        "play" => position(arg, "/play N").map(Command::Play),
        "stop" => Ok(Command::Stop),
        "save" => {
            let usage = "/save N PATH";
            let (n, path) = args
                .split_once(char::is_whitespace)
                .ok_or_else(|| format!("Usage: {}", usage))?;
            Ok(Command::Save(
                position(Some(n), usage)?,
                PathBuf::from(path.trim()),
            ))
        }
        "suggest" => match arg {
            None => Ok(Command::Suggest(None)),
            Some(_) => position(arg, "/suggest [N]").map(|n| Command::Suggest(Some(n))),
        },
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command /{}. Try /help", other)),
    }
}

pub fn render_persona(persona: &Persona) -> String {
    format!(
        "  {:<10} {}, {} ({})\n             {}",
        persona.id, persona.name, persona.title, persona.era, persona.description
    )
}

/// One transcript entry, numbered from 1
pub fn render_message(position: usize, message: &Message, speaker: &str, playing: bool) -> String {
    let name = match message.role {
        Role::User => "You",
        Role::Model => speaker,
    };
    let mut out = format!("[{}] {}: {}", position, name, message.text);

    if message.image.is_some() {
        out.push_str("\n    [image attached]");
    }

    if message.role == Role::Model {
        let status = if message.is_audio_loading {
            "synthesizing voice...".to_string()
        } else if playing {
            "playing, /stop to halt".to_string()
        } else if message.has_audio() {
            format!("listen with /play {}", position)
        } else {
            "no audio available".to_string()
        };
        out.push_str(&format!("\n    ({})", status));
    }

    out
}

fn speaker_name<D: OutputDevice>(chat: &ChatState<D>) -> String {
    chat.persona()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Persona".to_string())
}

fn print_message<D: OutputDevice>(
    chat: &ChatState<D>,
    out: &mut impl Write,
    position: usize,
    message: &Message,
) -> Result<()> {
    let playing = chat.is_playing(message.id);
    writeln!(
        out,
        "{}",
        render_message(position, message, &speaker_name(chat), playing)
    )?;
    Ok(())
}

fn print_transcript<D: OutputDevice>(chat: &ChatState<D>, out: &mut impl Write) -> Result<()> {
    for (index, message) in chat.messages().iter().enumerate() {
        print_message(chat, out, index + 1, message)?;
    }
    Ok(())
}

fn print_suggestions<D: OutputDevice>(chat: &ChatState<D>, out: &mut impl Write) -> Result<()> {
    let suggestions = chat.suggestions();
    if suggestions.is_empty() {
        writeln!(out, "No suggestions right now.")?;
        return Ok(());
    }
    writeln!(out, "Suggested questions:")?;
    for (index, question) in suggestions.iter().enumerate() {
        writeln!(out, "  {}. {}", index + 1, question)?;
    }
    Ok(())
}

fn send<D: OutputDevice>(chat: &mut ChatState<D>, out: &mut impl Write, text: &str) -> Result<()> {
    match chat.send_message(text) {
        Ok(_) => {
            writeln!(out, "{} is thinking...", speaker_name(chat))?;
        }
        Err(SendRejection::NoPersona) => {
            writeln!(out, "Pick a persona first with /select ID (see /personas).")?;
        }
        Err(SendRejection::Typing) => {
            writeln!(out, "Still waiting for the last reply.")?;
        }
        Err(SendRejection::Empty) => {}
    }
    Ok(())
}

/// Run a command against the chat
pub async fn execute<D: OutputDevice>(
    chat: &mut ChatState<D>,
    command: Command,
    out: &mut impl Write,
) -> Result<Flow> {
    match command {
        Command::Personas => {
            for persona in chat.roster() {
                writeln!(out, "{}", render_persona(persona))?;
            }
        }
        Command::Select(id) => match chat.select_persona(&id) {
            Ok(()) => {
                if let Some(persona) = chat.persona() {
                    writeln!(out, "Now talking to {}, {}.", persona.name, persona.title)?;
                }
                print_transcript(chat, out)?;
                print_suggestions(chat, out)?;
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        Command::Back => {
            chat.leave_conversation();
            writeln!(out, "Back to persona selection. /personas lists them.")?;
        }
        Command::Image(path) => match ImageAttachment::from_path(&path) {
            Ok(image) => {
                chat.attach_image(image);
                writeln!(out, "Attached {}", path.display())?;
            }
            Err(e) => writeln!(out, "Could not attach image: {}", e)?,
        },
        Command::ClearImage => {
            chat.clear_image();
            writeln!(out, "Image removed.")?;
        }
        Command::Play(position) => match chat.message_at(position) {
            Some(message) if message.has_audio() => {
                match chat.toggle_playback(message.id).await {
                    Ok(true) => writeln!(out, "Playing message {}.", position)?,
                    Ok(false) => writeln!(out, "Stopped.")?,
                    Err(e) => {
                        warn!("Playback failed: {}", e);
                        writeln!(out, "{}", e.user_message())?;
                    }
                }
            }
            Some(message) if message.is_audio_loading => {
                writeln!(out, "Voice for message {} is still loading.", position)?
            }
            Some(_) => writeln!(out, "Message {} has no audio.", position)?,
            None => writeln!(out, "No message {}.", position)?,
        },
        Command::Stop => {
            chat.stop_playback();
        }
        Command::Save(position, path) => match chat.message_at(position).and_then(|m| m.audio) {
            Some(audio) => match write_wav(&path, &audio) {
                Ok(()) => writeln!(out, "Saved message {} to {}", position, path.display())?,
                Err(e) => writeln!(out, "Could not save audio: {}", e)?,
            },
            None => writeln!(out, "Message {} has no audio.", position)?,
        },
        Command::Suggest(None) => print_suggestions(chat, out)?,
        Command::Suggest(Some(index)) => match index
            .checked_sub(1)
            .and_then(|i| chat.suggestions().get(i))
        {
            Some(question) => {
                writeln!(out, "You: {}", question)?;
                send(chat, out, question)?;
            }
            None => writeln!(out, "No suggestion {}.", index)?,
        },
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {
            chat.stop_playback();
            return Ok(Flow::Quit);
        }
        Command::Say(text) => send(chat, out, &text)?,
    }
    Ok(Flow::Continue)
}

/// Apply an orchestrator event and print what changed
pub async fn handle_event<D: OutputDevice>(
    chat: &mut ChatState<D>,
    event: ChatEvent,
    out: &mut impl Write,
) -> Result<()> {
    let message_id = match &event {
        ChatEvent::ReplyReady { message, .. } => message.id,
        ChatEvent::SpeechReady { message_id, .. } => *message_id,
    };

    chat.apply_event(event).await;

    // Stale events leave nothing to show
    if let Some(position) = chat.position_of(message_id) {
        if let Some(message) = chat.message(message_id) {
            print_message(chat, out, position, &message)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/personas"), Ok(Command::Personas));
        assert_eq!(
            parse_command("/select  warhol "),
            Ok(Command::Select("warhol".into()))
        );
        assert_eq!(parse_command("/play 3"), Ok(Command::Play(3)));
        assert_eq!(
            parse_command("/save 2 out/reply.wav"),
            Ok(Command::Save(2, PathBuf::from("out/reply.wav")))
        );
        assert_eq!(parse_command("/suggest"), Ok(Command::Suggest(None)));
        assert_eq!(parse_command("/suggest 2"), Ok(Command::Suggest(Some(2))));
        assert_eq!(parse_command("/exit"), Ok(Command::Quit));
        assert_eq!(
            parse_command("Is the weight balanced?"),
            Ok(Command::Say("Is the weight balanced?".into()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("/play").is_err());
        assert!(parse_command("/play 0").is_err());
        assert!(parse_command("/play two").is_err());
        assert!(parse_command("/save 1").is_err());
        assert!(parse_command("/select").is_err());
        assert!(parse_command("/dance").is_err());
    }

    #[test]
    fn test_render_model_message_states() {
        let mut message = Message::model_pending_audio(Uuid::new_v4(), "Gee.");
        assert_eq!(
            render_message(2, &message, "Andy Warhol", false),
            "[2] Andy Warhol: Gee.\n    (synthesizing voice...)"
        );

        message.is_audio_loading = false;
        assert!(render_message(2, &message, "Andy Warhol", false).ends_with("(no audio available)"));
    }

    #[test]
    fn test_render_user_message() {
        let message = Message::user(
            "Look",
            Some(ImageAttachment::from_bytes("image/png", &[0])),
        );
        assert_eq!(
            render_message(1, &message, "Andy Warhol", false),
            "[1] You: Look\n    [image attached]"
        );
    }
}
