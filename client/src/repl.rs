//! Interactive terminal front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::audio::PlaybackSink;
use crate::codec::PlayableResult;
use crate::error::Error;
use crate::history::EntryId;
use crate::session::SessionController;
use crate::tags::DEFAULT_TAGS;

/// How to pick a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// 1-based position in the listing, newest first
    Index(usize),
    Id(EntryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the draft text and synthesize it
    Say(String),
    Submit,
    Tag(String),
    Tags,
    Voice(String),
    Draft,
    History,
    Play(Selector),
    Save(Option<PathBuf>),
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with(':') {
            return Some(Command::Say(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let cmd = match (name, arg) {
            (":q" | ":quit", _) => Command::Quit,
            (":go", _) => Command::Submit,
            (":tags", _) => Command::Tags,
            (":d" | ":draft", _) => Command::Draft,
            (":h" | ":history", _) => Command::History,
            (":help", _) => Command::Help,
            (":t", tag) if !tag.is_empty() => Command::Tag(tag.to_string()),
            (":v", voice) if !voice.is_empty() => Command::Voice(voice.to_string()),
            (":save", "") => Command::Save(None),
            (":save", dir) => Command::Save(Some(PathBuf::from(dir))),
            (":p", arg) => match parse_selector(arg) {
                Some(selector) => Command::Play(selector),
                None => Command::Invalid(format!("Usage: :p <n> or :p #<id>, got '{arg}'")),
            },
            _ => Command::Invalid(format!("Unknown command '{line}', try :help")),
        };
        Some(cmd)
    }
}

fn parse_selector(arg: &str) -> Option<Selector> {
    if let Some(id) = arg.strip_prefix('#') {
        return id.parse().ok().map(Selector::Id);
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Some(Selector::Index(n)),
        _ => None,
    }
}

pub struct ReplOptions {
    pub autoplay: bool,
    /// Default directory for `:save`
    pub output_dir: PathBuf,
}

pub const HELP: &str = "\
Type text and press Enter to synthesize and play it.
Commands:
  :t <tag>     - Append a <tag> cue to the draft
  :tags        - List the default cues
  :v <voice>   - Change the voice description
  :d           - Show the draft
  :go          - Synthesize the draft as it is
  :h           - List history, newest first
  :p <n>|#<id> - Play a history entry
  :save [dir]  - Export the current audio as WAV
  :q or :quit  - Exit";

/// Run the prompt until EOF or `:q`.
pub async fn run<R, W>(
    session: &SessionController,
    sink: Arc<dyn PlaybackSink>,
    options: &ReplOptions,
    input: R,
    mut out: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        out.write_all(b"> ").await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(cmd) = Command::parse(&line) else {
            continue;
        };

        let reply = match cmd {
            Command::Quit => {
                out.write_all(b"Goodbye!\n").await?;
                break;
            }
            Command::Help => HELP.to_string(),
            Command::Invalid(msg) => msg,
            Command::Tags => DEFAULT_TAGS
                .iter()
                .map(|tag| format!("<{tag}>"))
                .collect::<Vec<_>>()
                .join(" "),
            Command::Tag(tag) => format!("Draft: {}", session.insert_tag(&tag)),
            Command::Voice(voice) => {
                session.set_voice_description(voice.as_str());
                format!("Voice changed to: {voice}")
            }
            Command::Draft => {
                let draft = session.draft();
                format!("Voice: {}\nText: {}", draft.voice_description, draft.text)
            }
            Command::History => format_history(session),
            Command::Say(text) => {
                session.set_text(text);
                synthesize(session, &sink, options).await
            }
            Command::Submit => synthesize(session, &sink, options).await,
            Command::Play(selector) => play_entry(session, &sink, selector).await,
            Command::Save(dir) => {
                save_current(session, dir.as_deref().unwrap_or(options.output_dir.as_path()))
            }
        };

        if !reply.is_empty() {
            out.write_all(reply.as_bytes()).await?;
            out.write_all(b"\n").await?;
        }
    }

    out.flush().await?;
    Ok(())
}

async fn synthesize(
    session: &SessionController,
    sink: &Arc<dyn PlaybackSink>,
    options: &ReplOptions,
) -> String {
    match session.submit().await {
        Ok(entry) => {
            let mut reply = format!("#{} \"{}\"", entry.id, entry.text_preview);
            if let Err(e) = play(sink, entry.result, options.autoplay).await {
                reply.push_str(&format!("\nPlayback failed: {e}"));
            }
            reply
        }
        // Nothing to say: the draft was empty.
        Err(Error::Validation) => String::new(),
        Err(e) if e.is_user_facing() => {
            format!("Failed to synthesize audio ({e}). Ensure the synthesis service is running.")
        }
        Err(e) => e.to_string(),
    }
}

async fn play_entry(
    session: &SessionController,
    sink: &Arc<dyn PlaybackSink>,
    selector: Selector,
) -> String {
    let id = match selector {
        Selector::Id(id) => id,
        Selector::Index(n) => match session.history_id_at(n - 1) {
            Some(id) => id,
            None => return format!("No history entry {n}"),
        },
    };

    match session.select_history(id) {
        Ok(result) => match play(sink, result, true).await {
            Ok(()) => String::new(),
            Err(e) => format!("Playback failed: {e}"),
        },
        Err(e) => e.to_string(),
    }
}

async fn play(sink: &Arc<dyn PlaybackSink>, result: PlayableResult, autoplay: bool) -> Result<()> {
    let sink = Arc::clone(sink);
    tokio::task::spawn_blocking(move || sink.play(&result, autoplay)).await?
}

fn format_history(session: &SessionController) -> String {
    let history = session.history();
    if history.is_empty() {
        return "Your generation history will appear here.".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>3}. [{}] #{} \"{}\"",
                i + 1,
                entry.created_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                entry.id,
                entry.text_preview
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn save_current(session: &SessionController, dir: &Path) -> String {
    let Some(current) = session.current() else {
        return "No audio generated yet".to_string();
    };
    match current.export(dir) {
        Ok(path) => format!("Audio saved to: {}", path.display()),
        Err(e) => {
            error!("Export to {} failed: {}", dir.display(), e);
            format!("Could not save audio: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_say_command() {
        assert_eq!(
            Command::parse("  Hello <laugh> world "),
            Some(Command::Say("Hello <laugh> world".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(Command::parse(":t whisper"), Some(Command::Tag("whisper".into())));
        assert_eq!(
            Command::parse(":v Old American man, deep voice"),
            Some(Command::Voice("Old American man, deep voice".into()))
        );
        assert_eq!(Command::parse(":p 2"), Some(Command::Play(Selector::Index(2))));
        assert_eq!(
            Command::parse(":p #1700000000000"),
            Some(Command::Play(Selector::Id("1700000000000".parse().unwrap())))
        );
        assert_eq!(Command::parse(":save"), Some(Command::Save(None)));
        assert_eq!(
            Command::parse(":save /tmp/out"),
            Some(Command::Save(Some(PathBuf::from("/tmp/out"))))
        );
        assert_eq!(Command::parse(":quit"), Some(Command::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(Command::parse(":p 0"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse(":p abc"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse(":t"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse(":bogus"), Some(Command::Invalid(_))));
    }
}
