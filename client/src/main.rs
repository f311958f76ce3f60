//! Maya Studio
//!
//! Sends text and a voice description to the Maya1 synthesis service and
//! plays the returned audio.
//!
//! Usage:
//!   # Interactive mode (type text, press Enter to synthesize and play)
//!   cargo run --release -p maya-studio
//!
//!   # Single text mode
//!   cargo run --release -p maya-studio -- --text "Hello <laugh> world"
//!
//!   # Save to a directory instead of playing
//!   cargo run --release -p maya-studio -- --text "Hello world" --output out/ --no-play

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use maya_studio::audio::{PlaybackSink, RodioSink};
use maya_studio::config::{DEFAULT_SERVER, DEFAULT_VOICE_DESCRIPTION};
use maya_studio::repl::{self, ReplOptions, HELP};
use maya_studio::{ClientConfig, SessionController};

#[derive(Parser, Debug)]
#[command(author, version, about = "Maya1 TTS Studio")]
struct Args {
    /// Synthesis service base URL
    #[arg(short, long, env = "MAYA_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Text to synthesize (if not provided, runs in interactive mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Natural-language voice description
    #[arg(short, long, env = "MAYA_VOICE", default_value = DEFAULT_VOICE_DESCRIPTION)]
    voice: String,

    /// Directory for exported WAV files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not start playback automatically
    #[arg(long)]
    no_play: bool,

    /// Request timeout in seconds (0 waits indefinitely)
    #[arg(long, env = "MAYA_TIMEOUT_SECS", default_value = "120")]
    timeout_secs: u64,

    /// Keep at most this many results in history (at least 1)
    #[arg(long, env = "MAYA_HISTORY_LIMIT")]
    history_limit: Option<NonZeroUsize>,
}

impl Args {
    fn config(&self) -> ClientConfig {
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        ClientConfig::new(self.server.clone())
            .with_voice_description(self.voice.clone())
            .with_timeout(timeout)
            .with_history_limit(self.history_limit)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("maya_studio=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.config();
    let session = SessionController::from_config(&config)?;
    let sink: Arc<dyn PlaybackSink> = Arc::new(RodioSink);

    if let Some(text) = args.text {
        // Single text mode
        session.set_text(text);
        let entry = session.submit().await?;
        info!("Synthesized #{} \"{}\"", entry.id, entry.text_preview);

        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)?;
            let path = entry.result.export(dir)?;
            println!("Audio saved to: {}", path.display());
        }
        let result = entry.result;
        let autoplay = !args.no_play;
        tokio::task::spawn_blocking(move || sink.play(&result, autoplay)).await??;
        return Ok(());
    }

    // Interactive mode
    println!("Maya1 TTS Studio - Interactive Mode");
    println!("===================================");
    println!("{HELP}");
    println!();

    let options = ReplOptions {
        autoplay: !args.no_play,
        output_dir: args.output.unwrap_or_else(|| PathBuf::from(".")),
    };
    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = repl::run(&session, sink, &options, stdin, tokio::io::stdout()).await {
        error!("Error: {}", e);
        return Err(e);
    }

    Ok(())
}
