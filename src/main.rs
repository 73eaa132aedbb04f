//! OttoCook, a conversational chef assistant.
//!
//! ```text
//! ottocook [--verbose] [--quiet] [--voice] ...
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ottocook::agent::{Agent, ChatClient};
use ottocook::domain::Notifier;
use ottocook::speech::{
    self, AzureClient, CpalPlayer, Ear, EarConfig, Mouth, MouthConfig, SpeakingNotifier,
    Transcriber, TranscriberConfig,
};
use ottocook::ui::{CliNotifier, Console};
use ottocook::{
    App, Engine, KeywordParser, MemorySource, MemoryStore, Supervisor, SupervisorConfig, Watcher,
    WatcherConfig,
};

/// OttoCook, a conversational chef assistant
#[derive(Parser)]
#[command(name = "ottocook", version, about)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Disable all logging
    #[arg(long, short)]
    quiet: bool,

    /// File to write logs to ("stderr" routes to the console)
    #[arg(long, default_value = ".otto-logs/otto.log")]
    log_file: String,

    /// Disable text-to-speech even if Azure keys are set
    #[arg(long)]
    no_speech: bool,

    /// Persist the TTS audio cache to disk (existing entries are read
    /// even when false)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    disk_cache: bool,

    /// Directory for the persistent TTS audio cache
    #[arg(long, default_value = ".otto-cache")]
    cache_dir: PathBuf,

    /// Disable the AI agent even if GPT keys are set
    #[arg(long)]
    no_ai: bool,

    /// Enable voice input via local Whisper STT
    #[arg(long)]
    voice: bool,

    /// Path to the whisper-cpp CLI binary
    #[arg(long, default_value = "whisper-cli")]
    whisper_bin: String,

    /// Path to the Whisper GGML model file
    #[arg(long, default_value = "bin/ggml-small.bin")]
    whisper_model: PathBuf,

    /// Seconds per voice transcription chunk
    #[arg(long, default_value_t = 2)]
    record_secs: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "off"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    // Logs go to a file by default so the REPL stays clean.
    let (writer, _guard) = if cli.log_file == "stderr" || cli.log_file.is_empty() {
        tracing_appender::non_blocking(std::io::stderr())
    } else {
        let path = PathBuf::from(&cli.log_file);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .map_or_else(|| "otto.log".to_string(), |n| n.to_string_lossy().into_owned());
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("warning: could not create log dir {}: {e}", dir.display());
        }
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_ansi(false)
        .with_writer(writer)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ottocook::Result<()> {
    // Shared collaborators.
    let recipes = Arc::new(MemorySource::new());
    let store = Arc::new(MemoryStore::new());
    let parser = Arc::new(KeywordParser::new());
    let console = Console::new();
    let text_notifier: Arc<dyn Notifier> = Arc::new(CliNotifier::new(console));
    let engine = Arc::new(Engine::new(Arc::clone(&recipes), Arc::clone(&store)));

    // Root cancellation observed by every loop.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Speech output, when Azure credentials are present.
    let azure_key = std::env::var(speech::ENV_AZURE_SPEECH_KEY).unwrap_or_default();
    let azure_region = std::env::var(speech::ENV_AZURE_SPEECH_REGION).unwrap_or_default();

    let mut mouth: Option<Mouth<AzureClient, CpalPlayer>> = None;
    let mut active_notifier: Arc<dyn Notifier> = Arc::clone(&text_notifier);

    if !azure_key.is_empty() && !azure_region.is_empty() && !cli.no_speech {
        match CpalPlayer::new() {
            Ok(player) => {
                let tts = AzureClient::new(azure_key, azure_region.clone());
                let m = Mouth::new(
                    tts,
                    player,
                    MouthConfig {
                        cache_dir: Some(cli.cache_dir.clone()),
                        disk_write: cli.disk_cache,
                        ..MouthConfig::default()
                    },
                );
                m.start(shutdown_rx.clone());
                m.prefetch(&speech::thinking_fillers());
                m.prefetch(&speech::listening_fillers());
                active_notifier = Arc::new(SpeakingNotifier::new(
                    Arc::clone(&text_notifier),
                    m.clone(),
                ));
                tracing::info!(voice = speech::DEFAULT_VOICE, region = %azure_region, "TTS enabled");
                mouth = Some(m);
            }
            Err(e) => {
                tracing::error!(error = %e, "audio player init failed, speech disabled");
            }
        }
    } else if !cli.no_speech {
        tracing::info!(
            "TTS disabled: set {} and {} env vars to enable",
            speech::ENV_AZURE_SPEECH_KEY,
            speech::ENV_AZURE_SPEECH_REGION
        );
    }

    // Background timer loops.
    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&store),
        Arc::clone(&active_notifier),
        SupervisorConfig::default(),
    ));
    supervisor.spawn(shutdown_rx.clone());

    let watcher = Arc::new(Watcher::new(
        Arc::clone(&store),
        Arc::clone(&recipes),
        Arc::clone(&active_notifier),
        WatcherConfig::default(),
    ));
    watcher.spawn(shutdown_rx.clone());

    // AI agent, when GPT credentials are present.
    let gpt_key = std::env::var("GPT_CHAT_KEY").unwrap_or_default();
    let gpt_endpoint = std::env::var("GPT_CHAT_ENDPOINT").unwrap_or_default();

    let agent = if !gpt_key.is_empty() && !gpt_endpoint.is_empty() && !cli.no_ai {
        tracing::info!("AI agent enabled");
        Some(Agent::new(ChatClient::new(gpt_endpoint, gpt_key)))
    } else {
        if !cli.no_ai {
            tracing::info!("AI agent disabled: set GPT_CHAT_KEY and GPT_CHAT_ENDPOINT env vars to enable");
        }
        None
    };

    // Voice input. A missing model is the one startup failure that
    // exits non-zero.
    let mut voice_rx = None;
    if cli.voice {
        let transcriber = Transcriber::new(TranscriberConfig {
            whisper_bin: cli.whisper_bin.clone(),
            model_path: cli.whisper_model.clone(),
            temp_dir: PathBuf::from(".otto-stt"),
        })?;

        let ear = Arc::new(Ear::new(
            mouth.clone(),
            transcriber,
            EarConfig {
                chunk_secs: cli.record_secs.max(1),
                ..EarConfig::default()
            },
        ));
        voice_rx = Some(ear.text_channel());

        // Mouth speaking events gate the ear so the wake detector
        // never triggers on our own playback.
        if let Some(m) = &mouth {
            let ear_mute = Arc::clone(&ear);
            let mut speaking = m.speaking_changes();
            let mut mute_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        changed = speaking.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            if *speaking.borrow() {
                                ear_mute.mute();
                            } else {
                                ear_mute.unmute();
                            }
                        }
                        _ = mute_shutdown.changed() => return,
                    }
                }
            });
        }

        let ear_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = ear.run(ear_shutdown).await {
                tracing::error!(error = %e, "ear failed");
            }
        });
        tracing::info!(
            bin = %cli.whisper_bin,
            model = %cli.whisper_model.display(),
            chunk_secs = cli.record_secs,
            "voice input enabled"
        );
    }

    // Typed input off stdin.
    let (typed_tx, typed_rx) = tokio::sync::mpsc::channel::<String>(16);
    let mut stdin_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        use tokio::io::{AsyncBufReadExt, BufReader};
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if typed_tx.send(line).await.is_err() {
                            return;
                        }
                    }
                    _ => return,
                },
                _ = stdin_shutdown.changed() => return,
            }
        }
    });

    println!("OttoCook — your kitchen copilot.");
    if cli.voice {
        println!("  Voice mode ON — say \"Hey Chef\" to activate, or type commands.");
        println!("  Type 'quit' to exit.");
    } else {
        println!("  Type 'help' for commands, 'quit' to exit.");
    }
    println!();

    let mut app = App::new(engine, parser, mouth, agent, console, shutdown_tx.clone());

    tokio::select! {
        () = app.run(typed_rx, voice_rx, shutdown_rx) => {}
        result = tokio::signal::ctrl_c() => {
            if result.is_ok() {
                tracing::info!("interrupt received, shutting down");
            }
        }
    }
    let _ = shutdown_tx.send(true);

    Ok(())
}
