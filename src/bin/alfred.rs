//! Alfred
//!
//! Loads the configuration, builds the agent and its tools, and runs the
//! dialogue loop on the configured interface until Ctrl-C or end of input.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alfred::agent::{OpenAiClient, ToolCallingAgent};
use alfred::channels::{
    CommandRecorder, ConsoleInput, ConsoleLines, ConsoleOutput, InputChannel, OutputChannel,
    SpeechOutput, TranscribingInput,
};
use alfred::config::{self, ConfigSource, Interface, LoadedConfig, SecretKey};
use alfred::dialogue::{ActivationSource, DialogueConfig, DialogueLoop, TerminalHotkey, WakeWordListener};
use alfred::tools::{ToolContext, ToolRegistry};
use alfred::VERSION;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "alfred",
    author = "Alfred Contributors",
    version = VERSION,
    about = "Alfred - voice and text assistant",
    long_about = None
)]
struct Cli {
    /// Settings INI file
    #[arg(long, env = "ALFRED_SETTINGS")]
    settings: Option<PathBuf>,

    /// Secrets file (KEY=value lines)
    #[arg(long, env = "ALFRED_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("alfred=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

struct Channels {
    input: Arc<dyn InputChannel>,
    output: Arc<dyn OutputChannel>,
    activation: Vec<Arc<dyn ActivationSource>>,
}

fn build_channels(loaded: &LoadedConfig, client: &Arc<OpenAiClient>) -> anyhow::Result<Channels> {
    let settings = &loaded.settings;
    let hotkey = settings.general.parsed_hotkey()?;
    let lines = ConsoleLines::spawn_stdin();
    let transcript = ConsoleOutput::stdout(settings.general.bot_name.clone());

    let mut activation: Vec<Arc<dyn ActivationSource>> =
        vec![Arc::new(TerminalHotkey::new(lines.clone(), hotkey))];

    let channels = match settings.general.interface {
        Interface::Text => Channels {
            input: Arc::new(ConsoleInput::new(lines)),
            output: Arc::new(transcript),
            activation,
        },
        Interface::Voice => {
            let listener = Arc::new(TranscribingInput::new(
                Arc::new(CommandRecorder::from_settings(&settings.voice)),
                client.clone(),
            ));
            if let Some(wake_word) = settings.voice.wake_word() {
                info!("Listening for wake word '{}'", wake_word);
                activation.push(Arc::new(WakeWordListener::new(listener.clone(), wake_word)));
            }
            Channels {
                input: listener,
                output: Arc::new(SpeechOutput::new(&settings.voice, transcript)),
                activation,
            }
        }
    };
    Ok(channels)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting Alfred v{}", VERSION);

    let settings_path = cli.settings.unwrap_or_else(config::settings_path);
    let secrets_path = cli.env_file.or_else(|| Some(config::secrets_path()));
    let source = ConfigSource::from_process(settings_path, secrets_path);
    let loaded = config::load(&source).context("Failed to load configuration")?;
    let settings = &loaded.settings;

    let api_key = loaded.secrets.require(SecretKey::OpenAiApiKey)?;
    let client = Arc::new(OpenAiClient::new(api_key, settings.model.clone())?);

    let http = reqwest::Client::builder()
        .user_agent(format!("Alfred/{}", VERSION))
        .timeout(Duration::from_secs(settings.model.timeout_secs))
        .build()?;
    let ctx = ToolContext::new(http, client.clone(), client.clone());
    let tools = Arc::new(ToolRegistry::build(settings, &loaded.secrets, &ctx)?);

    let agent = Arc::new(ToolCallingAgent::new(
        client.clone(),
        tools,
        settings.general.bot_context.clone(),
        settings.model.max_iterations,
    ));

    let channels = build_channels(&loaded, &client)?;
    let mut dialogue = DialogueLoop::new(
        DialogueConfig::from_settings(settings),
        agent,
        channels.input,
        channels.output,
        channels.activation,
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                on_signal.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    println!(
        "{} Press Enter ({}) to talk to {}. Ctrl-C to quit.",
        style("●").green(),
        settings.general.hotkey,
        style(&settings.general.bot_name).cyan().bold()
    );

    dialogue.run(&cancel).await?;
    info!("Goodbye");
    Ok(())
}
