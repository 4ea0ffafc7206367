use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use character_voice::voice::DEFAULT_LOCALE;
use character_voice::{Config, Persona, Utterance, VoicePipeline, annotate};

/// Charvoice - Persona speech output for character chatbots
#[derive(Parser)]
#[command(name = "charvoice", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/character-voice/config.toml)
    #[arg(short, long, env = "CHARVOICE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Speak text as a persona into an audio file
    Speak {
        /// Text to speak
        text: Option<String>,
        /// Read the text from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Persona to speak as (jax, viktor, lila, elias)
        #[arg(short, long, env = "CHARVOICE_PERSONA", default_value = "jax")]
        persona: String,
        /// BCP 47 locale, e.g. hi-IN
        #[arg(short, long, default_value = DEFAULT_LOCALE)]
        locale: String,
        /// Output path; .wav writes WAV, anything else MP3
        #[arg(short, long, default_value = "speech.mp3")]
        output: PathBuf,
        /// Translate the text into the locale's language first
        #[arg(long)]
        translate: bool,
    },
    /// Print the prosody markup for text
    Annotate {
        /// Text to annotate
        text: Option<String>,
        /// Read the text from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// List persona voices
    Voices {
        /// Only show one persona
        #[arg(short, long)]
        persona: Option<String>,
    },
    /// List personas
    Personas,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,character_voice=info",
        1 => "info,character_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Command::Speak {
            text,
            file,
            persona,
            locale,
            output,
            translate,
        } => {
            let text = read_text(text, file.as_deref()).await?;
            if translate {
                config.translation.enabled = true;
            }
            speak(&config, Utterance::new(text, locale, persona), &output).await
        }
        Command::Annotate { text, file } => {
            let text = read_text(text, file.as_deref()).await?;
            println!("{}", annotate(&text));
            Ok(())
        }
        Command::Voices { persona } => list_voices(&config, persona.as_deref()),
        Command::Personas => {
            for persona in Persona::ALL {
                println!("{:<8} {}", persona.id(), persona.title());
            }
            Ok(())
        }
    }
}

/// Text from the positional argument, a file, or stdin
async fn read_text(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = file {
        return Ok(tokio::fs::read_to_string(path).await?);
    }

    let mut buf = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut buf).await?;
    Ok(buf)
}

async fn speak(config: &Config, utterance: Utterance, output: &Path) -> anyhow::Result<()> {
    let pipeline = VoicePipeline::from_config(config)?;
    let report = pipeline.speak(&utterance, output).await?;

    println!(
        "{} ({}, {}) -> {} [{} sentences, {} ms, {} bytes{}]",
        report.persona.name(),
        report.voice_id,
        report.locale,
        report.path.display(),
        report.sentences,
        report.duration_ms,
        report.bytes,
        if report.fallback { ", plain-text fallback" } else { "" },
    );

    Ok(())
}

fn list_voices(config: &Config, persona: Option<&str>) -> anyhow::Result<()> {
    let filter = persona.map(str::parse::<Persona>).transpose()?;

    let catalog = config.voice_catalog();
    for voice in catalog.voices() {
        if filter.is_some_and(|p| p != voice.persona) {
            continue;
        }
        println!(
            "{:<8} {:<7} {:<28} rate {:.2}{}",
            voice.persona.id(),
            voice.locale,
            voice.voice_id,
            voice.speaking_rate,
            if voice.ssml { "  ssml" } else { "" },
        );
    }

    Ok(())
}
