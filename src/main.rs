use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ember_agent::agent::VoiceAgent;
use ember_agent::completion::CompletionClient;
use ember_agent::conversation::ConversationState;
use ember_agent::voice::{AudioCapture, AudioPlayback, SpeechToText, Synthesizer, TextToSpeech};
use ember_agent::{APOLOGY, Config};

/// Ember - voice-first conversational companion
#[derive(Parser)]
#[command(name = "ember", version, about)]
struct Cli {
    /// Writing sample used to derive the persona style guide
    #[arg(long, env = "EMBER_STYLE_SAMPLE")]
    style_sample: Option<String>,

    /// File containing the writing sample
    #[arg(long)]
    style_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Text-only conversation over stdin
    Chat,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

/// Which conversation surface to run
enum Mode {
    Voice,
    Text,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,ember_agent=info",
        1 => "info,ember_agent=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Command::TestMic { duration }) => test_mic(duration).await,
        Some(Command::TestSpeaker) => test_speaker().await,
        Some(Command::TestTts { text }) => test_tts(&text).await,
        Some(Command::Chat) => converse(cli.style_sample, cli.style_file, &Mode::Text).await,
        None => converse(cli.style_sample, cli.style_file, &Mode::Voice).await,
    }
}

/// Construct the full agent stack from configuration
fn build_agent(
    config: &Config,
) -> anyhow::Result<VoiceAgent<CompletionClient, SpeechToText, TextToSpeech>> {
    let completion = CompletionClient::new(
        config.api_keys.perplexity.clone().unwrap_or_default(),
        config.completion.clone(),
    )?;
    let stt = SpeechToText::new(
        config.api_keys.openai.clone().unwrap_or_default(),
        config.voice.stt_model.clone(),
    )?;
    let tts = TextToSpeech::new(
        config.api_keys.elevenlabs.clone().unwrap_or_default(),
        config.voice.voice_id.clone(),
    )?;
    let conversation = ConversationState::new(config.persona.clone());

    Ok(VoiceAgent::new(
        conversation,
        completion,
        stt,
        tts,
        config.voice.capture_window(),
    ))
}

/// Resolve the style-guide writing sample (flag > file > config)
fn resolve_style_sample(
    inline: Option<String>,
    file: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<String> {
    if let Some(sample) = inline {
        return Ok(sample);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(&path)?);
    }
    if let Some(sample) = &config.style_sample {
        return Ok(sample.clone());
    }
    anyhow::bail!(
        "a style sample is required: pass --style-sample/--style-file or set [style] in the config file"
    )
}

#[allow(clippy::future_not_send)]
async fn converse(
    style_sample: Option<String>,
    style_file: Option<PathBuf>,
    mode: &Mode,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let sample = resolve_style_sample(style_sample, style_file, &config)?;

    let mut agent = build_agent(&config)?;

    tracing::info!(persona = %config.persona.name, "deriving persona style guide");
    agent.set_persona_style(&sample).await?;

    match mode {
        Mode::Voice => {
            anyhow::ensure!(config.voice.enabled, "voice is disabled in the config file");
            let mut capture = AudioCapture::new()?;
            let mut playback = AudioPlayback::new()?;
            agent.run(&mut capture, &mut playback).await?;
        }
        Mode::Text => chat_repl(&mut agent).await?,
    }

    Ok(())
}

/// Text-only REPL over stdin
async fn chat_repl(
    agent: &mut VoiceAgent<CompletionClient, SpeechToText, TextToSpeech>,
) -> anyhow::Result<()> {
    use std::io::Write;

    let name = agent.conversation().persona().name.clone();
    println!("You're now chatting with {name}. Type 'exit' or 'quit' to end the conversation.");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        print!("you: ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            println!("Ending the conversation. Goodbye!");
            break;
        }

        match agent.submit_text(text).await {
            Ok(reply) => println!("{name}: {reply}"),
            Err(e) => {
                tracing::warn!(error = %e, "turn failed");
                println!("{name}: {APOLOGY}");
            }
        }
    }

    Ok(())
}

/// Test microphone input
#[allow(
    clippy::future_not_send,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for second in 1..=duration {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let samples = capture.take_buffer();

        let rms = if samples.is_empty() {
            0.0
        } else {
            (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
        };
        let bar_len = (rms * 200.0).min(40.0) as usize;
        println!("{second:>3}s  [{:<40}] rms {rms:.4}", "#".repeat(bar_len));
    }

    capture.stop();
    println!("\nMicrophone test complete.");
    Ok(())
}

/// Test speaker output with a short tone
#[allow(clippy::future_not_send, clippy::cast_precision_loss)]
async fn test_speaker() -> anyhow::Result<()> {
    const TONE_RATE: u32 = 24000;

    println!("Playing a 440 Hz test tone...");

    let samples: Vec<f32> = (0..TONE_RATE)
        .map(|i| {
            let t = i as f32 / TONE_RATE as f32;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    let mut playback = AudioPlayback::new()?;
    playback.play(&samples, TONE_RATE).await?;

    println!("Speaker test complete.");
    Ok(())
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;

    let tts = TextToSpeech::new(
        config.api_keys.elevenlabs.clone().unwrap_or_default(),
        config.voice.voice_id.clone(),
    )?;

    println!("Synthesizing: {text}");
    let audio = tts.synthesize(text).await?;
    println!("Received {} bytes of audio", audio.len());

    let mut playback = AudioPlayback::new()?;
    playback.play_mp3(&audio).await?;

    println!("TTS test complete.");
    Ok(())
}
