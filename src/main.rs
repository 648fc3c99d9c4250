// Pcmplay - plays a base64-encoded buffer of 16-bit signed PCM
// through the system audio output

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use pcmplay::{decode, AudioOutputSession, DEFAULT_SAMPLE_RATE};

// Extra wait after the clip length so the device drains its last period
const DRAIN_PAD: Duration = Duration::from_millis(250);

/// Play base64-encoded 16-bit signed little-endian PCM through the default audio output
#[derive(Parser)]
#[command(name = "pcmplay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base64 PCM data (reads stdin when neither DATA nor --input is given)
    #[arg(value_name = "DATA")]
    data: Option<String>,

    /// Read the base64 PCM data from a file
    #[arg(short, long, value_name = "FILE", conflicts_with = "data")]
    input: Option<PathBuf>,

    /// Sample rate in Hz; unparsable values fall back to 44100
    #[arg(short, long, default_value = "44100")]
    sample_rate: String,

    /// Channel count
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=2))]
    channels: u16,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let text = read_data(&cli)?;

    // The sample-rate field is free text; anything unparsable means 44100
    let sample_rate = cli
        .sample_rate
        .trim()
        .parse()
        .unwrap_or(DEFAULT_SAMPLE_RATE);

    let mut session = AudioOutputSession::new();
    session.configure(sample_rate, cli.channels)?;
    let format = session.format().context("output session not configured")?;

    let buffer = decode(&text, format)?;
    let duration = buffer.duration();
    log::info!(
        "playing {} frame(s), {:.3} s",
        buffer.frame_count,
        duration.as_secs_f64()
    );
    session.play(buffer)?;

    // Scheduling is fire-and-forget; hold the process open until the clip ends
    thread::sleep(duration + DRAIN_PAD);
    Ok(())
}

fn read_data(cli: &Cli) -> Result<String> {
    if let Some(data) = &cli.data {
        return Ok(data.clone());
    }
    if let Some(path) = &cli.input {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read input file: {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok(text)
}
