//! rill - command-line harness for the realtime DAW core.
//!
//! Spawns the audio thread (backed by cpal), wires a control-thread UI loop
//! reading simple text commands from stdin, and shuts both down cleanly on
//! Ctrl+C.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rill_engine::driver::{self, ControlHandle};
use rill_engine::Op;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rill")]
#[command(author, version, about = "Realtime DAW core harness", long_about = None)]
struct Args {
    /// Output sample rate in Hz.
    #[arg(long, default_value_t = 48000)]
    sample_rate: u32,

    /// Tempo in beats per minute, used for beat/frame conversion.
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,

    /// Output device name (substring match), or the platform default if unset.
    #[arg(long)]
    device: Option<String>,

    /// Live tracks to activate at startup.
    #[arg(long, default_value_t = 1)]
    tracks: usize,

    /// Voices per track; must match the library's compiled-in voice count.
    #[arg(long, default_value_t = rill_engine::VOICES)]
    voices: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if args.voices != rill_engine::VOICES {
        anyhow::bail!(
            "--voices {} does not match the compiled-in voice count {}",
            args.voices,
            rill_engine::VOICES
        );
    }

    let (engine, control) = driver::split(args.sample_rate as f32, args.bpm, args.tracks)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let stream = build_output_stream(&args, engine)?;
    stream.play()?;

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = shutdown_requested.clone();
    ctrlc::set_handler(move || {
        ctrlc_flag.store(true, Ordering::SeqCst);
    })?;

    println!("rill realtime harness ready.");
    println!("commands: note <n>, off <n>, play, record <track>, seek <frame>, reset, quit");
    run_ui_loop(&control, &shutdown_requested)?;

    control.request_shutdown();
    tracing::info!("shutdown requested, stream will drain and drop");
    Ok(())
}

/// Resolves the output device (by name substring, or the platform default)
/// and builds a cpal stream that pulls one mono block per callback from
/// `engine` and fans it out to every output channel.
fn build_output_stream(args: &Args, mut engine: rill_engine::driver::AudioEngine) -> anyhow::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = match &args.device {
        Some(name) => {
            let needle = name.to_lowercase();
            host.output_devices()?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow::anyhow!("no output device matching '{name}'"))?
        }
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no default output device"))?,
    };
    tracing::info!(device = %device.name().unwrap_or_default(), "output device selected");

    let supported = device.default_output_config()?;
    let channels = supported.channels() as usize;
    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(args.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut mono_scratch = vec![0.0f32; rill_core::MAX_BLOCK_LEN];
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels.max(1);
            if mono_scratch.len() < frames {
                mono_scratch.resize(frames, 0.0);
            }
            let mono = &mut mono_scratch[..frames];
            engine.process_block(mono);
            for (frame_idx, sample) in mono.iter().enumerate() {
                for ch in 0..channels {
                    data[frame_idx * channels + ch] = *sample;
                }
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;
    Ok(stream)
}

/// Reads whitespace-separated commands from stdin until EOF, `quit`, or a
/// Ctrl+C-triggered shutdown, translating each into a [`ControlHandle`] call.
/// Unknown or malformed lines are ignored rather than treated as fatal.
fn run_ui_loop(control: &ControlHandle, shutdown_requested: &AtomicBool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        if shutdown_requested.load(Ordering::SeqCst) {
            return Ok(());
        }
        print!("> ");
        io::stdout().flush().ok();
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("note") => {
                if let Some(note) = parts.next().and_then(|s| s.parse().ok()) {
                    if control.note_on(note).is_err() {
                        tracing::warn!(note, "note ring full, dropping note-on");
                    }
                }
            }
            Some("off") => {
                if let Some(note) = parts.next().and_then(|s| s.parse().ok()) {
                    control.note_off(note).ok();
                }
            }
            Some("play") => {
                control.push_op(Op::TogglePlay).ok();
            }
            Some("record") => {
                if let Some(track) = parts.next().and_then(|s| s.parse().ok()) {
                    control.push_op(Op::ToggleRecord(track)).ok();
                }
            }
            Some("seek") => {
                if let Some(frame) = parts.next().and_then(|s| s.parse().ok()) {
                    control.push_op(Op::Seek(frame)).ok();
                }
            }
            Some("reset") => {
                control.push_op(Op::Reset).ok();
            }
            Some("quit") | Some("exit") => return Ok(()),
            _ => {}
        }
    }
}
