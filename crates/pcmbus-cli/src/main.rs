use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pcmbus_engine::{
    devices, render, wav, AudioBus, CpalBackend, Gain, LowPass, PlaybackBackend, PlaybackConfig,
    PlaybackState, SoundSource,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pcmbus", version, about = "Decode and play WAV files through an effect bus")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List output devices
    Devices,
    /// Print the format of a WAV file
    Info { file: String },
    /// Play a WAV file
    Play {
        file: String,
        /// Down-mix to mono before playing
        #[arg(long)]
        mono: bool,
        /// Gain in dB applied on the bus
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        gain_db: f32,
        /// Low-pass cutoff in Hz
        #[arg(long)]
        cutoff: Option<f32>,
        /// Output device name (substring, case-insensitive)
        #[arg(long)]
        device: Option<String>,
        /// Output device index from `devices`
        #[arg(long)]
        index: Option<usize>,
        /// Frames per device buffer
        #[arg(long)]
        buffer: Option<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Devices => devices::print_devices(),
        Command::Info { file } => {
            let sound = wav::decode_file(&file).with_context(|| format!("decoding {file}"))?;
            println!("{file}");
            println!("  frequency: {} Hz", sound.frequency());
            println!("  channels:  {}", sound.channels());
            println!("  frames:    {}", sound.frame_count());
            println!("  duration:  {:.3} s", sound.duration().as_secs_f64());
            Ok(())
        }
        Command::Play { file, mono, gain_db, cutoff, device, index, buffer } => {
            let mut sound = wav::decode_file(&file).with_context(|| format!("decoding {file}"))?;
            if mono {
                sound = sound.to_mono();
            }

            if gain_db != 0.0 || cutoff.is_some() {
                let mut bus = AudioBus::with_source(Box::new(SoundSource::new(sound.clone())));
                if let Some(hz) = cutoff {
                    bus.add(Box::new(LowPass::new(hz)))?;
                }
                if gain_db != 0.0 {
                    bus.add(Box::new(Gain::new(gain_db)))?;
                }
                info!(effects = bus.len(), "rendering through bus");
                sound = render(&mut bus, sound.frequency(), sound.channels(), sound.frame_count())?;
            }

            let cfg = PlaybackConfig { output_name: device, output_index: index, buffer_frames: buffer };
            let mut backend = CpalBackend::new(cfg)?;
            backend.on_stop().register(|| info!("playback stopped"));
            backend.play(&sound)?;

            while backend.poll() == PlaybackState::Playing {
                std::thread::sleep(Duration::from_millis(100));
            }
            Ok(())
        }
    }
}
