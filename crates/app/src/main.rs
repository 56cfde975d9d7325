use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use scrollreel_core::{AppConfig, ScrollReelError, SequenceSource};
use tracing_subscriber::EnvFilter;

mod manifest;
mod simulate;

use manifest::Manifest;
use simulate::SimulationOptions;

fn main() -> scrollreel_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            manifest,
            config,
            viewport_width,
            viewport_height,
            step,
            events_per_step,
            fail_frame,
            reduced_motion,
        } => {
            let options = SimulationOptions {
                viewport_width,
                viewport_height,
                step,
                events_per_step,
                fail_frames: fail_frame,
                reduced_motion,
            };
            run_simulate(&manifest, config.as_deref(), &options)
        }
        Commands::Frames { path, count, ext } => run_frames(&path, &count, ext.as_deref()),
        Commands::Check { dir, count, ext } => run_check(&dir, &count, ext.as_deref()),
    }
}

fn run_simulate(
    manifest: &Path,
    config: Option<&Path>,
    options: &SimulationOptions,
) -> scrollreel_core::Result<()> {
    tracing::info!(?manifest, ?config, "simulating scroll");

    let mut manifest = Manifest::load(manifest)?;
    if let Some(config) = config {
        manifest.config = AppConfig::load(config)?;
    }

    let report = simulate::run(&manifest, options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_frames(path: &str, count: &str, ext: Option<&str>) -> scrollreel_core::Result<()> {
    let source = sequence_source(path, count, ext)?;
    for number in 1..=source.count() {
        println!("{}", source.frame_url(number));
    }
    Ok(())
}

fn run_check(dir: &Path, count: &str, ext: Option<&str>) -> scrollreel_core::Result<()> {
    let source = sequence_source(&dir.to_string_lossy(), count, ext)?;
    let missing = missing_frames(dir, &source);

    if missing.is_empty() {
        tracing::info!(?dir, frames = source.count(), "all frames present");
        return Ok(());
    }

    for name in &missing {
        tracing::warn!(frame = %name, "frame missing; it will settle as failed and never draw");
        println!("missing: {name}");
    }
    Err(ScrollReelError::msg(format!(
        "{} of {} frames missing in {}",
        missing.len(),
        source.count(),
        dir.display()
    )))
}

fn sequence_source(
    path: &str,
    count: &str,
    ext: Option<&str>,
) -> scrollreel_core::Result<SequenceSource> {
    let mut scrub = AppConfig::default().scrub;
    if let Some(ext) = ext {
        scrub.frame_extension = ext.trim_start_matches('.').to_string();
    }
    SequenceSource::from_attributes(Some(path), Some(count), &scrub)
}

/// File names of frames in `source` that do not exist below `dir`.
fn missing_frames(dir: &Path, source: &SequenceSource) -> Vec<String> {
    (1..=source.count())
        .map(|number| source.frame_name(number))
        .filter(|name| !dir.join(name).is_file())
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Scroll-driven media scrubbing toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scroll a headless page from top to bottom and report every scrubber.
    Simulate {
        /// JSON manifest describing the page layout.
        manifest: PathBuf,
        /// Optional JSON config replacing the manifest's own.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1280.0)]
        viewport_width: f64,
        #[arg(long, default_value_t = 800.0)]
        viewport_height: f64,
        /// Scroll distance between ticks, in pixels.
        #[arg(long, default_value_t = 50.0)]
        step: f64,
        /// Scroll events fired per tick.
        #[arg(long, default_value_t = 3)]
        events_per_step: usize,
        /// 1-based frame number that fails to load. Repeatable.
        #[arg(long)]
        fail_frame: Vec<usize>,
        /// Behave as if the user prefers reduced motion.
        #[arg(long)]
        reduced_motion: bool,
    },
    /// Print the frame URLs of a sequence.
    Frames {
        /// Base path of the sequence.
        #[arg(long)]
        path: String,
        /// Number of frames.
        #[arg(long)]
        count: String,
        /// File extension, defaults to webp.
        #[arg(long)]
        ext: Option<String>,
    },
    /// Verify every frame of a sequence exists on disk.
    Check {
        /// Directory holding the frames.
        dir: PathBuf,
        #[arg(long)]
        count: String,
        #[arg(long)]
        ext: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulate_arguments() {
        let cli = Cli::try_parse_from([
            "scrollreel",
            "simulate",
            "page.json",
            "--viewport-width",
            "390",
            "--fail-frame",
            "3",
            "--fail-frame",
            "7",
            "--reduced-motion",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate {
                viewport_width,
                fail_frame,
                reduced_motion,
                viewport_height,
                ..
            } => {
                assert_eq!(viewport_width, 390.0);
                assert_eq!(viewport_height, 800.0);
                assert_eq!(fail_frame, vec![3, 7]);
                assert!(reduced_motion);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn frames_requires_a_count() {
        assert!(Cli::try_parse_from(["scrollreel", "frames", "--path", "seq"]).is_err());
    }

    #[test]
    fn sequence_source_accepts_dotted_extensions() {
        let source = sequence_source("seq", "2", Some(".jpg")).unwrap();
        assert_eq!(source.frame_url(2), "seq/frame_002.jpg");
        assert!(sequence_source("seq", "0", None).is_err());
    }

    #[test]
    fn reports_missing_frames_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = SequenceSource::new(dir.path().to_string_lossy(), 3).unwrap();
        std::fs::write(dir.path().join("frame_001.webp"), b"").unwrap();
        std::fs::write(dir.path().join("frame_003.webp"), b"").unwrap();

        assert_eq!(missing_frames(dir.path(), &source), vec!["frame_002.webp"]);
        assert!(run_check(dir.path(), "3", None).is_err());
        assert!(run_check(dir.path(), "1", None).is_ok());
    }
}
