// SPDX-License-Identifier: GPL-3.0-only

use camera_session::Config;
use camera_session::backends::camera::Facing;
use camera_session::constants::{APP_NAME, app_info};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "camera-session")]
#[command(about = "Capture photos and videos from the terminal")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/camera-session/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal viewfinder (default)
    Terminal,

    /// Take a photo and save it to the gallery
    Photo {
        /// Camera to use (front or back)
        #[arg(short, long)]
        facing: Option<Facing>,
    },

    /// Record a video and save it to the gallery
    Video {
        /// Camera to use (front or back)
        #[arg(short, long)]
        facing: Option<Facing>,

        /// Recording duration in seconds (1 to 60)
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=60))]
        duration: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));

    init_logging(&config, terminal_mode)?;

    match cli.command {
        None | Some(Commands::Terminal) => camera_session::terminal::run(&config),
        Some(Commands::Photo { facing }) => cli::take_photo(&config, facing),
        Some(Commands::Video { facing, duration }) => cli::record_video(&config, facing, duration),
    }
}

/// Initialize logging
///
/// Set RUST_LOG to override the configured filter
/// (e.g. RUST_LOG=debug, RUST_LOG=camera_session=debug).
/// The terminal viewer owns the screen, so it logs to a file instead.
fn init_logging(config: &Config, terminal_mode: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if terminal_mode {
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME);
        std::fs::create_dir_all(&log_dir)?;
        let file = std::fs::File::create(log_dir.join("terminal.log"))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_duration_bounds() {
        let parse = |d: &str| Cli::try_parse_from(["camera-session", "video", "--duration", d]);

        assert!(parse("0").is_err());
        assert!(parse("61").is_err());
        match parse("60").unwrap().command {
            Some(Commands::Video { duration, facing }) => {
                assert_eq!(duration, 60);
                assert_eq!(facing, None);
            }
            _ => panic!("expected video command"),
        }
    }

    #[test]
    fn test_facing_argument() {
        let cli = Cli::try_parse_from(["camera-session", "photo", "--facing", "front"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Photo {
                facing: Some(Facing::Front)
            })
        ));
    }
}
