//! splatview
//!
//! Interactive viewer for point-splat scenes.
//!
//! Features:
//! - Open a scene from the command line, a file dialog (`O`) or drag and drop
//! - Orbit with the left mouse button, zoom with the wheel or a pinch
//! - List previously generated scenes
//! - Generate a scene from an image with the external SHARP model

mod browser;
mod generator;
mod logging;

use clap::{Parser, Subcommand};
use generator::{DEFAULT_SHARP_BIN, GenerateRequest};
use logging::LoggingConfig;
use splatview_window::ViewerConfig;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

/// splatview - Point-Splat Scene Viewer
#[derive(Parser, Debug)]
#[command(name = "splatview")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene file to open
    file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Open the viewer, optionally loading a scene
    View {
        /// Scene file to open
        file: Option<PathBuf>,
    },
    /// List the scenes found in a directory
    List {
        /// Directory to scan, including one level of subdirectories
        dir: PathBuf,
    },
    /// Generate a scene from an image, then open it
    Generate {
        /// Input image
        image: PathBuf,

        /// Directory that receives the generated scene
        #[arg(short, long)]
        output: PathBuf,

        /// SHARP executable
        #[arg(long, default_value = DEFAULT_SHARP_BIN)]
        sharp_bin: PathBuf,

        /// Only generate; do not open the viewer
        #[arg(long)]
        no_view: bool,
    },
}

fn main() {
    let args = Args::parse();
    logging::init_logging(&LoggingConfig::new(args.log_level.as_str()));

    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        None => view(args.file),
        Some(Command::View { file }) => view(file.or(args.file)),
        Some(Command::List { dir }) => {
            let scenes = browser::list_scenes(&dir)?;
            if scenes.is_empty() {
                println!("No scenes found in {}", dir.display());
            }
            for scene in scenes {
                println!("{}\t{}", scene.name, scene.path.display());
            }
            Ok(())
        }
        Some(Command::Generate {
            image,
            output,
            sharp_bin,
            no_view,
        }) => {
            let request = GenerateRequest::new(image, output).with_sharp_bin(sharp_bin);
            let scene = generator::generate_scene(&request)?;
            println!("{}", scene.display());
            if no_view {
                return Ok(());
            }
            view(Some(scene))
        }
    }
}

fn view(file: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    info!("Starting splatview");
    splatview_window::run(ViewerConfig::default().with_initial_scene(file))?;
    Ok(())
}
