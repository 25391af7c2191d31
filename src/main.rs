//! webarchive-extract: convert a .webarchive file into standard HTML

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{info, Level};

use webarchive::core::default_output_path;
use webarchive::env::{generate_env_docs, EnvVar, LogLevel, NoColor};
use webarchive::extract::LocalLayout;
use webarchive::{ExtractOptions, WebArchive};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(name = "webarchive-extract")]
#[command(about = "Convert Apple .webarchive files into standard HTML")]
#[command(version)]
#[command(after_help = generate_env_docs())]
struct Args {
    /// Path to the .webarchive file
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Output HTML file [default: ARCHIVE with an .html extension]
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Embed every resource as a data URL instead of writing a resource directory
    #[arg(short = 's', long = "single-file")]
    single_file: bool,

    /// Log progress to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        LogLevel::get_or_default(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.archive));
    let options = if args.single_file {
        ExtractOptions::single_file()
    } else {
        ExtractOptions::local_paths()
    };

    let result = WebArchive::open(&args.archive).and_then(|archive| {
        if args.single_file {
            return archive.extract(&output, &options);
        }

        let mut layout = LocalLayout::new(&archive, &options);
        if args.verbose {
            layout = layout.on_file(|path| info!(path = %path.display(), "wrote file"));
        }
        layout.extract(&output)
    });

    match result {
        Ok(files) => {
            info!(files, output = %output.display(), "done");
        }
        Err(error) => {
            print_error_message(&format!("{}: {}", args.archive.display(), error));
            process::exit(1);
        }
    }
}

/// Prints an error message to stderr, in red when stderr is a terminal
fn print_error_message(msg: &str) {
    let use_color = atty::is(atty::Stream::Stderr) && !NoColor::get_or_default(false);
    if use_color {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}
