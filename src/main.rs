use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rdbgen::scan::{MAX_THREADS, ScanOptions, default_threads};
use rdbgen::{SymphoniaTagReader, build_with};
use std::io::IsTerminal;
use std::path::PathBuf;

mod inspect;
mod logging;

const DEFAULT_DB_NAME: &str = "database.rdb";

#[derive(Parser, Debug)]
#[command(name = "rdbgen")]
#[command(version, about = "Build compact music databases for playback devices")]
struct Cli {
    /// Increase logging verbosity (use together with RUST_LOG for fine control).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a music directory and write a fresh database
    Build {
        /// Directory to scan (usually the mounted device root or its music folder)
        music_dir: PathBuf,

        /// Output file; defaults to database.rdb inside MUSIC_DIR
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of tag reading threads (defaults to CPU count - 1, clamped to 1..=256)
        #[arg(long)]
        threads: Option<usize>,

        /// Follow symlinks during traversal
        #[arg(long, default_value_t = false)]
        follow_symlinks: bool,

        /// Do not draw a progress bar
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },

    /// Print header fields and section sizes
    Info { db: PathBuf },

    /// List every entry in stored order
    List { db: PathBuf },

    /// List artist runs with their first entry
    Artists { db: PathBuf },

    /// List album runs with their first entry
    Albums { db: PathBuf },

    /// Check sort order, string references and both indices
    Verify { db: PathBuf },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = match cli.cmd {
        Command::Build { .. } => logging::Profile::Build,
        _ => logging::Profile::Inspect,
    };
    logging::init(profile, cli.verbose)?;

    match cli.cmd {
        Command::Build {
            music_dir,
            output,
            threads,
            follow_symlinks,
            no_progress,
        } => {
            if !music_dir.is_dir() {
                return Err(anyhow!("{} is not a directory", music_dir.display()));
            }
            let output = output.unwrap_or_else(|| music_dir.join(DEFAULT_DB_NAME));

            let opts = ScanOptions {
                threads: threads.map(|n| n.clamp(1, MAX_THREADS)).unwrap_or_else(default_threads),
                follow_symlinks,
                progress: !no_progress && std::io::stderr().is_terminal(),
            };

            let summary = build_with(&music_dir, &output, &SymphoniaTagReader, &opts)
                .with_context(|| format!("Failed to build {}", output.display()))?;

            println!("Tracks:        {}", summary.track_count);
            println!("Artists:       {}", summary.artist_count);
            println!("Albums:        {}", summary.album_count);
            println!("Database size: {}", inspect::format_size(summary.file_bytes as u64));
            if summary.tag_failures > 0 {
                println!("Untagged:      {} (defaults used)", summary.tag_failures);
            }
            if summary.skipped_dirs > 0 {
                println!("Skipped:       {} unreadable entries (see log)", summary.skipped_dirs);
            }
            Ok(())
        }

        Command::Info { db } => inspect::run_info(&db),
        Command::List { db } => inspect::run_list(&db),
        Command::Artists { db } => inspect::run_artists(&db),
        Command::Albums { db } => inspect::run_albums(&db),
        Command::Verify { db } => inspect::run_verify(&db),
    }
}
