//! chronicle CLI
//!
//! Replays the history of a git repository into an in-memory snapshot store
//! and reports on the result.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;

use chronicle_replay::{RefResolver, ReplayProgress, SnapshotReplayer};
use chronicle_source::GitSource;
use chronicle_storage::{SearchExpression, SnapshotRepo};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use config::ChronicleConfig;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "chronicle - replay git history into a content-addressed snapshot store", long_about = None)]
struct Cli {
    /// Repository to read (clone target when --url is given)
    #[arg(short, long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Clone this URL into --repo before reading
    #[arg(long, global = true)]
    url: Option<String>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List references that resolve to commits
    Seeds {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print commits in replay order
    Log {
        /// Stop after this many commits (the whole commit graph is still loaded)
        #[arg(short = 'n', long)]
        max_commits: Option<usize>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Replay history and print the content of every tip snapshot
    Replay {
        /// Stop after this many commits (the whole commit graph is still loaded)
        #[arg(short = 'n', long)]
        max_commits: Option<usize>,
        /// Fail on submodule entries instead of skipping them
        #[arg(long)]
        strict_gitlinks: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let fallback = if verbose { "chronicle=debug" } else { "chronicle=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_source(cli: &Cli) -> Result<GitSource> {
    let source = match &cli.url {
        Some(url) => GitSource::clone_from(url, &cli.repo)?,
        None => GitSource::open(&cli.repo)?,
    };
    Ok(source)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = ChronicleConfig::load_or_default(cli.config.as_deref())?;
    let source = open_source(&cli)?;

    match cli.command {
        Commands::Seeds { json } => {
            let resolved = RefResolver::new(&source)
                .with_peel_depth(config.replay.peel_depth_limit)
                .resolve_references()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                for reference in &resolved {
                    println!("{} {}", style(reference.commit.short()).yellow(), reference.name);
                }
            }
            Ok(())
        }
        Commands::Log { max_commits, json } => {
            if let Some(n) = max_commits {
                config.replay.max_commits = n;
            }
            let plan = SnapshotReplayer::new(&source)
                .with_config(config.replay)
                .plan()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                for commit in &plan {
                    println!(
                        "{} {} {}",
                        style(commit.id.short()).yellow(),
                        style(commit.time).dim(),
                        commit.summary()
                    );
                }
            }
            Ok(())
        }
        Commands::Replay {
            max_commits,
            strict_gitlinks,
            json,
        } => {
            if let Some(n) = max_commits {
                config.replay.max_commits = n;
            }
            if strict_gitlinks {
                config.replay.skip_gitlinks = false;
            }
            replay(&source, config, json)
        }
    }
}

fn replay(source: &GitSource, config: ChronicleConfig, json: bool) -> Result<()> {
    let mut store = SnapshotRepo::with_config(config.store);
    let replayer = SnapshotReplayer::new(source).with_config(config.replay);

    let bar = if json || !console::Term::stderr().is_term() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0).with_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")?
                .progress_chars("=> "),
        )
    };
    let report = replayer.replay_with_callback(&mut store, |progress: &ReplayProgress<'_>| {
        bar.set_length(progress.total as u64);
        bar.set_message(progress.commit.summary().to_string());
        bar.inc(1);
    });
    bar.finish_and_clear();
    let report = report?;

    if json {
        let tips = store.search(&SearchExpression::all().tip())?;
        let mut listed = Vec::with_capacity(tips.len());
        for tip in &tips {
            let files: serde_json::Map<String, serde_json::Value> = store
                .checkout(&tip.id)?
                .iter()
                .map(|(path, content)| {
                    (
                        path.to_string(),
                        String::from_utf8_lossy(content).into_owned().into(),
                    )
                })
                .collect();
            listed.push(serde_json::json!({
                "snapshot": tip.id,
                "message": tip.message,
                "files": files,
            }));
        }
        let output = serde_json::json!({
            "report": report,
            "tips": listed,
            "stats": store.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", tip_listing(&store)?);
    let stats = store.stats();
    eprintln!(
        "{} {} commits from {} seeds, {} blobs ({} bytes, {} deduplicated writes)",
        style("replayed").green(),
        report.len(),
        report.seeds,
        stats.blob_count,
        stats.total_bytes,
        stats.deduplicated_writes
    );
    Ok(())
}

/// Header line plus `path : content` lines for every tip snapshot
fn tip_listing(store: &SnapshotRepo) -> Result<String> {
    let mut out = String::new();
    for tip in &store.search(&SearchExpression::all().tip())? {
        out.push_str(&format!("{} {}\n", style(tip.id).bold(), tip.summary()));
        out.push_str(&store.checkout(&tip.id)?.as_list_string());
    }
    Ok(out)
}
