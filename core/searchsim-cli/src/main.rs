//! searchsim: command-line driver for simulated search sessions.
//!
//! ## Subcommands
//!
//! - `browse`: Mount a persona dataset and navigate it with line commands on stdin
//! - `track`: Send a single tracking event to the sink

mod browse;
mod logging;
mod render;
mod track;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "searchsim")]
#[command(about = "Simulated search results with interaction tracking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse a persona dataset (reads commands from stdin)
    Browse {
        /// Path to the persona dataset JSON
        #[arg(long, value_name = "PATH")]
        dataset: PathBuf,

        /// Initial URL query, e.g. "?page=2&tab=LinkedIn"
        #[arg(long, default_value = "")]
        url: String,

        /// Simulated browser tab; keeps the session id across runs
        #[arg(long)]
        tab_id: Option<String>,

        /// Tracking endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Send tracking events on the main thread
        #[arg(long)]
        inline: bool,

        /// Print tracking events instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Send one tracking event
    Track {
        /// click, search, page_view, tab_change or pagination
        #[arg(long)]
        event_type: String,

        #[arg(long)]
        persona: String,

        #[arg(long, default_value = "")]
        element_type: String,

        #[arg(long)]
        element_id: Option<String>,

        #[arg(long)]
        element_text: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        tab: Option<String>,

        #[arg(long)]
        search_query: Option<String>,

        #[arg(long)]
        session_id: Option<String>,

        /// Tracking endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Browse {
            dataset,
            url,
            tab_id,
            endpoint,
            inline,
            dry_run,
        } => {
            let options = browse::BrowseOptions {
                dataset,
                url,
                tab_id,
                endpoint,
                inline,
                dry_run,
            };
            if let Err(e) = browse::run(options) {
                tracing::error!(error = %e, "searchsim browse failed");
                eprintln!("searchsim: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Track {
            event_type,
            persona,
            element_type,
            element_id,
            element_text,
            url,
            platform,
            page,
            tab,
            search_query,
            session_id,
            endpoint,
        } => {
            let options = track::TrackOptions {
                event_type,
                persona,
                element_type,
                element_id,
                element_text,
                url,
                platform,
                page,
                tab,
                search_query,
                session_id,
                endpoint,
            };
            // Tracking is best effort: report the failure but exit 0
            match track::run(options) {
                Ok(summary) => println!("{}", summary),
                Err(e) => {
                    tracing::warn!(error = %e, "searchsim track failed");
                    eprintln!("searchsim: event not delivered: {}", e);
                }
            }
        }
    }
}
