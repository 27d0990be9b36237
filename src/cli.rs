// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every crawl setting can come from three places, later ones winning:
// 1. CollectorConfig defaults
// 2. a JSON file passed with --config
// 3. individual flags (--max-depth, --user-agent, ...)
// =============================================================================

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-collector",
    version,
    about = "Crawl a website and report what a CSS selector matches on every page",
    long_about = "link-collector fetches a page, runs a CSS selector over it and can follow the \
                  links it finds, down to a maximum depth. Each URL is fetched at most once."
)]
pub struct Cli {
    /// Show more log output on stderr (-v debug, -vv trace)
    ///
    /// RUST_LOG, when set, takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from one URL
    ///
    /// Example: link-collector crawl https://example.com --follow --max-depth 2
    Crawl {
        /// URL to start from (e.g., https://example.com)
        url: String,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum crawl depth (default: 1)
        ///
        /// Depth 1 = just the starting page
        /// Depth 2 = starting page + all pages it links to
        /// 0 = no limit
        #[arg(long)]
        max_depth: Option<usize>,

        /// User-Agent header to send
        #[arg(long)]
        user_agent: Option<String>,

        /// Do not keep cookies between requests
        #[arg(long)]
        no_cookies: bool,

        /// CSS selector to match on every HTML page
        #[arg(long, default_value = "a[href]")]
        selector: String,

        /// Follow the href of every matched element
        #[arg(long)]
        follow: bool,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// JSON file with collector settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
