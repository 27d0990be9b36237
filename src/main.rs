// src/main.rs
// =============================================================================
// This is the entry point of the link-collector CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Turn them (plus an optional --config file) into a CollectorConfig
// 3. Register callbacks that record every page and follow matched links
// 4. Start the crawl, wait for every child visit, print the results
// 5. Exit with proper code (0 = every fetch worked, 1 = some failed, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser;
use link_collector::{Collector, CollectorConfig, CrawlError};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

// One fetched page, as reported to the user
#[derive(Debug, Clone, Serialize)]
struct PageRecord {
    url: String,
    status: u16,
    depth: usize,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    matches: usize,
}

// One fetch that did not complete
#[derive(Debug, Clone, Serialize)]
struct FailureRecord {
    url: String,
    kind: FailureKind,
    error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum FailureKind {
    // The server could not be reached or the body was cut off
    Network,
    // Everything else (bad URL, bad header, task failure)
    Other,
}

impl FailureRecord {
    fn new(url: String, error: &CrawlError) -> Self {
        let kind = if error.is_transport() {
            FailureKind::Network
        } else {
            FailureKind::Other
        };
        Self {
            url,
            kind,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CrawlReport {
    pages: Vec<PageRecord>,
    failures: Vec<FailureRecord>,
}

// Settings for `crawl`, gathered from the command line
struct CrawlOptions {
    url: String,
    json: bool,
    selector: String,
    follow: bool,
    config: CollectorConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so --json output on stdout stays parseable
fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "warn,link_collector=debug",
        _ => "warn,link_collector=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl {
            url,
            json,
            max_depth,
            user_agent,
            no_cookies,
            selector,
            follow,
            timeout,
            config,
        } => {
            let mut settings = match config {
                Some(path) => load_config(&path)?,
                None => CollectorConfig {
                    max_depth: 1,
                    ..CollectorConfig::default()
                },
            };
            if let Some(depth) = max_depth {
                settings.max_depth = depth;
            }
            if let Some(agent) = user_agent {
                settings.user_agent = agent;
            }
            if no_cookies {
                settings.cookies = false;
            }
            if timeout.is_some() {
                settings.timeout_secs = timeout;
            }

            handle_crawl(CrawlOptions {
                url,
                json,
                selector,
                follow,
                config: settings,
            })
            .await
        }
    }
}

fn load_config(path: &Path) -> Result<CollectorConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    let config = CollectorConfig::from_json_str(&text)
        .with_context(|| format!("could not load config file {}", path.display()))?;
    Ok(config)
}

// Handles the 'crawl' subcommand
async fn handle_crawl(options: CrawlOptions) -> Result<i32> {
    if !options.json {
        println!("🔍 Crawling: {}", options.url);
        println!("📊 Max crawl depth: {}", describe_depth(options.config.max_depth));
    }

    let collector = Collector::from_config(&options.config)?;
    let pages = Arc::new(Mutex::new(Vec::new()));

    // Followed children are joined by small tasks that only report failures,
    // so nothing is kept per link once its fetch is over
    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();

    // Count matches in the page's Context; html callbacks of one page run
    // one after another, so read-then-write is safe here
    let follow = options.follow;
    collector.on_html(options.selector.clone(), move |e| {
        let ctx = e.request().ctx();
        let seen: usize = ctx.get("matches").parse().unwrap_or(0);
        ctx.put("matches", (seen + 1).to_string());

        if follow {
            let href = e.attr("href");
            if !href.is_empty() {
                let child = e.request().visit(href);
                let failed = failed_tx.clone();
                tokio::spawn(async move {
                    let url = child.url().to_string();
                    if let Err(e) = child.join().await {
                        let _ = failed.send(FailureRecord::new(url, &e));
                    }
                });
            }
        }
    });

    let records = Arc::clone(&pages);
    let quiet = options.json;
    collector.on_response(move |r| {
        let record = PageRecord {
            url: r.request().url().to_string(),
            status: r.status(),
            depth: r.request().depth(),
            bytes: r.body().len(),
            content_type: r.content_type().map(str::to_string),
            matches: r.ctx().get("matches").parse().unwrap_or(0),
        };
        if !quiet {
            println!("  Crawled [depth {}]: {}", record.depth, record.url);
        }
        records.lock().unwrap_or_else(|p| p.into_inner()).push(record);
    });

    let mut failures = Vec::new();
    if let Err(e) = collector.visit(&options.url).await {
        failures.push(FailureRecord::new(options.url.clone(), &e));
    }
    collector.wait().await;

    // The html callback owns the last sender; dropping the collector drops
    // it, and the channel closes once every joiner has finished
    drop(collector);
    while let Some(failure) = failed_rx.recv().await {
        failures.push(failure);
    }

    let report = CrawlReport {
        pages: pages.lock().unwrap_or_else(|p| p.into_inner()).clone(),
        failures,
    };

    print_report(&report, options.json)?;

    if report.failures.is_empty() {
        Ok(0)
    } else {
        Ok(1) // Exit code 1 = some fetch failed
    }
}

fn describe_depth(depth: usize) -> String {
    if depth == 0 {
        "unlimited".to_string()
    } else {
        depth.to_string()
    }
}

// Prints the report either as a table or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(report: &CrawlReport) {
    println!();
    println!("{:<60} {:<8} {:<7} {:<10} {:<8}", "URL", "STATUS", "DEPTH", "BYTES", "MATCHES");
    println!("{}", "=".repeat(97));

    for page in &report.pages {
        println!(
            "{:<60} {:<8} {:<7} {:<10} {:<8}",
            truncate(&page.url, 57),
            page.status,
            page.depth,
            page.bytes,
            page.matches
        );
    }

    print_failures("🌐 Network failures:", report, FailureKind::Network);
    print_failures("❌ Other failures:", report, FailureKind::Other);

    println!();
    println!("📊 Summary:");
    println!("   📄 Pages: {}", report.pages.len());
    println!("   🌐 Network failures: {}", count_failures(report, FailureKind::Network));
    println!("   ❌ Other failures: {}", count_failures(report, FailureKind::Other));
}

fn print_failures(title: &str, report: &CrawlReport, kind: FailureKind) {
    if count_failures(report, kind) == 0 {
        return;
    }
    println!();
    println!("{}", title);
    for failure in report.failures.iter().filter(|f| f.kind == kind) {
        println!("   {} - {}", truncate(&failure.url, 57), failure.error);
    }
}

fn count_failures(report: &CrawlReport, kind: FailureKind) -> usize {
    report.failures.iter().filter(|f| f.kind == kind).count()
}

// Truncate long URLs for display
fn truncate(url: &str, max: usize) -> String {
    if url.chars().count() > max {
        let cut: String = url.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("http://a.test/", 57), "http://a.test/");
        assert_eq!(truncate("http://a.test/very-long", 10), "http://a.t...");
    }

    #[test]
    fn test_describe_depth() {
        assert_eq!(describe_depth(0), "unlimited");
        assert_eq!(describe_depth(2), "2");
    }

    #[test]
    fn test_report_json_shape() {
        let report = CrawlReport {
            pages: vec![PageRecord {
                url: "http://a.test/".to_string(),
                status: 200,
                depth: 1,
                bytes: 10,
                content_type: None,
                matches: 3,
            }],
            failures: vec![],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["pages"][0]["matches"], 3);
        assert!(value["pages"][0].get("content_type").is_none());
        assert_eq!(value["failures"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_failures_are_grouped_by_kind() {
        let network = CrawlError::Fetch {
            url: "http://down.test/".to_string(),
            source: "connection refused".into(),
        };
        let invalid = CrawlError::InvalidUrl {
            url: "not a url".to_string(),
            source: url::Url::parse("not a url").unwrap_err(),
        };
        let report = CrawlReport {
            pages: vec![],
            failures: vec![
                FailureRecord::new("http://down.test/".to_string(), &network),
                FailureRecord::new("not a url".to_string(), &invalid),
            ],
        };

        assert_eq!(count_failures(&report, FailureKind::Network), 1);
        assert_eq!(count_failures(&report, FailureKind::Other), 1);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["failures"][0]["kind"], "network");
        assert_eq!(value["failures"][1]["kind"], "other");
    }

    #[tokio::test]
    async fn test_failure_channel_closes_with_collector() {
        let collector = Collector::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<FailureRecord>();
        collector.on_response(move |_| {
            let _ = tx.send(FailureRecord {
                url: String::new(),
                kind: FailureKind::Other,
                error: String::new(),
            });
        });

        drop(collector);
        assert!(rx.recv().await.is_none());
    }
}
