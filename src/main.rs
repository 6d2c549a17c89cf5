use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use redmon::config::Config;
use redmon::monitor::{ApiMonitor, MonitorEvent, MonitorTask, TaskFn};
use redmon::ratelimit::{RateFeedback, RateTracker};
use redmon::reddit::{RedditAuth, SubredditClient};
use redmon::stats::StatsService;

mod cli;

use cli::{Cli, Commands};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redmon")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("redmon.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Wire the Reddit collaborators into a work unit and run the monitor
/// until ctrl-c.
async fn run_monitor(subreddit: &str) -> Result<()> {
    let config = Config::from_env().context("Loading reddit credentials")?;
    let http = reqwest::Client::new();
    let auth = Arc::new(RedditAuth::new(http.clone(), config.clone()));
    let client = Arc::new(SubredditClient::new(http, auth, config.user_agent.clone()));
    let stats = Arc::new(StatsService::new());
    let monitor = ApiMonitor::new();

    let task: Arc<dyn MonitorTask> = {
        let client = Arc::clone(&client);
        let stats = Arc::clone(&stats);
        let name = subreddit.to_string();
        Arc::new(TaskFn(move || {
            let client = Arc::clone(&client);
            let stats = Arc::clone(&stats);
            let name = name.clone();
            async move {
                let fetched = client.fetch_new(&name).await?;
                stats.update(&fetched.listing);
                Ok(fetched.feedback)
            }
        }))
    };

    let mut events = monitor.subscribe();
    monitor.start(task).await.context("Starting monitor")?;
    println!("{} monitoring r/{}", "started:".green(), subreddit);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{} stopping...", "interrupt:".yellow());
                break;
            }
            event = events.recv() => match event {
                Ok(MonitorEvent::Iterated(report)) => {
                    println!(
                        "{} #{} remaining={} reset={}s call={}ms next in {}ms",
                        "iterated:".cyan(),
                        report.iteration,
                        report.remaining,
                        report.reset_seconds,
                        report.call_duration.as_millis(),
                        report.delay.as_millis(),
                    );
                }
                Ok(MonitorEvent::Stopped) => {
                    // The run terminated on its own (work unit failure).
                    println!("{} monitor stopped", "stopped:".red());
                    break;
                }
                Ok(MonitorEvent::Started) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            },
        }
    }

    monitor.stop().await.context("Stopping monitor")?;

    if let Some(summary) = stats.latest() {
        println!(
            "{} top author: {}",
            "summary:".green(),
            summary.top_author.as_deref().unwrap_or("-")
        );
        if let Some(post) = summary.top_post {
            println!(
                "{} top post: {} ({} ups)",
                "summary:".green(),
                post.title.as_deref().unwrap_or("<untitled>"),
                post.ups.unwrap_or(0)
            );
        }
    }

    Ok(())
}

/// One-shot delay computation, handy for eyeballing quota headers.
fn print_delay(used: i64, remaining: i64, reset: i64, duration_ms: u64) -> Result<()> {
    let tracker = RateTracker::new();
    tracker.update(
        RateFeedback {
            used,
            remaining,
            reset_seconds: reset,
        },
        Duration::from_millis(duration_ms),
    )?;
    println!("{} ms", tracker.compute_delay().as_millis());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    match &cli.command {
        Commands::Run { subreddit } => run_monitor(subreddit).await.context("Monitor failed"),
        Commands::Delay {
            used,
            remaining,
            reset,
            duration_ms,
        } => print_delay(*used, *remaining, *reset, *duration_ms),
    }
}
