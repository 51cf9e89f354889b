//! CLI entry point for `mailsift`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

use mailsift::options::{ProgressFn, ProgressUpdate};
use mailsift::{parse_archive, ByteSource, ParseOptions, ParseResult};

#[derive(Parser)]
#[command(name = "mailsift", version, about = "Inspect and classify email archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an archive and print summary statistics
    Stats {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Parse an archive and run the classification detectors
    Detect {
        path: PathBuf,
        /// Run only the listed detectors (default: all four)
        #[arg(long)]
        accounts: bool,
        #[arg(long)]
        purchases: bool,
        #[arg(long)]
        subscriptions: bool,
        #[arg(long)]
        newsletters: bool,
        #[arg(long)]
        json: bool,
    },
    /// Dump parsed emails as JSON lines
    Export {
        path: PathBuf,
        /// Limit the number of emails printed
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Stats { path, json } => cmd_stats(&path, json),
        Commands::Detect {
            path,
            accounts,
            purchases,
            subscriptions,
            newsletters,
            json,
        } => {
            let none_selected = !(accounts || purchases || subscriptions || newsletters);
            let options = ParseOptions {
                detect_accounts: accounts || none_selected,
                detect_purchases: purchases || none_selected,
                detect_subscriptions: subscriptions || none_selected,
                detect_newsletters: newsletters || none_selected,
                ..Default::default()
            };
            cmd_detect(&path, options, json)
        }
        Commands::Export { path, limit } => cmd_export(&path, limit),
    }
}

fn run_parse(path: &Path, options: &ParseOptions) -> anyhow::Result<ParseResult> {
    let source = ByteSource::open(path)
        .with_context(|| format!("cannot open archive {}", path.display()))?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {percent:>3}% {msg}")
            .expect("valid progress template"),
    );
    let bar_ref = &bar;
    let on_progress = move |update: ProgressUpdate| {
        bar_ref.set_position(update.progress as u64);
        bar_ref.set_message(update.message);
    };
    let progress: Option<ProgressFn<'_>> = Some(&on_progress);

    let started = Instant::now();
    let result = parse_archive(&source, options, progress);
    bar.finish_and_clear();

    if let Some(err) = &result.error {
        eprintln!("warning: parse ended early: {err}");
    }
    tracing::info!(
        emails = result.emails.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "parse finished"
    );
    Ok(result)
}

fn cmd_stats(path: &Path, json: bool) -> anyhow::Result<()> {
    let result = run_parse(path, &ParseOptions::default())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
        return Ok(());
    }
    println!("emails:     {}", result.stats.email_count);
    println!("skipped:    {}", result.stats.skipped_count);
    println!("contacts:   {}", result.stats.contact_count);
    println!(
        "processed:  {}",
        format_size(result.stats.bytes_processed, DECIMAL)
    );
    Ok(())
}

fn cmd_detect(path: &Path, options: ParseOptions, json: bool) -> anyhow::Result<()> {
    let result = run_parse(path, &options)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} emails parsed", result.emails.len());
    if options.detect_accounts {
        println!("\naccounts ({}):", result.accounts.len());
        for a in &result.accounts {
            println!(
                "  {} [{}] first seen {} ({} emails)",
                a.service_name,
                a.service_type,
                a.signup_date.format("%Y-%m-%d"),
                a.email_count
            );
        }
    }
    if options.detect_purchases {
        println!("\npurchases ({}):", result.purchases.len());
        for p in &result.purchases {
            println!(
                "  {} {:.2} {} on {}{}",
                p.merchant,
                p.amount,
                p.currency,
                p.purchase_date.format("%Y-%m-%d"),
                p.order_number
                    .as_deref()
                    .map(|o| format!(" (#{o})"))
                    .unwrap_or_default()
            );
        }
    }
    if options.detect_subscriptions {
        println!("\nsubscriptions ({}):", result.subscriptions.len());
        for s in &result.subscriptions {
            println!(
                "  {} {:.2} {} {:?}, renewed {}",
                s.service_name,
                s.monthly_amount,
                s.currency,
                s.frequency,
                s.last_renewal_date.format("%Y-%m-%d")
            );
        }
    }
    if options.detect_newsletters {
        println!("\nnewsletters ({}):", result.newsletters.len());
        for n in &result.newsletters {
            println!(
                "  {} <{}> {:?}, {} emails{}",
                n.sender_name.as_deref().unwrap_or("?"),
                n.sender_email,
                n.frequency,
                n.email_count,
                if n.is_promotional { " [promo]" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_export(path: &Path, limit: Option<usize>) -> anyhow::Result<()> {
    let result = run_parse(path, &ParseOptions::default())?;
    let take = limit.unwrap_or(usize::MAX);
    for email in result.emails.iter().take(take) {
        println!("{}", serde_json::to_string(email)?);
    }
    Ok(())
}
