use std::{
    io::{stdin, BufRead},
    path::{Path, PathBuf},
};

use _model::SellerLabel;
use anyhow::{ensure, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    classify::{classify_all, Reason},
    config::MonitorConfig,
    rules::RuleSet,
    search::{SearchClient, Sort},
};

mod classify;
mod compare;
mod config;
mod listing;
mod number;
mod reconcile;
mod report;
mod rules;
mod scrape;
mod search;
mod utils;

#[derive(Debug, Parser)]
#[command(about = "Gather product listings, reconcile discounts and label sellers")]
struct Cli {
    /// Seller rule file
    #[arg(long, global = true, default_value = "config/seller_rules.yaml")]
    rules: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Watch configured products on Naver Shopping search
    Monitor {
        #[arg(long, default_value = "data/product_config.json")]
        config: PathBuf,
        #[arg(long, default_value = "results")]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        sort: Sort,
    },
    /// Scrape product pages and compare their prices
    Compare {
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(long, default_value = "config/platforms")]
        platforms: PathBuf,
        #[arg(long, default_value = "output")]
        output: PathBuf,
        /// Price to measure savings against
        #[arg(long)]
        target: Option<f64>,
    },
    /// Label seller names, or stdin lines when none are given
    Classify {
        names: Vec<String>,
        /// Show which rule decided each label
        #[arg(long)]
        explain: bool,
        /// Only print names with this label
        #[arg(long)]
        label: Option<SellerLabel>,
    },
    /// Validate the seller rule file
    CheckRules,
}

/// Labelling is skipped when the rule file is unusable.
fn load_rules(path: &Path) -> Option<RuleSet> {
    match RuleSet::load(path) {
        Ok(x) => Some(x),
        Err(err) => {
            error!("{err}; sellers will not be labelled");
            None
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Monitor {
            config,
            output,
            sort,
        } => {
            let client = SearchClient::from_env()?;
            let config = MonitorConfig::load(&config)?;
            ensure!(
                !config.target_products.is_empty(),
                "No target products configured"
            );
            let rules = load_rules(&cli.rules);

            let report = search::monitor::run(&client, &config, sort, rules.as_ref());
            let (json_path, csv_path) = report::write_monitoring(&report, &output, Local::now())?;
            info!("Saved {}", json_path.display());
            if let Some(x) = csv_path {
                info!("Saved {}", x.display());
            }
            report::print_monitoring(&report);
        }
        Command::Compare {
            urls,
            platforms,
            output,
            target,
        } => {
            let rules = load_rules(&cli.rules);
            let run = scrape::run(&urls, &platforms, rules.as_ref())?;
            if run.comparison.is_empty() {
                warn!("No listings could be scraped");
            }

            let (json_path, csv_path) = report::write_comparison(&run, &output)?;
            info!("Saved {} and {}", json_path.display(), csv_path.display());
            report::print_comparison(&run, target);
        }
        Command::Classify {
            names,
            explain,
            label,
        } => {
            let rules = RuleSet::load(&cli.rules)?;
            let names = if names.is_empty() {
                stdin()
                    .lock()
                    .lines()
                    .collect::<Result<Vec<_>, _>>()
                    .context("Failed to read stdin")?
            } else {
                names
            };

            let wanted = |x: SellerLabel| label.map_or(true, |label| label == x);
            if !explain {
                for (name, x) in names.iter().zip(classify_all(&names, &rules)) {
                    if wanted(x) {
                        println!("{name}\t{x}");
                    }
                }
                return Ok(());
            }

            for name in &names {
                let verdict = classify::explain(Some(name), &rules);
                if !wanted(verdict.label) {
                    continue;
                }
                let reason = match &verdict.reason {
                    Reason::Blank => "blank name".to_string(),
                    Reason::Exact(x) => format!("exact \"{x}\""),
                    Reason::Pattern(x) => format!("pattern \"{x}\""),
                    Reason::Default => "no match".to_string(),
                };
                println!("{name}\t{}\t{reason}", verdict.label);
            }
        }
        Command::CheckRules => {
            let rules = RuleSet::load(&cli.rules)?;
            for label in SellerLabel::all() {
                let tier = rules.tier(label);
                println!(
                    "{label}: {} exact, {} patterns",
                    tier.exact.len(),
                    tier.regex.len()
                );
            }
            for (label, x) in rules.literal_patterns() {
                println!("{label}: \"{x}\" is matched as plain text");
            }
        }
    }

    Ok(())
}
