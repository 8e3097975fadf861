//! I bond values CLI
//!
//! ```bash
//! # Show the rate history with composite rates for a bond
//! ibond_values rates --ticker IBond202312
//!
//! # Monthly redemption prices
//! ibond_values prices IBond202312
//!
//! # Interest payments for a single purchase, as of a fixed month
//! ibond_values --today 2026-10 interest IBond202312 --amount 10000
//!
//! # New interest payments for a ledger, printed as ledger CSV rows
//! ibond_values refresh data/ledger.csv --commit
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ibond_values::ledger::{load_ledger, write_ledger_rows};
use ibond_values::rates::{compose, load_rate_history};
use ibond_values::valuation::SinglePurchase;
use ibond_values::{
    IBondConfig, IBondWorker, RefreshRunner, ValuationConfig, ValuationEngine,
    YearMonth,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

/// Series I savings bond values and interest payments
#[derive(Parser)]
#[command(name = "ibond_values")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rate history CSV, overriding the configured one
    #[arg(short, long, global = true)]
    rates: Option<PathBuf>,

    /// Month treated as the current month (YYYY-MM)
    #[arg(long, global = true)]
    today: Option<YearMonth>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rate history, with composite rates when a ticker is given
    Rates {
        #[arg(long)]
        ticker: Option<String>,
    },

    /// Monthly redemption prices per 1.00 of purchase
    Prices { ticker: String },

    /// Interest payments for a single purchase or a ledger holding
    Interest {
        ticker: String,

        /// Amount purchased in the issue month
        #[arg(long, conflicts_with = "ledger")]
        amount: Option<Decimal>,

        /// Ledger CSV supplying deposits and redemptions
        #[arg(long, requires = "account")]
        ledger: Option<PathBuf>,

        /// Investment account within the ledger
        #[arg(long)]
        account: Option<String>,
    },

    /// Find interest payments missing from a ledger
    Refresh {
        ledger: PathBuf,

        /// Record the new payments and print them as ledger CSV rows to append
        #[arg(long)]
        commit: bool,
    },
}

fn load_config(cli: &Cli) -> Result<IBondConfig> {
    let mut config = match &cli.config {
        Some(path) => IBondConfig::load(path)
            .with_context(|| format!("Unable to load configuration {}", path.display()))?,
        None => IBondConfig::default(),
    };
    if let Some(rates) = &cli.rates {
        config.rate_history_path = rates.clone();
    }
    Ok(config)
}

fn build_engine(config: &IBondConfig, today: YearMonth) -> Result<ValuationEngine> {
    let rates = load_rate_history(&config.rate_history_path, &config.columns)
        .context("Unable to load I bond rate history")?;

    Ok(ValuationEngine::new(
        rates,
        ValuationConfig {
            today,
            ticker_prefix: config.ticker_prefix.clone(),
        },
    ))
}

fn print_line(message: String) {
    println!("{}", message);
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let today = cli.today.unwrap_or_else(YearMonth::now);

    match cli.command {
        Commands::Rates { ticker } => {
            let engine = build_engine(&config, today)?;
            println!("{:<10} {:>8} {:>10}", "Effective", "Fixed", "Inflation");
            for rec in engine.rates().iter() {
                println!(
                    "{:<10} {:>8} {:>10}",
                    rec.effective_month.to_string(),
                    rec.fixed_rate,
                    rec.inflation_rate
                );
            }

            if let Some(ticker) = ticker {
                let issue_month = engine.issue_month(&ticker)?;
                let mut sink = print_line;
                engine.epochs(&ticker, issue_month, &mut sink)?;
            } else {
                let latest = engine.rates().rate_for(engine.rates().last_known_month())?;
                println!(
                    "Composite rate for new purchases: {}%",
                    (compose(latest.fixed_rate, latest.inflation_rate) * Decimal::ONE_HUNDRED).round_dp(2)
                );
            }
        }

        Commands::Prices { ticker } => {
            let engine = build_engine(&config, today)?;
            let mut sink = print_line;
            let prices = engine.price_curve(&ticker, &mut sink)?;

            println!("Date,Price");
            for price in &prices {
                println!("{},{}", price.date(), price.share_price());
            }
        }

        Commands::Interest { ticker, amount, ledger, account } => {
            let engine = build_engine(&config, today)?;
            let mut sink = print_line;

            let txns = match (amount, ledger, account) {
                (_, Some(path), Some(account)) => {
                    let ledger = load_ledger(&path)
                        .with_context(|| format!("Unable to load ledger {}", path.display()))?;
                    let mut holding = ledger.invest_txns(&account, &ticker);
                    engine.interest_txns(&ticker, &mut holding, &mut sink)?
                }
                (Some(amount), _, _) => {
                    let mut purchase = SinglePurchase {
                        issue_month: engine.issue_month(&ticker)?,
                        amount,
                    };
                    engine.interest_txns(&ticker, &mut purchase, &mut sink)?
                }
                _ => anyhow::bail!("Give either --amount or --ledger with --account"),
            };

            for txn in &txns {
                println!("{}, bal {}", txn, txn.ending_bal());
            }
        }

        Commands::Refresh { ledger: path, commit } => {
            let mut ledger = load_ledger(&path)
                .with_context(|| format!("Unable to load ledger {}", path.display()))?;
            let worker = IBondWorker::from_config(&config, today)
                .context("Unable to prepare I bond refresh")?;

            let mut runner = RefreshRunner::new();
            runner
                .start(Arc::new(worker), Arc::new(ledger.clone()), print_line as fn(String))
                .await;

            match runner.finish().await? {
                Some(outcome) if commit && outcome.is_modified() => {
                    let recorded = ledger.len();
                    eprintln!("{}", outcome.commit(&mut ledger));
                    write_ledger_rows(std::io::stdout(), &ledger.txns()[recorded..])?;
                }
                Some(outcome) => {
                    println!("Found {} new interest payments", outcome.staged().len());
                }
                None => println!("Refresh cancelled"),
            }
        }
    }

    Ok(())
}
