//! Allocation report for GDPR Cash
//!
//! Builds a deployment from a sale configuration, prints the genesis
//! allocation of the token ledger and checks its accounting before and
//! after the crowdsale engine is linked.
//!
//! # Usage
//!
//! Report with the default window (opens one day from now, runs 15 days):
//! ```bash
//! cargo run -p gdpr_genesis
//! ```
//!
//! Report for a configuration file, as JSON:
//! ```bash
//! cargo run -p gdpr_genesis -- --config sale.json --json
//! ```
//!
//! The configuration file holds `startTime`, `endTime` and an optional `rate`.

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use gdpr_common::{
    config::{
        Amount, SaleConfig, COIN_VALUE, POOL_ALLOCATIONS, SALE_CAP, SALE_FUNDS_ADDR,
        TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL, TOTAL_SUPPLY,
    },
    crypto::Address,
    deployment::Deployment,
    sale::SalePhase,
    time::{get_current_time_in_seconds, TimestampSeconds, SECONDS_PER_DAY},
};

const DEFAULT_SALE_DURATION: TimestampSeconds = 15 * SECONDS_PER_DAY;

#[derive(Parser, Debug)]
#[command(name = "gdpr_genesis")]
#[command(about = "Print and check the GDPR Cash genesis allocation")]
#[command(styles = gdpr_common::get_cli_styles())]
struct Args {
    /// JSON sale configuration (startTime, endTime, rate)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the sale start time (unix seconds)
    #[arg(long)]
    start: Option<TimestampSeconds>,

    /// Override the sale end time (unix seconds)
    #[arg(long)]
    end: Option<TimestampSeconds>,

    /// Override the exchange rate (token units per value unit)
    #[arg(long)]
    rate: Option<Amount>,

    /// Host time used to resolve the sale phase, defaults to the wall clock
    #[arg(long)]
    now: Option<TimestampSeconds>,

    /// Deployer address in hex
    #[arg(long, default_value_t = Address::new([0x01; 32]))]
    deployer: Address,

    /// Stop before linking the engine into the ledger
    #[arg(long)]
    no_link: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    name: &'static str,
    address: Address,
    amount: Amount,
    /// Share of the total supply in basis points
    share_bps: Amount,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AllocationReport {
    token: String,
    decimals: u8,
    ledger: Address,
    sale: Address,
    owner: Address,
    beneficiary: Address,
    config: SaleConfig,
    now: TimestampSeconds,
    phase: SalePhase,
    pools: Vec<PoolRow>,
    total_supply: Amount,
    linked: bool,
    conserved: bool,
}

fn load_config(args: &Args, now: TimestampSeconds) -> Result<SaleConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read sale configuration {}", path.display()))?;
            SaleConfig::from_json_str(&data).context("Invalid sale configuration file")?
        }
        None => {
            let start = now.saturating_add(SECONDS_PER_DAY);
            SaleConfig::new(start, start.saturating_add(DEFAULT_SALE_DURATION))
        }
    };

    if let Some(start) = args.start {
        config.start_time = start;
    }
    if let Some(end) = args.end {
        config.end_time = end;
    }
    if let Some(rate) = args.rate {
        config = config.with_rate(rate);
    }
    config.validate().context("Invalid sale configuration")?;
    Ok(config)
}

fn share_bps(amount: Amount) -> Amount {
    amount * 10_000 / TOTAL_SUPPLY
}

fn build_report(
    deployer: &Address,
    config: SaleConfig,
    now: TimestampSeconds,
    link: bool,
) -> Result<AllocationReport> {
    let mut deployment = Deployment::unlinked(deployer, config)?;

    let mut pools: Vec<PoolRow> = POOL_ALLOCATIONS
        .iter()
        .map(|(name, address, amount)| PoolRow {
            name: *name,
            address: *address,
            amount: *amount,
            share_bps: share_bps(*amount),
        })
        .collect();
    pools.push(PoolRow {
        name: "sale",
        address: *deployment.ledger().reserve_account(),
        amount: SALE_CAP,
        share_bps: share_bps(SALE_CAP),
    });

    let allocated: Amount = pools.iter().map(|row| row.amount).sum();
    if allocated != TOTAL_SUPPLY {
        bail!(
            "Allocation mismatch: pools hold {} but total supply is {}",
            allocated,
            TOTAL_SUPPLY
        );
    }
    for row in &pools {
        let balance = deployment.balance_of(&row.address);
        if balance != row.amount {
            bail!(
                "Pool {} holds {} instead of {}",
                row.name,
                balance,
                row.amount
            );
        }
    }

    if link {
        deployment
            .link(deployer)
            .context("Failed to link the crowdsale engine")?;
        let engine_balance = deployment.balance_of(deployment.sale().address());
        if engine_balance != SALE_CAP {
            bail!(
                "Engine received {} tokens instead of the sale cap {}",
                engine_balance,
                SALE_CAP
            );
        }
        // The reservation moved to the engine
        if let Some(row) = pools.last_mut() {
            row.address = *deployment.sale().address();
        }
    } else {
        warn!("engine left unlinked: purchases and finalization will fail");
    }

    let snapshot = deployment.ledger().snapshot();
    Ok(AllocationReport {
        token: format!("{} ({})", TOKEN_NAME, TOKEN_SYMBOL),
        decimals: TOKEN_DECIMALS,
        ledger: *deployment.ledger().address(),
        sale: *deployment.sale().address(),
        owner: *deployment.ledger().owner(),
        beneficiary: SALE_FUNDS_ADDR,
        config,
        now,
        phase: deployment.sale().phase(now),
        pools,
        total_supply: snapshot.total_supply,
        linked: deployment.ledger().engine().is_some(),
        conserved: snapshot.is_conserved(),
    })
}

fn print_report(report: &AllocationReport) {
    println!("=== {} genesis allocation ===", report.token);
    println!("Ledger:      {}", report.ledger);
    println!("Crowdsale:   {}", report.sale);
    println!("Owner:       {}", report.owner);
    println!("Beneficiary: {}", report.beneficiary);
    println!(
        "Window:      [{}, {}) at rate {}",
        report.config.start_time, report.config.end_time, report.config.rate
    );
    println!("Phase at {}: {}", report.now, report.phase);
    println!();
    println!("{:<10} {:>16} {:>8}  Address", "Pool", report.token, "Share");
    for row in &report.pools {
        println!(
            "{:<10} {:>16} {:>7}%  {}",
            row.name,
            row.amount / COIN_VALUE,
            format!("{}.{:02}", row.share_bps / 100, row.share_bps % 100),
            row.address
        );
    }
    println!();
    println!(
        "Total supply: {} ({} decimals)",
        report.total_supply / COIN_VALUE,
        report.decimals
    );
    println!("Linked:       {}", report.linked);
    println!("Conserved:    {}", report.conserved);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let now = args.now.unwrap_or_else(get_current_time_in_seconds);
    let config = load_config(&args, now)?;
    info!(
        "building deployment for {} with window [{}, {})",
        args.deployer.short(),
        config.start_time,
        config.end_time
    );

    let report = build_report(&args.deployer, config, now, !args.no_link)?;
    if !report.conserved {
        bail!("Ledger accounting is not conserved");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
