//! RateDesk demo session.
//!
//! Seeds a fixed currency list, wires a drift-checked rate engine to a
//! demo order book, runs scripted edit rounds, and reports the settled
//! rate table with the base-currency total.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratedesk_common::{Currency, OrderId};
use ratedesk_orders::OrderBook;
use ratedesk_rates::{
    BoundedDriftValidator, CheckOutcome, RateEngine, RateEngineConfig, RateStatus,
};

mod demo;

/// RateDesk demo CLI
#[derive(Parser, Debug)]
#[command(name = "desk")]
#[command(about = "RateDesk demo session")]
struct Args {
    /// Number of demo orders to create
    #[arg(short, long, default_value = "6")]
    orders: usize,

    /// Number of scripted edit rounds
    #[arg(short, long, default_value = "4")]
    rounds: usize,

    /// Debounce quiet window in milliseconds
    #[arg(long, default_value = "200")]
    debounce_ms: u64,

    /// Base currency for totals
    #[arg(long, default_value = "USD")]
    base: String,

    /// Maximum accepted drift from the seed rate, in basis points
    #[arg(long, default_value = "500")]
    drift_bps: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit the final report as JSON instead of log lines
    #[arg(long)]
    json: bool,
}

/// Seed rates against the base currency, fixed at startup.
fn seed_rates() -> Vec<(Currency, Decimal)> {
    vec![
        (Currency::eur(), Decimal::new(10842, 4)),  // 1.0842
        (Currency::gbp(), Decimal::new(12731, 4)),  // 1.2731
        (Currency::jpy(), Decimal::new(67, 4)),     // 0.0067
        (Currency::new("CHF"), Decimal::new(11210, 4)),
        (Currency::new("CAD"), Decimal::new(7305, 4)),
    ]
}

#[derive(Serialize)]
struct Report {
    base: String,
    rates: Vec<RateRow>,
    orders: Vec<OrderRow>,
    total: String,
}

#[derive(Serialize)]
struct RateRow {
    currency: String,
    rate: Decimal,
    confirmed_rate: Decimal,
    status: RateStatus,
}

#[derive(Serialize)]
struct OrderRow {
    id: String,
    title: String,
    price: String,
    in_base: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let base = Currency::new(&args.base);
    let seeds = seed_rates();

    info!(base = %base, currencies = seeds.len(), "Starting RateDesk demo");

    let validator = Arc::new(BoundedDriftValidator::new(
        seeds.iter().cloned(),
        args.drift_bps,
    ));
    let config = RateEngineConfig {
        debounce_window: Duration::from_millis(args.debounce_ms),
        ..Default::default()
    };
    let engine = RateEngine::new(base.clone(), &seeds, validator, config);

    // Log settle events as they arrive.
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.outcome {
                CheckOutcome::Confirmed { rate } => {
                    info!(currency = %event.currency, rate = %rate, "Rate confirmed");
                }
                CheckOutcome::Reverted { rate } => {
                    info!(currency = %event.currency, rate = %rate, "Edit rejected, reverted");
                }
                CheckOutcome::CheckFailed { reason, .. } => {
                    warn!(currency = %event.currency, reason = %reason, "Check failed");
                }
            }
        }
    });

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut book = OrderBook::new();
    let mut order_ids: Vec<OrderId> = Vec::new();
    for (title, price) in demo::sample_orders(&mut rng, args.orders, &seeds) {
        order_ids.push(book.add(title, price)?);
    }
    info!(orders = book.len(), "Demo book ready");

    for round in 0..args.rounds {
        let (currency, seed_rate) = seeds[rng.gen_range(0..seeds.len())].clone();
        let wild = rng.gen_bool(0.25);

        // A quick burst of edits; only the last value should reach the
        // validator.
        let burst = rng.gen_range(1..4);
        for _ in 0..burst {
            engine.edit(&currency, demo::nudged_rate(&mut rng, seed_rate, wild))?;
        }
        info!(round, currency = %currency, burst, wild, "Edit round submitted");

        // Occasionally reprice an order mid-round.
        if !order_ids.is_empty() && rng.gen_bool(0.3) {
            let id = order_ids[rng.gen_range(0..order_ids.len())];
            book.edit_price(id, Decimal::from(rng.gen_range(50..5_000)))?;
        }

        tokio::time::sleep(Duration::from_millis(args.debounce_ms * 2)).await;
    }

    // Let the last cycles settle.
    tokio::time::sleep(Duration::from_millis(args.debounce_ms * 3)).await;

    let report = build_report(&engine, &book, &base)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for row in &report.rates {
            info!(
                currency = %row.currency,
                confirmed = %row.confirmed_rate,
                status = ?row.status,
                "Rate"
            );
        }
        for row in &report.orders {
            info!(title = %row.title, price = %row.price, in_base = %row.in_base, "Order");
        }
        info!(total = %report.total, "Base-currency total");
    }

    Ok(())
}

fn build_report(engine: &RateEngine, book: &OrderBook, base: &Currency) -> anyhow::Result<Report> {
    let mut rates = Vec::new();
    for currency in engine.currencies() {
        let entry = engine.entry(&currency)?;
        rates.push(RateRow {
            currency: currency.code().to_string(),
            rate: entry.rate,
            confirmed_rate: entry.confirmed_rate,
            status: entry.status,
        });
    }

    let mut orders: Vec<_> = book.iter().collect();
    orders.sort_by_key(|order| order.created_at);
    let orders = orders
        .into_iter()
        .map(|order| {
            let in_base = engine.convert_to_base(&order.price)?;
            Ok(OrderRow {
                id: order.id.to_string(),
                title: order.title.clone(),
                price: order.price.to_string(),
                in_base: in_base.to_string(),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let total = book.total_in(base.clone(), |currency| {
        engine.confirmed_rate(currency).ok()
    })?;

    Ok(Report {
        base: base.code().to_string(),
        rates,
        orders,
        total: total.to_string(),
    })
}
