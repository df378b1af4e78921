use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use swingbot::backtest::BacktestMetrics;
use swingbot::loader;
use swingbot::Simulator;

/// Run the single-position strategy simulator over a saved symbol payload
#[derive(Debug, Parser)]
#[command(name = "swingbot", version)]
struct Args {
    /// JSON file with { "quotes": [...], "orderBlocks": [...] }
    input: PathBuf,

    /// First date of the simulation window (defaults to the first quote)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date of the simulation window, inclusive (defaults to the last quote)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Print the full outcome as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swingbot=info".into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = Args::parse();

    let payload = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let dataset = loader::load_dataset(&payload).context("invalid input payload")?;

    if dataset.quotes.is_empty() {
        anyhow::bail!("input contains no quotes");
    }

    let start = args.start.unwrap_or(dataset.quotes[0].date);
    let end = args
        .end
        .unwrap_or_else(|| dataset.quotes.last().map(|q| q.date).unwrap_or(start));

    let quotes = loader::filter_window(&dataset.quotes, start, end);
    tracing::info!(
        "Simulating {} of {} quotes ({} to {})",
        quotes.len(),
        dataset.quotes.len(),
        start,
        end
    );

    let outcome = Simulator::new().run(&quotes, &dataset.order_blocks);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let metrics = BacktestMetrics::from_trades(&outcome.trades);
    metrics.print_report();

    for trade in &outcome.trades {
        println!(
            "  {} -> {}  {:>8.2} -> {:>8.2}  {:+6.2}%  {:>3}d  {}",
            trade.entry_date,
            trade.exit_date,
            trade.entry_price,
            trade.exit_price,
            trade.profit_pct,
            trade.days_held,
            trade.exit_reason
        );
    }

    if let Some(open) = &outcome.open_position {
        println!(
            "\n  Open position: entered {} @ {:.2}, unrealized {:+.2} as of {}",
            open.entry_date, open.entry_price, open.unrealized_profit, open.last_date
        );
    }

    Ok(())
}
