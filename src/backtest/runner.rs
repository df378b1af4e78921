use crate::backtest::rules::{self, ExitContext};
use crate::loader::with_previous;
use crate::models::{OpenPosition, OrderBlock, Quote, Trade};

/// Result of one simulation run over a single symbol's quote series.
///
/// `open_position` carries a position that was still open when the series
/// ended. It is deliberately not part of `trades`: only realized exits
/// produce trade records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationOutcome {
    pub trades: Vec<Trade>,
    pub open_position: Option<OpenPosition>,
}

impl SimulationOutcome {
    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }
}

/// Single-position simulator: walks a date-ascending quote series once,
/// entering while flat and exiting while in a position.
///
/// Deterministic and synchronous; the full series and block set must be in
/// memory before `run` is called. Independent runs share no state, so
/// multiple symbols can be simulated in parallel by separate invocations.
#[derive(Debug, Default)]
pub struct Simulator;

impl Simulator {
    pub fn new() -> Self {
        Self
    }

    /// Run the state machine over an already-filtered quote series.
    ///
    /// Quotes must be ordered by date ascending (the loader enforces this).
    /// The block set is shared across all quotes in the run.
    pub fn run(&self, quotes: &[Quote], blocks: &[OrderBlock]) -> SimulationOutcome {
        tracing::info!(
            "Starting simulation: {} quotes, {} order blocks",
            quotes.len(),
            blocks.len()
        );

        let mut trades = Vec::new();
        let mut entry: Option<&Quote> = None;

        for (previous, current) in with_previous(quotes) {
            match entry {
                None => {
                    if rules::should_enter(current, blocks) {
                        tracing::debug!("ENTRY {} @ {:.2}", current.date, current.close);
                        entry = Some(current);
                    }
                }
                Some(entry_quote) => {
                    let ctx = ExitContext {
                        previous,
                        current,
                        blocks,
                    };

                    if let Some(reason) = rules::first_matching_exit(&ctx) {
                        let trade = Trade::close(entry_quote, current, reason);
                        tracing::debug!(
                            "EXIT {} @ {:.2} ({}): {:+.2}%",
                            current.date,
                            current.close,
                            reason,
                            trade.profit_pct
                        );
                        trades.push(trade);
                        entry = None;
                    }
                }
            }
        }

        // A position still open at series end is reported separately and
        // never becomes a trade
        let open_position = match (entry, quotes.last()) {
            (Some(entry_quote), Some(last)) => {
                let open = OpenPosition::new(entry_quote, last);
                tracing::info!(
                    "Position opened {} still open at series end (unrealized {:+.2})",
                    open.entry_date,
                    open.unrealized_profit
                );
                Some(open)
            }
            _ => None,
        };

        tracing::info!("Simulation complete: {} trades", trades.len());

        SimulationOutcome {
            trades,
            open_position,
        }
    }
}
