use crate::models::{ExitReason, Trade};
use serde::Serialize;

/// Performance summary for a single simulation run.
///
/// Percentages are in percent units (win_rate 55.0 = 55%). Edge is the
/// expected percentage gain per trade:
/// `avg_win_pct * win_rate - (1 - win_rate) * avg_loss_pct`.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    pub total_profit: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub edge: f64,
    pub profit_factor: f64,

    pub avg_days_held: f64,
    pub max_days_held: i64,

    /// Exit counts in rule priority order
    pub exits_by_reason: Vec<(ExitReason, usize)>,
}

impl BacktestMetrics {
    /// Calculate metrics from the trades of one run
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::empty();
        }

        let total_trades = trades.len();
        let winners: Vec<&Trade> = trades.iter().filter(|t| t.is_winner()).collect();
        let losers: Vec<&Trade> = trades.iter().filter(|t| !t.is_winner()).collect();

        let win_rate_frac = winners.len() as f64 / total_trades as f64;

        let avg_win_pct = if winners.is_empty() {
            0.0
        } else {
            winners.iter().map(|t| t.profit_pct).sum::<f64>() / winners.len() as f64
        };

        let avg_loss_pct = if losers.is_empty() {
            0.0
        } else {
            (losers.iter().map(|t| t.profit_pct).sum::<f64>() / losers.len() as f64).abs()
        };

        let edge = avg_win_pct * win_rate_frac - (1.0 - win_rate_frac) * avg_loss_pct;

        let gross_wins: f64 = winners.iter().map(|t| t.profit).sum();
        let gross_losses: f64 = losers.iter().map(|t| t.profit.abs()).sum();
        let profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let total_profit: f64 = trades.iter().map(|t| t.profit).sum();

        let avg_days_held =
            trades.iter().map(|t| t.days_held).sum::<i64>() as f64 / total_trades as f64;
        let max_days_held = trades.iter().map(|t| t.days_held).max().unwrap_or(0);

        let exits_by_reason = [
            ExitReason::SellSignal,
            ExitReason::EmaCrossedDown,
            ExitReason::WithinOrderBlock,
            ExitReason::ProfitTarget,
        ]
        .iter()
        .map(|&reason| {
            let count = trades.iter().filter(|t| t.exit_reason == reason).count();
            (reason, count)
        })
        .collect();

        Self {
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: win_rate_frac * 100.0,
            total_profit,
            avg_win_pct,
            avg_loss_pct,
            edge,
            profit_factor,
            avg_days_held,
            max_days_held,
            exits_by_reason,
        }
    }

    fn empty() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_profit: 0.0,
            avg_win_pct: 0.0,
            avg_loss_pct: 0.0,
            edge: 0.0,
            profit_factor: 0.0,
            avg_days_held: 0.0,
            max_days_held: 0,
            exits_by_reason: vec![],
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n================ SIMULATION REPORT ================\n");

        println!("TRADES");
        println!("  Total:            {}", self.total_trades);
        println!(
            "  Winners:          {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losers:           {}", self.losing_trades);

        if self.total_trades > 0 {
            println!("\nPERFORMANCE");
            println!("  Total Profit:     {:+.2}", self.total_profit);
            println!("  Avg Win:          {:+.2}%", self.avg_win_pct);
            println!("  Avg Loss:         -{:.2}%", self.avg_loss_pct);
            println!("  Edge:             {:+.2}% per trade", self.edge);
            println!("  Profit Factor:    {:.2}", self.profit_factor);

            println!("\nHOLDING");
            println!("  Avg Days Held:    {:.1}", self.avg_days_held);
            println!("  Max Days Held:    {}", self.max_days_held);

            println!("\nEXIT REASONS");
            for (reason, count) in &self.exits_by_reason {
                if *count > 0 {
                    println!("  {:<3} {}", count, reason);
                }
            }
        }

        println!("\n===================================================\n");
    }
}
