use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily trend classification, supplied by the data provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

/// Buy/sell signal for a single day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
}

/// One trading day for a symbol, with all indicators pre-computed upstream.
///
/// Quotes arrive ordered by date ascending and are never mutated by the
/// simulator. The EMAs are of close price, `ema_short` faster than `ema_long`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub trend: Trend,
    pub signal: Option<Signal>,
    /// Date of the most recent prior Buy signal, if any
    pub last_buy_signal: Option<NaiveDate>,
    /// Date of the most recent prior Sell signal, if any
    pub last_sell_signal: Option<NaiveDate>,
    /// Sentiment/overbought indicator on a 0-100 scale (lower = more fearful)
    pub heatmap: f64,
    pub ema_short: f64,
    pub ema_long: f64,
    pub atr: f64,
}

/// Order block type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderBlockType {
    Bullish,
    Bearish,
}

/// A detected price zone where institutional orders concentrated.
///
/// `end_date` is the date the zone was mitigated/invalidated; `None` means the
/// zone is still open. Bounds satisfy `low <= high`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderBlock {
    pub block_type: OrderBlockType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub low: f64,
    pub high: f64,
}

/// Why a position was closed, in evaluation priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExitReason {
    SellSignal,
    EmaCrossedDown,
    WithinOrderBlock,
    ProfitTarget,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::SellSignal => "Sell signal",
            ExitReason::EmaCrossedDown => "short EMA crossed below long EMA",
            ExitReason::WithinOrderBlock => "price is within an order block older than 30 days",
            ExitReason::ProfitTarget => "price is 3.0 ATR above long EMA",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed round trip: entered on one quote's close, exited on a later one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub days_held: i64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Build a trade from the stored entry quote and the quote that triggered
    /// the exit. Both legs fill at close price.
    pub fn close(entry: &Quote, exit: &Quote, exit_reason: ExitReason) -> Self {
        let profit = exit.close - entry.close;
        let profit_pct = if entry.close > 0.0 {
            (profit / entry.close) * 100.0
        } else {
            0.0
        };

        Self {
            entry_date: entry.date,
            exit_date: exit.date,
            entry_price: entry.close,
            exit_price: exit.close,
            profit,
            profit_pct,
            days_held: (exit.date - entry.date).num_days(),
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}

/// A position still open when the quote series ran out.
///
/// Not part of the trade list; reported separately so callers can decide how
/// to account for unrealized results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub last_date: NaiveDate,
    pub last_price: f64,
    pub unrealized_profit: f64,
}

impl OpenPosition {
    pub fn new(entry: &Quote, last: &Quote) -> Self {
        Self {
            entry_date: entry.date,
            entry_price: entry.close,
            last_date: last.date,
            last_price: last.close,
            unrealized_profit: last.close - entry.close,
        }
    }
}
