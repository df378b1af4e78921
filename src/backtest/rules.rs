use crate::models::{ExitReason, OrderBlock, Quote, Signal, Trend};
use crate::orderblocks;

/// Entry is blocked once the heatmap reads at or above this level (greedy
/// market)
pub const HEATMAP_ENTRY_MAX: f64 = 70.0;

/// Upper edge of the value zone, in ATR multiples above the long EMA
pub const VALUE_ZONE_ATR_MULT: f64 = 2.0;

/// Profit target, in ATR multiples above the long EMA
pub const PROFIT_TARGET_ATR_MULT: f64 = 3.0;

/// Everything an exit rule may look at for one day of the series
pub struct ExitContext<'a> {
    /// Quote immediately preceding `current` in the filtered series, if any
    pub previous: Option<&'a Quote>,
    pub current: &'a Quote,
    pub blocks: &'a [OrderBlock],
}

pub type ExitPredicate = fn(&ExitContext) -> bool;

/// Exit rules in priority order; the first predicate that matches decides
/// the exit reason and the rest are not evaluated.
pub const EXIT_RULES: &[(ExitPredicate, ExitReason)] = &[
    (has_sell_signal, ExitReason::SellSignal),
    (ema_crossed_down, ExitReason::EmaCrossedDown),
    (within_order_block, ExitReason::WithinOrderBlock),
    (profit_target_hit, ExitReason::ProfitTarget),
];

/// Evaluate the exit rule table against one day, first match wins
pub fn first_matching_exit(ctx: &ExitContext) -> Option<ExitReason> {
    EXIT_RULES
        .iter()
        .find(|(predicate, _)| predicate(ctx))
        .map(|(_, reason)| *reason)
}

fn has_sell_signal(ctx: &ExitContext) -> bool {
    ctx.current.signal == Some(Signal::Sell)
}

/// Short EMA transitioned from at/above to below the long EMA between the
/// previous day and today. Cannot fire on the first day of the series.
fn ema_crossed_down(ctx: &ExitContext) -> bool {
    match ctx.previous {
        Some(prev) => {
            prev.ema_short >= prev.ema_long && ctx.current.ema_short < ctx.current.ema_long
        }
        None => false,
    }
}

fn within_order_block(ctx: &ExitContext) -> bool {
    orderblocks::is_within_any_qualifying_block(ctx.current, ctx.blocks)
}

fn profit_target_hit(ctx: &ExitContext) -> bool {
    let q = ctx.current;
    q.close > q.ema_long + PROFIT_TARGET_ATR_MULT * q.atr
}

/// Entry decision for a flat day: all conditions must hold simultaneously
pub fn should_enter(quote: &Quote, blocks: &[OrderBlock]) -> bool {
    quote.trend == Trend::Uptrend
        && has_current_buy_signal(quote)
        && quote.heatmap < HEATMAP_ENTRY_MAX
        && in_value_zone(quote)
        && orderblocks::is_below_qualifying_bearish_block(quote, blocks)
}

/// A buy signal is "current" when it is dated today or exactly one day ago,
/// and no sell signal is dated on or after it
pub fn has_current_buy_signal(quote: &Quote) -> bool {
    let buy_date = match quote.last_buy_signal {
        Some(d) => d,
        None => return false,
    };

    let day_diff = (quote.date - buy_date).num_days();
    if !(0..=1).contains(&day_diff) {
        return false;
    }

    match quote.last_sell_signal {
        Some(sell_date) => buy_date > sell_date,
        None => true,
    }
}

/// Price band between the long EMA and two ATR above it
pub fn in_value_zone(quote: &Quote) -> bool {
    quote.close > quote.ema_long && quote.close < quote.ema_long + VALUE_ZONE_ATR_MULT * quote.atr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderBlockType, Signal};
    use chrono::{Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quote(d: NaiveDate, close: f64) -> Quote {
        Quote {
            date: d,
            open: close,
            high: close,
            low: close,
            close,
            trend: Trend::Uptrend,
            signal: None,
            last_buy_signal: None,
            last_sell_signal: None,
            heatmap: 50.0,
            ema_short: close,
            ema_long: close - 5.0,
            atr: 3.0,
        }
    }

    fn bearish_block(start: NaiveDate, low: f64, high: f64) -> OrderBlock {
        OrderBlock {
            block_type: OrderBlockType::Bearish,
            start_date: start,
            end_date: None,
            low,
            high,
        }
    }

    /// A quote satisfying every entry condition against a block with low=100
    fn entry_ready(d: NaiveDate) -> (Quote, Vec<OrderBlock>) {
        let mut q = quote(d, 97.9);
        q.trend = Trend::Uptrend;
        q.heatmap = 50.0;
        q.ema_long = 95.0; // close 97.9 within (95, 95 + 2*3)
        q.atr = 3.0;
        q.last_buy_signal = Some(d);

        let blocks = vec![bearish_block(d - Duration::days(60), 100.0, 105.0)];
        (q, blocks)
    }

    #[test]
    fn test_entry_fires_when_all_conditions_hold() {
        let (q, blocks) = entry_ready(date(2024, 6, 3));
        assert!(should_enter(&q, &blocks));
    }

    #[test]
    fn test_entry_requires_uptrend() {
        let (mut q, blocks) = entry_ready(date(2024, 6, 3));
        q.trend = Trend::Sideways;
        assert!(!should_enter(&q, &blocks));
    }

    #[test]
    fn test_entry_requires_heatmap_below_70() {
        let (mut q, blocks) = entry_ready(date(2024, 6, 3));
        q.heatmap = 70.0;
        assert!(!should_enter(&q, &blocks));

        q.heatmap = 69.9;
        assert!(should_enter(&q, &blocks));
    }

    #[test]
    fn test_entry_requires_value_zone() {
        let (mut q, blocks) = entry_ready(date(2024, 6, 3));

        // At or below the long EMA is out of the zone
        q.ema_long = 97.9;
        assert!(!should_enter(&q, &blocks));

        // At or above ema_long + 2*atr is out of the zone
        q.ema_long = 91.9;
        q.atr = 3.0; // upper edge exactly at close
        assert!(!should_enter(&q, &blocks));
    }

    #[test]
    fn test_entry_requires_order_block() {
        let (q, _) = entry_ready(date(2024, 6, 3));
        assert!(!should_enter(&q, &[]));
    }

    #[test]
    fn test_buy_signal_same_day_or_previous_day() {
        let d = date(2024, 6, 3);
        let mut q = quote(d, 100.0);

        q.last_buy_signal = Some(d);
        assert!(has_current_buy_signal(&q));

        q.last_buy_signal = Some(d - Duration::days(1));
        assert!(has_current_buy_signal(&q));

        q.last_buy_signal = Some(d - Duration::days(2));
        assert!(!has_current_buy_signal(&q));

        // A buy signal dated in the future is not current
        q.last_buy_signal = Some(d + Duration::days(1));
        assert!(!has_current_buy_signal(&q));

        q.last_buy_signal = None;
        assert!(!has_current_buy_signal(&q));
    }

    #[test]
    fn test_buy_signal_voided_by_later_or_simultaneous_sell() {
        let d = date(2024, 6, 3);
        let mut q = quote(d, 100.0);
        q.last_buy_signal = Some(d);

        q.last_sell_signal = Some(d);
        assert!(!has_current_buy_signal(&q), "simultaneous sell voids buy");

        q.last_sell_signal = Some(d + Duration::days(1));
        assert!(!has_current_buy_signal(&q), "later sell voids buy");

        q.last_sell_signal = Some(d - Duration::days(3));
        assert!(has_current_buy_signal(&q), "older sell does not void buy");
    }

    #[test]
    fn test_exit_priority_sell_signal_first() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 200.0);
        q.signal = Some(Signal::Sell);
        // Also past the profit target
        q.ema_long = 100.0;
        q.atr = 1.0;

        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &[],
        };

        assert_eq!(first_matching_exit(&ctx), Some(ExitReason::SellSignal));
    }

    #[test]
    fn test_ema_cross_needs_previous_quote() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 100.0);
        q.ema_short = 90.0;
        q.ema_long = 95.0;

        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), None);

        let mut prev = quote(d - Duration::days(1), 100.0);
        prev.ema_short = 96.0;
        prev.ema_long = 95.0;

        let ctx = ExitContext {
            previous: Some(&prev),
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), Some(ExitReason::EmaCrossedDown));
    }

    #[test]
    fn test_ema_cross_requires_prior_at_or_above() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 100.0);
        q.ema_short = 90.0;
        q.ema_long = 95.0;

        // Already below yesterday: no crossing event
        let mut prev = quote(d - Duration::days(1), 100.0);
        prev.ema_short = 94.0;
        prev.ema_long = 95.0;

        let ctx = ExitContext {
            previous: Some(&prev),
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), None);
    }

    #[test]
    fn test_exit_on_order_block_containment() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 102.0);
        q.ema_short = 103.0;
        q.ema_long = 100.0;
        q.atr = 5.0; // profit target far away

        let blocks = vec![bearish_block(d - Duration::days(45), 100.0, 105.0)];
        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &blocks,
        };

        assert_eq!(first_matching_exit(&ctx), Some(ExitReason::WithinOrderBlock));
    }

    #[test]
    fn test_exit_on_profit_target() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 110.0);
        q.ema_short = 108.0;
        q.ema_long = 100.0;
        q.atr = 3.0; // target at 109, close above it

        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), Some(ExitReason::ProfitTarget));

        // Exactly at the target does not fire
        q.close = 109.0;
        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), None);
    }

    #[test]
    fn test_no_exit_when_nothing_matches() {
        let d = date(2024, 6, 10);
        let mut q = quote(d, 101.0);
        q.ema_short = 102.0;
        q.ema_long = 100.0;
        q.atr = 5.0;

        let ctx = ExitContext {
            previous: None,
            current: &q,
            blocks: &[],
        };
        assert_eq!(first_matching_exit(&ctx), None);
    }
}
