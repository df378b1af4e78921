use crate::models::{Quote, Signal, Trend};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EMA_SHORT_PERIOD: f64 = 10.0;
const EMA_LONG_PERIOD: f64 = 20.0;
const ATR_PERIOD: f64 = 14.0;

/// Market scenario types for synthetic quote generation
#[derive(Debug, Clone, Copy)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.3% daily average)
    Uptrend,
    /// Steady downtrend with noise (-0.3% daily average)
    Downtrend,
    /// Sideways/choppy market, mean-reverting around the base price
    Sideways,
    /// Large daily swings (±3%)
    Volatile,
}

/// Generates synthetic daily quote series for simulator tests.
///
/// Indicator fields (EMAs, ATR, trend, signal dates) are derived from the
/// generated price path so the series is internally consistent, the same way
/// real input arrives with indicators already computed.
pub struct SyntheticQuoteGenerator {
    rng: StdRng,
    base_price: f64,
}

impl SyntheticQuoteGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
        }
    }

    /// Generate a daily quote series starting at `start_date`
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_days: usize,
        start_date: NaiveDate,
    ) -> Vec<Quote> {
        let closes = self.generate_closes(scenario, num_days);
        self.build_quotes(&closes, start_date)
    }

    fn generate_closes(&mut self, scenario: MarketScenario, num_days: usize) -> Vec<f64> {
        let mut closes = Vec::with_capacity(num_days);
        let mut price = self.base_price;
        let mean_price = self.base_price;

        for _ in 0..num_days {
            let change = match scenario {
                MarketScenario::Uptrend => {
                    price * 0.003 + price * self.rng.gen_range(-0.002..0.002)
                }
                MarketScenario::Downtrend => {
                    price * -0.003 + price * self.rng.gen_range(-0.002..0.002)
                }
                MarketScenario::Sideways => {
                    (mean_price - price) * 0.1 + price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => price * self.rng.gen_range(-0.03..0.03),
            };

            price = (price + change).max(self.base_price * 0.2);
            closes.push(price);
        }

        closes
    }

    /// Derive OHLC, EMAs, ATR, trend, and signal dates from a close path
    fn build_quotes(&mut self, closes: &[f64], start_date: NaiveDate) -> Vec<Quote> {
        let mut quotes = Vec::with_capacity(closes.len());

        let k_short = 2.0 / (EMA_SHORT_PERIOD + 1.0);
        let k_long = 2.0 / (EMA_LONG_PERIOD + 1.0);

        let mut ema_short = closes.first().copied().unwrap_or(0.0);
        let mut ema_long = ema_short;
        let mut atr = 0.0;
        let mut prev_close: Option<f64> = None;
        let mut prev_short_above = true;
        let mut last_buy_signal: Option<NaiveDate> = None;
        let mut last_sell_signal: Option<NaiveDate> = None;

        for (i, &close) in closes.iter().enumerate() {
            let date = start_date + Duration::days(i as i64);

            let high = close * (1.0 + self.rng.gen_range(0.0..0.005));
            let low = close * (1.0 - self.rng.gen_range(0.0..0.005));
            let open = (close * (1.0 + self.rng.gen_range(-0.005..0.005))).clamp(low, high);

            ema_short += k_short * (close - ema_short);
            ema_long += k_long * (close - ema_long);

            let true_range = match prev_close {
                Some(pc) => (high - low).max((high - pc).abs()).max((low - pc).abs()),
                None => high - low,
            };
            atr = if i == 0 {
                true_range
            } else {
                (atr * (ATR_PERIOD - 1.0) + true_range) / ATR_PERIOD
            };

            let short_above = ema_short >= ema_long;
            let signal = if short_above && !prev_short_above {
                last_buy_signal = Some(date);
                Some(Signal::Buy)
            } else if !short_above && prev_short_above {
                last_sell_signal = Some(date);
                Some(Signal::Sell)
            } else {
                None
            };
            prev_short_above = short_above;

            let trend = if short_above && close > ema_long {
                Trend::Uptrend
            } else if !short_above && close < ema_long {
                Trend::Downtrend
            } else {
                Trend::Sideways
            };

            let heatmap = (50.0_f64 + self.rng.gen_range(-25.0..25.0)).clamp(0.0, 100.0);

            quotes.push(Quote {
                date,
                open,
                high,
                low,
                close,
                trend,
                signal,
                last_buy_signal,
                last_sell_signal,
                heatmap,
                ema_short,
                ema_long,
                atr,
            });

            prev_close = Some(close);
        }

        quotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
    }

    #[test]
    fn test_generate_uptrend_ends_higher() {
        let mut gen = SyntheticQuoteGenerator::new(42);
        let quotes = gen.generate(MarketScenario::Uptrend, 250, start());

        assert_eq!(quotes.len(), 250);
        assert!(quotes.last().unwrap().close > quotes.first().unwrap().close);
    }

    #[test]
    fn test_generate_downtrend_ends_lower() {
        let mut gen = SyntheticQuoteGenerator::new(42);
        let quotes = gen.generate(MarketScenario::Downtrend, 250, start());

        assert!(quotes.last().unwrap().close < quotes.first().unwrap().close);
    }

    #[test]
    fn test_dates_strictly_ascending() {
        let mut gen = SyntheticQuoteGenerator::new(7);
        let quotes = gen.generate(MarketScenario::Volatile, 100, start());

        for pair in quotes.windows(2) {
            assert!(pair[1].date > pair[0].date);
        }
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticQuoteGenerator::new(7);
        let quotes = gen.generate(MarketScenario::Sideways, 100, start());

        for q in &quotes {
            assert!(q.high >= q.close);
            assert!(q.low <= q.close);
            assert!(q.open >= q.low && q.open <= q.high);
            assert!(q.atr >= 0.0);
        }
    }

    #[test]
    fn test_signal_dates_track_crossovers() {
        let mut gen = SyntheticQuoteGenerator::new(11);
        let quotes = gen.generate(MarketScenario::Volatile, 300, start());

        for q in &quotes {
            if q.signal == Some(Signal::Buy) {
                assert_eq!(q.last_buy_signal, Some(q.date));
            }
            if q.signal == Some(Signal::Sell) {
                assert_eq!(q.last_sell_signal, Some(q.date));
            }
        }
    }

    #[test]
    fn test_heatmap_stays_bounded() {
        let mut gen = SyntheticQuoteGenerator::new(3);
        let quotes = gen.generate(MarketScenario::Uptrend, 100, start());

        for q in &quotes {
            assert!(q.heatmap >= 0.0 && q.heatmap <= 100.0);
        }
    }
}
