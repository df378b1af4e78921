use crate::models::{OrderBlock, OrderBlockType, Quote, Signal, Trend};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

/// Date format used by the backend payload (ISO calendar date)
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input validation errors. All of these abort before simulation starts;
/// the simulator never sees partially-parsed data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid {field} date '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("quotes out of order: {current} does not come after {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("failed to parse input payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw quote as served by the backend, before validation.
/// Field names follow the backend JSON schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub date: String,
    #[serde(default)]
    pub open_price: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close_price: f64,
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub last_buy_signal: Option<String>,
    #[serde(default)]
    pub last_sell_signal: Option<String>,
    #[serde(default)]
    pub heatmap: f64,
    #[serde(default, rename = "closePriceEMA10")]
    pub close_price_ema10: f64,
    #[serde(default, rename = "closePriceEMA20")]
    pub close_price_ema20: f64,
    #[serde(default)]
    pub atr: f64,
}

/// Raw order block as served by the backend
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderBlock {
    pub order_block_type: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub high: f64,
}

/// Top-level payload: one symbol's quote history plus its order blocks
#[derive(Debug, Clone, Deserialize)]
pub struct RawDataset {
    pub quotes: Vec<RawQuote>,
    #[serde(default, rename = "orderBlocks")]
    pub order_blocks: Vec<RawOrderBlock>,
}

/// Validated simulation input
#[derive(Debug, Clone)]
pub struct Dataset {
    pub quotes: Vec<Quote>,
    pub order_blocks: Vec<OrderBlock>,
}

/// Parse and validate a JSON payload into a simulation-ready dataset.
///
/// Fails on unparsable dates or a quote series that is not strictly
/// ascending by date.
pub fn load_dataset(json: &str) -> Result<Dataset, LoadError> {
    let raw: RawDataset = serde_json::from_str(json)?;

    let quotes = convert_quotes(&raw.quotes)?;
    let order_blocks = raw
        .order_blocks
        .iter()
        .map(convert_order_block)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        "Loaded {} quotes and {} order blocks",
        quotes.len(),
        order_blocks.len()
    );

    Ok(Dataset {
        quotes,
        order_blocks,
    })
}

/// Convert raw quotes, enforcing strictly ascending dates
pub fn convert_quotes(raw: &[RawQuote]) -> Result<Vec<Quote>, LoadError> {
    let mut quotes = Vec::with_capacity(raw.len());
    let mut previous: Option<NaiveDate> = None;

    for r in raw {
        let quote = convert_quote(r)?;

        if let Some(prev) = previous {
            if quote.date <= prev {
                return Err(LoadError::OutOfOrder {
                    previous: prev,
                    current: quote.date,
                });
            }
        }
        previous = Some(quote.date);
        quotes.push(quote);
    }

    Ok(quotes)
}

fn convert_quote(raw: &RawQuote) -> Result<Quote, LoadError> {
    Ok(Quote {
        date: parse_date("quote", &raw.date)?,
        open: raw.open_price,
        high: raw.high,
        low: raw.low,
        close: raw.close_price,
        trend: parse_trend(raw.trend.as_deref()),
        signal: parse_signal(raw.signal.as_deref()),
        last_buy_signal: parse_optional_date("lastBuySignal", raw.last_buy_signal.as_deref())?,
        last_sell_signal: parse_optional_date("lastSellSignal", raw.last_sell_signal.as_deref())?,
        heatmap: raw.heatmap,
        ema_short: raw.close_price_ema10,
        ema_long: raw.close_price_ema20,
        atr: raw.atr,
    })
}

fn convert_order_block(raw: &RawOrderBlock) -> Result<OrderBlock, LoadError> {
    let block_type = match raw.order_block_type.to_ascii_uppercase().as_str() {
        "BULLISH" => OrderBlockType::Bullish,
        _ => OrderBlockType::Bearish,
    };

    Ok(OrderBlock {
        block_type,
        start_date: parse_date("orderBlock.startDate", &raw.start_date)?,
        end_date: parse_optional_date("orderBlock.endDate", raw.end_date.as_deref())?,
        low: raw.low,
        high: raw.high,
    })
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| LoadError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn parse_optional_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, LoadError> {
    value.map(|v| parse_date(field, v)).transpose()
}

/// Any trend string other than the two directional ones counts as sideways,
/// which fails the uptrend entry check exactly like the backend's raw value
fn parse_trend(value: Option<&str>) -> Trend {
    match value {
        Some("Uptrend") => Trend::Uptrend,
        Some("Downtrend") => Trend::Downtrend,
        _ => Trend::Sideways,
    }
}

fn parse_signal(value: Option<&str>) -> Option<Signal> {
    match value {
        Some("Buy") => Some(Signal::Buy),
        Some("Sell") => Some(Signal::Sell),
        _ => None,
    }
}

/// Restrict a date-ascending quote series to an inclusive `[start, end]` window
pub fn filter_window(quotes: &[Quote], start: NaiveDate, end: NaiveDate) -> Vec<Quote> {
    quotes
        .iter()
        .filter(|q| q.date >= start && q.date <= end)
        .cloned()
        .collect()
}

/// Iterate quotes paired with their immediate predecessor in the series.
///
/// The first quote has no predecessor, so crossover checks that need one
/// simply cannot fire on it.
pub fn with_previous(quotes: &[Quote]) -> impl Iterator<Item = (Option<&Quote>, &Quote)> {
    quotes
        .iter()
        .enumerate()
        .map(|(i, q)| (if i > 0 { Some(&quotes[i - 1]) } else { None }, q))
}
