use crate::models::{OrderBlock, OrderBlockType, Quote};
use chrono::NaiveDate;

/// A block must be at least this many calendar days old, relative to the
/// quote being evaluated, before it counts for entry or exit decisions
pub const MIN_BLOCK_AGE_DAYS: i64 = 30;

/// Entry requires the close to sit at least this far below a bearish
/// block's low bound (2%)
pub const ENTRY_DISCOUNT_PCT: f64 = 2.0;

/// Shared validity rule applied to every (quote date, block) pair.
///
/// A block qualifies when it is at least [`MIN_BLOCK_AGE_DAYS`] old, started
/// strictly before the quote date, and has not ended on or before it. The
/// start-before check is implied by the age rule but enforced on its own.
pub fn is_qualifying(block: &OrderBlock, quote_date: NaiveDate) -> bool {
    let age_days = (quote_date - block.start_date).num_days();
    if age_days < MIN_BLOCK_AGE_DAYS {
        return false;
    }

    if block.start_date >= quote_date {
        return false;
    }

    // An ended block stops applying from its end date onward, inclusive
    if let Some(end_date) = block.end_date {
        if end_date <= quote_date {
            return false;
        }
    }

    true
}

/// Entry predicate: is the close at least 2% below the low of some
/// qualifying bearish block?
pub fn is_below_qualifying_bearish_block(quote: &Quote, blocks: &[OrderBlock]) -> bool {
    blocks.iter().any(|block| {
        block.block_type == OrderBlockType::Bearish
            && is_qualifying(block, quote.date)
            && block.low > quote.close
            && quote.close <= block.low * (1.0 - ENTRY_DISCOUNT_PCT / 100.0)
    })
}

/// Exit predicate: does the close sit inside any qualifying block,
/// bounds inclusive?
pub fn is_within_any_qualifying_block(quote: &Quote, blocks: &[OrderBlock]) -> bool {
    blocks.iter().any(|block| {
        is_qualifying(block, quote.date) && block.low <= quote.close && quote.close <= block.high
    })
}
