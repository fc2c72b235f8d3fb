//! Rebuilds toll charges from statement OCR text.
//!
//! OCR gives no record boundaries: dates, amounts, charge labels and the
//! vehicle identifier land on unrelated lines. [`classify`] tags every line,
//! then [`assemble`] pairs labels with amounts in reading order and dates
//! each pair from the closest date above it.

pub mod amount;
pub mod assemble;
pub mod classify;
pub mod record;

pub use amount::{normalize_amount, AmountError};
pub use assemble::{assemble, ContextTracker, DocumentContext};
pub use classify::{classify, Fragment, FragmentArena, FragmentKind};
pub use record::{to_expense_record, TOLL_ESTABLISHMENT_PREFIX};

use tracing::debug;

use crate::types::TollTransaction;

/// Raw statement text in, ordered transactions out.
///
/// Never fails: blank text, a missing vehicle identifier or unmatched
/// fragments all just shrink the result, possibly to nothing.
pub fn reconstruct(text: &str) -> Vec<TollTransaction> {
    let arena = classify(text);
    let transactions = assemble(&arena);
    debug!(
        fragments = arena.fragments().len(),
        transactions = transactions.len(),
        "toll text reconstructed"
    );
    transactions
}
