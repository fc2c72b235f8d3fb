use tracing::debug;

use super::amount::normalize_amount;
use super::classify::{FragmentArena, FragmentKind};
use crate::types::{TollTransaction, VehicleId};

/// Answers "which date governs line L" for a classified document.
pub struct ContextTracker<'a> {
    arena: &'a FragmentArena,
}

impl<'a> ContextTracker<'a> {
    pub fn new(arena: &'a FragmentArena) -> Self {
        Self { arena }
    }

    /// The nearest date at or above `line`; `None` when the document has not
    /// shown a date yet at that point.
    pub fn date_for(&self, line: usize) -> Option<&'a str> {
        self.arena.up_to(line).iter().rev().find_map(|f| match &f.kind {
            FragmentKind::Date(d) => Some(d.as_str()),
            _ => None,
        })
    }
}

/// Facts that hold for a whole statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    /// First identifier in the document; statements cover a single vehicle.
    pub vehicle: VehicleId,
}

impl DocumentContext {
    pub fn from_arena(arena: &FragmentArena) -> Option<Self> {
        let (_, vehicle) = arena.identifiers().next()?;
        Some(Self { vehicle: vehicle.clone() })
    }
}

/// Pair the i-th category with the i-th amount and date each pair from the
/// nearest preceding date line.
///
/// Fragments past the shorter of the two lists are dropped. A pair without a
/// governing date or with an unparsable amount is skipped; the rest of the
/// document still goes through. Output follows category order.
pub fn assemble(arena: &FragmentArena) -> Vec<TollTransaction> {
    let Some(context) = DocumentContext::from_arena(arena) else {
        debug!("no vehicle identifier found; discarding document");
        return Vec::new();
    };
    let tracker = ContextTracker::new(arena);

    let categories: Vec<_> = arena.categories().collect();
    let amounts: Vec<_> = arena.amounts().collect();
    if categories.len() != amounts.len() {
        debug!(
            categories = categories.len(),
            amounts = amounts.len(),
            "unequal category/amount counts; trailing fragments dropped"
        );
    }

    let mut transactions = Vec::with_capacity(categories.len().min(amounts.len()));
    for (&(line, category), &(amount_line, raw_amount)) in categories.iter().zip(amounts.iter()) {
        let Some(date) = tracker.date_for(line) else {
            debug!(line, %category, "no date precedes category; pair skipped");
            continue;
        };
        let amount = match normalize_amount(raw_amount) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(line = amount_line, error = %e, "pair skipped");
                continue;
            }
        };
        transactions.push(TollTransaction {
            date: date.to_string(),
            category,
            amount,
            vehicle: context.vehicle.clone(),
        });
    }

    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toll::classify::classify;
    use crate::types::TollCategory;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn date_for_picks_nearest_preceding() {
        let arena = classify("1 de março\nx\n2 de março\nPassagem\n3 de março");
        let t = ContextTracker::new(&arena);
        assert_eq!(t.date_for(0), Some("1 de março"));
        assert_eq!(t.date_for(1), Some("1 de março"));
        assert_eq!(t.date_for(3), Some("2 de março"));
        assert_eq!(t.date_for(4), Some("3 de março"));
    }

    #[test]
    fn date_for_none_before_first_date() {
        let arena = classify("Passagem\n10 de março");
        assert_eq!(ContextTracker::new(&arena).date_for(0), None);
    }

    #[test]
    fn document_context_takes_first_identifier() {
        let arena = classify("111 AAA1111\n222 BBB2222");
        let ctx = DocumentContext::from_arena(&arena).unwrap();
        assert_eq!(ctx.vehicle.code, "111");
        assert_eq!(ctx.vehicle.plate, "AAA1111");
    }

    #[test]
    fn category_and_amount_on_separate_lines() {
        let text = "123 ABC1234\n5 de abril\nPassagem\nEstacionamento\nR$ 4,50\nR$ 9,00";
        let txs = assemble(&classify(text));
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].category, TollCategory::Passagem);
        assert_eq!(txs[0].amount, dec("4.50"));
        assert_eq!(txs[1].category, TollCategory::Estacionamento);
        assert_eq!(txs[1].amount, dec("9.00"));
    }

    #[test]
    fn unparsable_amount_drops_only_its_pair() {
        // Non-ASCII digits satisfy the amount pattern but not the decimal parser.
        let text = "10 de março\n123 ABC1234\nPassagem R$ ٥,٠٠\nEstacionamento R$ 3,00";
        let txs = assemble(&classify(text));
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].category, TollCategory::Estacionamento);
        assert_eq!(txs[0].amount, dec("3.00"));
    }

    #[test]
    fn lone_amount_goes_to_first_category() {
        let arena = classify("10 de março\n123 ABC1234\nPassagem\nEstacionamento R$ 3,00");
        let txs = assemble(&arena);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].category, TollCategory::Passagem);
        assert_eq!(txs[0].amount, dec("3.00"));
    }

    #[test]
    fn output_keeps_document_order_not_date_order() {
        let text = "123 ABC1234\n20 de março\nPassagem R$ 1,00\n5 de março\nPassagem R$ 2,00";
        let txs = assemble(&classify(text));
        let dates: Vec<_> = txs.iter().map(|t| t.date.as_str()).collect();
        assert_eq!(dates, vec!["20 de março", "5 de março"]);
    }
}
