//! The inventory mutation contract used by the consumption engine.
//!
//! A [`DeductionSet`] is built from a run's requirements, summed per item.
//! [`DeductionSet::stage`] checks every item first and only then produces
//! decremented copies; the caller swaps them in under its own locks. Either
//! every copy is produced or none is.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::checked_add;
use plantops_core::{DomainError, DomainResult};

use crate::item::{InventoryItem, InventoryItemId};

/// `decrement(item_id, amount)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDeduction {
    pub item_id: InventoryItemId,
    pub amount: Decimal,
}

/// Per-item deductions in first-seen order.
///
/// The order matters for error reporting: the first insufficient item in
/// recipe order is the one reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionSet {
    entries: Vec<StockDeduction>,
}

impl DeductionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` against `item_id`, merging with an existing entry.
    /// Zero amounts are ignored; a merged total that overflows is `Validation`.
    pub fn add(&mut self, item_id: InventoryItemId, amount: Decimal) -> DomainResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        match self.entries.iter_mut().find(|d| d.item_id == item_id) {
            Some(existing) => {
                existing.amount = checked_add(existing.amount, amount, "deduction total")?;
            }
            None => self.entries.push(StockDeduction { item_id, amount }),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StockDeduction> {
        self.entries.iter()
    }

    pub fn amount_for(&self, item_id: InventoryItemId) -> Decimal {
        self.entries
            .iter()
            .find(|d| d.item_id == item_id)
            .map(|d| d.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Item ids in ascending order: the order locks must be taken in.
    pub fn lock_order(&self) -> Vec<InventoryItemId> {
        let mut ids: Vec<_> = self.entries.iter().map(|d| d.item_id).collect();
        ids.sort();
        ids
    }

    /// Validate every deduction, then return decremented copies.
    ///
    /// `lookup` reads the current (locked) state of an item. Nothing passed in
    /// is mutated; on error no copy escapes.
    pub fn stage<'a, F>(&self, lookup: F, at: DateTime<Utc>) -> DomainResult<Vec<InventoryItem>>
    where
        F: Fn(&InventoryItemId) -> Option<&'a InventoryItem>,
    {
        let mut current = Vec::with_capacity(self.entries.len());
        for d in &self.entries {
            let item = lookup(&d.item_id)
                .ok_or_else(|| DomainError::not_found(format!("inventory item {}", d.item_id)))?;
            item.ensure_available(d.amount)
                .map_err(DomainError::InsufficientStock)?;
            current.push((item, d.amount));
        }

        current
            .into_iter()
            .map(|(item, amount)| {
                let mut next = item.clone();
                next.decrement(amount, at)?;
                Ok(next)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemType, NewInventoryItem};
    use plantops_core::TenantId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn item(name: &str, quantity: Decimal) -> InventoryItem {
        InventoryItem::create(
            InventoryItemId::generate(),
            TenantId::new(),
            NewInventoryItem {
                name: name.into(),
                quantity,
                unit: "kg".into(),
                item_type: ItemType::Aggregate,
                max_capacity: None,
                location_id: None,
                unit_cost: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn index(items: &[InventoryItem]) -> HashMap<InventoryItemId, InventoryItem> {
        items.iter().map(|i| (i.id_typed(), i.clone())).collect()
    }

    #[test]
    fn add_merges_entries_for_the_same_item() {
        let id = InventoryItemId::generate();
        let mut set = DeductionSet::new();
        set.add(id, dec!(100)).unwrap();
        set.add(id, dec!(50)).unwrap();
        set.add(InventoryItemId::generate(), dec!(0)).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.amount_for(id), dec!(150));
    }

    #[test]
    fn merged_amounts_are_checked_together() {
        let sand = item("Sand", dec!(100));
        let items = index(&[sand.clone()]);
        let mut set = DeductionSet::new();
        set.add(sand.id_typed(), dec!(60)).unwrap();
        set.add(sand.id_typed(), dec!(60)).unwrap();

        let err = set.stage(|id| items.get(id), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(s) if s.deficit() == dec!(20)));
    }

    #[test]
    fn first_insufficient_item_in_insertion_order_is_reported() {
        let gravel = item("Gravel", dec!(10));
        let sand = item("Sand", dec!(10));
        let items = index(&[gravel.clone(), sand.clone()]);
        let mut set = DeductionSet::new();
        set.add(sand.id_typed(), dec!(11)).unwrap();
        set.add(gravel.id_typed(), dec!(12)).unwrap();

        match set.stage(|id| items.get(id), Utc::now()).unwrap_err() {
            DomainError::InsufficientStock(s) => assert_eq!(s.item_name, "Sand"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_item_is_not_found() {
        let mut set = DeductionSet::new();
        set.add(InventoryItemId::generate(), dec!(1)).unwrap();
        let items: HashMap<InventoryItemId, InventoryItem> = HashMap::new();

        assert!(matches!(
            set.stage(|id| items.get(id), Utc::now()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn merged_overflow_is_rejected_and_keeps_the_previous_total() {
        let id = InventoryItemId::generate();
        let mut set = DeductionSet::new();
        set.add(id, Decimal::MAX).unwrap();

        assert!(matches!(set.add(id, dec!(1)), Err(DomainError::Validation(_))));
        assert_eq!(set.amount_for(id), Decimal::MAX);
    }

    #[test]
    fn lock_order_is_ascending() {
        let mut set = DeductionSet::new();
        let ids: Vec<_> = (0..5).map(|_| InventoryItemId::generate()).collect();
        for id in ids.iter().rev() {
            set.add(*id, dec!(1)).unwrap();
        }
        let order = set.lock_order();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: staging either yields every item reduced by exactly its
        /// deduction, or fails and yields nothing; never a negative quantity.
        #[test]
        fn staging_is_all_or_nothing(
            lines in prop::collection::vec((0i64..10_000, 0i64..10_000), 1..8)
        ) {
            let items: Vec<InventoryItem> = lines
                .iter()
                .enumerate()
                .map(|(i, (stock, _))| item(&format!("m{i}"), Decimal::new(*stock, 1)))
                .collect();
            let by_id = index(&items);

            let mut set = DeductionSet::new();
            for (it, (_, need)) in items.iter().zip(&lines) {
                set.add(it.id_typed(), Decimal::new(*need, 1)).unwrap();
            }

            let feasible = lines.iter().all(|(stock, need)| need <= stock);
            match set.stage(|id| by_id.get(id), Utc::now()) {
                Ok(staged) => {
                    prop_assert!(feasible);
                    for next in staged {
                        let before = &by_id[&next.id_typed()];
                        prop_assert!(next.quantity() >= Decimal::ZERO);
                        prop_assert_eq!(
                            next.quantity(),
                            before.quantity() - set.amount_for(next.id_typed())
                        );
                    }
                }
                Err(DomainError::InsufficientStock(s)) => {
                    prop_assert!(!feasible);
                    prop_assert!(s.deficit() > Decimal::ZERO);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
