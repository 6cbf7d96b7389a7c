//! Inventory domain module.
//!
//! Quantity-tracked items, storage locations (including cement silos), the
//! immutable stock audit trail and the deduction contract. Pure domain logic:
//! no IO, no locking, no storage.

pub mod deduction;
pub mod item;
pub mod location;
pub mod transaction;

pub use deduction::{DeductionSet, StockDeduction};
pub use item::{InventoryItem, InventoryItemId, ItemType, NewInventoryItem};
pub use location::{StorageKind, StorageLocation, StorageLocationId, cement_item_of};
pub use transaction::{ApprovalStatus, StockDirection, StockTransaction, StockTransactionId};
