//! Shift ledger domain models: line items, the derived summary, and the state
//! that keeps them consistent.

pub mod items;
pub mod state;
pub mod summary;

pub use items::{Expense, FuelSale, FuelType, LineItem, Lubricant};
pub use state::{LedgerState, TOTAL_EPSILON};
pub use summary::{SalesSummary, SummaryField};
