//! # Tradebook Core
//!
//! Double-entry bookkeeping core for a small trading business: a typed chart
//! of accounts, a posting engine that turns purchases, sales, payments, and
//! receipts into balanced ledger transactions, and read-side balance and
//! ledger reporting.
//!
//! ## Features
//!
//! - **Double-entry postings**: every business event becomes a balanced
//!   transaction (debits always equal credits) committed atomically
//! - **Chart of accounts**: typed account tree (Asset, Liability, Equity,
//!   Revenue, Expense) with supplier/customer subsidiary ledgers
//! - **Balances**: normal-balance sign conventions, opening balances, and
//!   context-aware presentation (overdrawn warnings, supplier advances)
//! - **Ledgers**: deterministic running-balance statements and a trial balance
//! - **Storage abstraction**: database-agnostic via injected trait objects
//!
//! ## Quick Start
//!
//! ```rust
//! use tradebook_core::{Ledger, MemoryStore, NewAccount, AccountType};
//!
//! # async fn demo() -> tradebook_core::LedgerResult<()> {
//! let mut ledger = Ledger::new(MemoryStore::new());
//! ledger.bootstrap_chart().await?;
//! ledger
//!     .create_account(NewAccount::new("6000", "Rent", AccountType::Expense))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_store::MemoryStore;
