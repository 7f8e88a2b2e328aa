//! Ledger module: chart of accounts, posting engine, balances, and reports

pub mod balance;
pub mod core;
pub mod posting;
pub mod registry;
pub mod report;

pub use balance::*;
pub use self::core::*;
pub use posting::*;
pub use registry::*;
pub use report::*;
