//! Traits for storage abstraction and external collaborators
//!
//! The persistence client behind these traits is constructed explicitly and
//! injected into each component; the crate holds no global database handle.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Which business document a posting settles against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentRef {
    Purchase(String),
    Sale(String),
}

/// Denormalized field update applied to a business document as part of a
/// posting: cumulative paid/received goes up by `amount`, the document
/// balance goes down by the same amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub document: DocumentRef,
    pub amount: BigDecimal,
}

/// The atomic write unit produced by the posting engine.
///
/// Everything in here must persist together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub transaction: Transaction,
    pub payment: Option<PaymentRecord>,
    pub receipt: Option<ReceiptRecord>,
    pub document_update: Option<DocumentUpdate>,
}

impl Posting {
    /// A posting carrying only a transaction
    pub fn transaction_only(transaction: Transaction) -> Self {
        Self {
            transaction,
            payment: None,
            receipt: None,
            document_update: None,
        }
    }
}

/// Storage abstraction for the ledger system
///
/// This trait allows the bookkeeping core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Save a new account to storage
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// Get an account by its unique code
    async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts, optionally filtered by type
    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>>;

    /// Update an existing account
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Hard-delete an account. The registry only permits this for accounts
    /// without postings.
    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()>;

    /// Whether any transaction entry has ever posted against the account
    async fn account_has_entries(&self, account_id: &str) -> LedgerResult<bool>;

    /// Get a transaction by ID
    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>>;

    /// All transactions with at least one entry against the account
    async fn account_transactions(&self, account_id: &str) -> LedgerResult<Vec<Transaction>>;

    /// Delete a transaction together with its entries (cascade)
    async fn delete_transaction(&mut self, transaction_id: &str) -> LedgerResult<()>;

    /// Commit a posting as a single all-or-nothing unit.
    ///
    /// The transaction header, its entries, the payment/receipt record, and
    /// the document field update must land together; if any part fails the
    /// store must leave no trace of the others and return
    /// [`LedgerError::Storage`], which callers may retry with the same input.
    ///
    /// Implementations must bound the commit in time. A commit that exceeds
    /// the store's deadline is rolled back and surfaced as
    /// [`LedgerError::Storage`] like any other retryable failure.
    async fn commit_posting(&mut self, posting: Posting) -> LedgerResult<()>;
}

/// Read-only supplier/customer directory lookups
#[async_trait]
pub trait PartyDirectory: Send + Sync {
    async fn get_supplier(&self, supplier_id: &str) -> LedgerResult<Option<Party>>;
    async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Party>>;
}

/// Read access to the externally-owned purchase/sale documents.
///
/// Writes to their derived fields happen only through
/// [`LedgerStore::commit_posting`] so they stay inside the atomic unit.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_purchase(&self, purchase_id: &str) -> LedgerResult<Option<PurchaseDocument>>;
    async fn get_sale(&self, sale_id: &str) -> LedgerResult<Option<SaleDocument>>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Default account validator with the baseline field rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        crate::utils::validation::validate_account_code(&account.code)?;
        crate::utils::validation::validate_account_name(&account.name)?;

        if account.supplier_id.is_some() && account.customer_id.is_some() {
            return Err(LedgerError::Validation(format!(
                "account '{}' cannot be linked to both a supplier and a customer",
                account.code
            )));
        }

        Ok(())
    }
}
