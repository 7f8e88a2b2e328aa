//! Core types and data structures for the trading ledger

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of fractional digits kept on every stored monetary amount.
pub const MONEY_SCALE: i64 = 2;

/// Round a monetary amount to [`MONEY_SCALE`] decimals, half-up.
///
/// Applied at every persistence point so stored amounts never carry
/// more precision than the books display.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// Well-known account codes seeded by [`crate::Ledger::bootstrap_chart`].
///
/// Payment and receipt postings resolve their settlement leg through these,
/// so a working chart of accounts must contain them.
pub mod codes {
    /// Cash in hand (Asset)
    pub const CASH: &str = "1111";
    /// Bank current account (Asset)
    pub const BANK: &str = "1112";
    /// Parent of per-customer receivable accounts (Asset)
    pub const TRADE_RECEIVABLES: &str = "1200";
    /// Stock in trade (Asset)
    pub const INVENTORY: &str = "1300";
    /// Parent of per-supplier payable accounts (Liability)
    pub const TRADE_PAYABLES: &str = "2100";
    /// Owner's capital (Equity)
    pub const OWNERS_EQUITY: &str = "3000";
    /// Sales revenue (Revenue)
    pub const SALES_REVENUE: &str = "4000";
    /// Purchases / cost of goods (Expense)
    pub const PURCHASES: &str = "5000";
}

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Bank, Inventory, Receivables)
    Asset,
    /// Liabilities - what the business owes (Trade Payables, Loans)
    Liability,
    /// Equity - owner's interest in the business
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses normally carry debit balances;
    /// Liabilities, Equity, and Revenue normally carry credit balances.
    pub fn normal_balance(&self) -> BalanceNature {
        match self {
            AccountType::Asset | AccountType::Expense => BalanceNature::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                BalanceNature::Credit
            }
        }
    }

    /// Human-readable label used in descriptions and messages
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
        }
    }
}

/// The two sides of a double-entry posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceNature {
    /// Debit - increases Assets and Expenses, decreases the rest
    Debit,
    /// Credit - increases Liabilities, Equity, and Revenue, decreases the rest
    Credit,
}

impl BalanceNature {
    /// The opposite side
    pub fn opposite(&self) -> BalanceNature {
        match self {
            BalanceNature::Debit => BalanceNature::Credit,
            BalanceNature::Credit => BalanceNature::Debit,
        }
    }
}

/// How a payment or receipt was settled.
///
/// The method decides which settlement account the posting engine uses:
/// cash goes through [`codes::CASH`], everything else through [`codes::BANK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
    Card,
}

impl PaymentMethod {
    /// Code of the asset account that settles this method
    pub fn settlement_account_code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => codes::CASH,
            PaymentMethod::BankTransfer
            | PaymentMethod::Cheque
            | PaymentMethod::Upi
            | PaymentMethod::Card => codes::BANK,
        }
    }

    /// Label used when synthesizing transaction descriptions
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "Card",
        }
    }
}

/// Business event behind a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Purchase,
    Sale,
    Payment,
    Receipt,
    Journal,
}

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "Purchase",
            TransactionType::Sale => "Sale",
            TransactionType::Payment => "Payment",
            TransactionType::Receipt => "Receipt",
            TransactionType::Journal => "Journal",
        }
    }
}

/// A node in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: String,
    /// Globally unique, sortable account code (e.g. "1111")
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Balance carried in from before the books opened, in normal-side terms
    pub opening_balance: BigDecimal,
    /// Soft-delete flag; inactive accounts take no new postings
    pub is_active: bool,
    /// Optional parent account for the hierarchical chart of accounts
    pub parent_id: Option<String>,
    /// Set when this is a supplier's subsidiary payable account
    pub supplier_id: Option<String>,
    /// Set when this is a customer's subsidiary receivable account
    pub customer_id: Option<String>,
    /// Opt-in: eligible as the debited counter-account of a payment
    /// regardless of account type
    pub can_debit_on_payment: bool,
    /// Opt-in: eligible as the credited counter-account of a receipt
    /// regardless of account type
    pub can_credit_on_receipt: bool,
    /// Optional free-form description
    pub description: Option<String>,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new active account with a zero opening balance
    pub fn new(
        id: String,
        code: String,
        name: String,
        account_type: AccountType,
        parent_id: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            code,
            name,
            account_type,
            opening_balance: BigDecimal::from(0),
            is_active: true,
            parent_id,
            supplier_id: None,
            customer_id: None,
            can_debit_on_payment: false,
            can_credit_on_receipt: false,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Link this account to a supplier (subsidiary payable ledger)
    pub fn with_supplier(mut self, supplier_id: String) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// Link this account to a customer (subsidiary receivable ledger)
    pub fn with_customer(mut self, customer_id: String) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Set the opening balance
    pub fn with_opening_balance(mut self, opening_balance: BigDecimal) -> Self {
        self.opening_balance = round_money(&opening_balance);
        self
    }

    /// Whether this account may be the debited side of a payment: any
    /// Expense account, a Liability account linked to a supplier, or an
    /// account explicitly flagged via `can_debit_on_payment`.
    pub fn is_payment_debit_eligible(&self) -> bool {
        self.can_debit_on_payment
            || match self.account_type {
                AccountType::Expense => true,
                AccountType::Liability => self.supplier_id.is_some(),
                _ => false,
            }
    }

    /// Whether this account may be the credited side of a receipt: any
    /// Revenue account, an Asset account linked to a customer, or an
    /// account explicitly flagged via `can_credit_on_receipt`.
    pub fn is_receipt_credit_eligible(&self) -> bool {
        self.can_credit_on_receipt
            || match self.account_type {
                AccountType::Revenue => true,
                AccountType::Asset => self.customer_id.is_some(),
                _ => false,
            }
    }
}

/// One ledger line: a single debit-or-credit amount against one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Unique identifier (also the deterministic tie-breaker in ledgers)
    pub id: String,
    /// Account being affected
    pub account_id: String,
    /// Debit amount (zero when this is a credit line)
    pub debit_amount: BigDecimal,
    /// Credit amount (zero when this is a debit line)
    pub credit_amount: BigDecimal,
    /// Optional description for this specific line
    pub description: Option<String>,
}

impl TransactionEntry {
    /// Create a debit line
    pub fn debit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            debit_amount: round_money(&amount),
            credit_amount: BigDecimal::from(0),
            description,
        }
    }

    /// Create a credit line
    pub fn credit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            debit_amount: BigDecimal::from(0),
            credit_amount: round_money(&amount),
            description,
        }
    }

    /// The side this line posts to
    pub fn nature(&self) -> BalanceNature {
        if self.debit_amount > BigDecimal::from(0) {
            BalanceNature::Debit
        } else {
            BalanceNature::Credit
        }
    }

    /// The nonzero amount of this line
    pub fn amount(&self) -> &BigDecimal {
        match self.nature() {
            BalanceNature::Debit => &self.debit_amount,
            BalanceNature::Credit => &self.credit_amount,
        }
    }

    /// A line is either a debit or a credit, never both nor neither
    pub fn validate(&self) -> LedgerResult<()> {
        let zero = BigDecimal::from(0);
        if self.debit_amount < zero || self.credit_amount < zero {
            return Err(LedgerError::Validation(format!(
                "entry amounts must not be negative (account {})",
                self.account_id
            )));
        }
        let has_debit = self.debit_amount > zero;
        let has_credit = self.credit_amount > zero;
        if has_debit == has_credit {
            return Err(LedgerError::Validation(format!(
                "entry must have exactly one of debit or credit set (account {})",
                self.account_id
            )));
        }
        Ok(())
    }
}

/// A balanced group of entries representing one business event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: String,
    /// Business event behind this transaction
    pub txn_type: TransactionType,
    /// Date when the event occurred
    pub date: NaiveDate,
    /// Face amount of the transaction
    pub amount: BigDecimal,
    /// Human-readable description of the event
    pub description: String,
    /// Optional reference (cheque number, UTR, invoice number)
    pub reference: Option<String>,
    /// Optional free-form notes
    pub notes: Option<String>,
    /// The balanced ledger lines (two or more)
    pub entries: Vec<TransactionEntry>,
    /// Originating payment record, if any
    pub payment_id: Option<String>,
    /// Originating receipt record, if any
    pub receipt_id: Option<String>,
    /// Originating purchase document, if any
    pub purchase_id: Option<String>,
    /// Originating sale document, if any
    pub sale_id: Option<String>,
    /// When the transaction was created
    pub created_at: NaiveDateTime,
    /// When the transaction was last updated
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    /// Create a new transaction with no entries yet
    pub fn new(
        txn_type: TransactionType,
        date: NaiveDate,
        amount: BigDecimal,
        description: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            txn_type,
            date,
            amount: round_money(&amount),
            description,
            reference: None,
            notes: None,
            entries: Vec::new(),
            payment_id: None,
            receipt_id: None,
            purchase_id: None,
            sale_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an entry to the transaction
    pub fn add_entry(&mut self, entry: TransactionEntry) {
        self.entries.push(entry);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Sum of all debit amounts
    pub fn total_debits(&self) -> BigDecimal {
        self.entries.iter().map(|e| &e.debit_amount).sum()
    }

    /// Sum of all credit amounts
    pub fn total_credits(&self) -> BigDecimal {
        self.entries.iter().map(|e| &e.credit_amount).sum()
    }

    /// Check if the transaction is balanced (debits = credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Validate the double-entry invariants
    pub fn validate(&self) -> LedgerResult<()> {
        if self.entries.len() < 2 {
            return Err(LedgerError::Validation(
                "transaction must have at least two entries for double-entry bookkeeping"
                    .to_string(),
            ));
        }

        for entry in &self.entries {
            entry.validate()?;
        }

        if !self.is_balanced() {
            return Err(LedgerError::Validation(format!(
                "transaction is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        Ok(())
    }
}

/// Business record created when a payment is posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub supplier_id: Option<String>,
    pub purchase_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// The ledger transaction this payment produced
    pub transaction_id: String,
    pub created_at: NaiveDateTime,
}

/// Business record created when a receipt is posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub id: String,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub customer_id: Option<String>,
    pub sale_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// The ledger transaction this receipt produced
    pub transaction_id: String,
    pub created_at: NaiveDateTime,
}

/// A supplier or customer directory row, as the ledger sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
}

/// A purchase document, as the ledger sees it.
/// `balance` is kept denormalized as `total_amount - paid_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDocument {
    pub id: String,
    pub supplier_id: String,
    pub total_amount: BigDecimal,
    pub paid_amount: BigDecimal,
    pub balance: BigDecimal,
}

/// A sale document, as the ledger sees it.
/// `balance` is kept denormalized as `total_amount - received_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDocument {
    pub id: String,
    pub customer_id: String,
    pub total_amount: BigDecimal,
    pub received_amount: BigDecimal,
    pub balance: BigDecimal,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Missing or malformed input; nothing was persisted
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),
    #[error("Sale not found: {0}")]
    SaleNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    /// Account code already in use
    #[error("Duplicate account code: {0}")]
    DuplicateCode(String),
    /// Account is inactive or not eligible for the requested role
    #[error("Invalid account state: {0}")]
    InvalidAccountState(String),
    /// The operation would break a bookkeeping invariant
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),
    /// The underlying store could not commit; safe to retry
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
