//! Main ledger facade that wires the registry, posting engine, and readers
//! over one injected store handle

use std::collections::HashMap;

use crate::ledger::balance::{BalanceCalculator, BalanceContext, BalanceReport};
use crate::ledger::posting::{
    PaymentRequest, PostedPayment, PostedReceipt, PostingEngine, PurchaseInvoice, ReceiptRequest,
    SaleInvoice,
};
use crate::ledger::registry::{AccountNode, AccountRegistry, BulkCreateOutcome, NewAccount};
use crate::ledger::report::{LedgerLine, LedgerReporter, TrialBalance};
use crate::traits::*;
use crate::types::*;

/// The full bookkeeping system behind one storage handle.
///
/// The handle is constructed by the caller and injected here; it is opened at
/// process start and closed at shutdown, never reached through a global.
pub struct Ledger<S: LedgerStore + PartyDirectory + DocumentStore> {
    registry: AccountRegistry<S>,
    posting: PostingEngine<S>,
    balances: BalanceCalculator<S>,
    reporter: LedgerReporter<S>,
}

impl<S: LedgerStore + PartyDirectory + DocumentStore + Clone> Ledger<S> {
    /// Create a new ledger over the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            registry: AccountRegistry::new(storage.clone()),
            posting: PostingEngine::new(storage.clone()),
            balances: BalanceCalculator::new(storage.clone()),
            reporter: LedgerReporter::new(storage),
        }
    }

    /// Create a new ledger with a custom account validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self {
            registry: AccountRegistry::with_validator(storage.clone(), validator),
            posting: PostingEngine::new(storage.clone()),
            balances: BalanceCalculator::new(storage.clone()),
            reporter: LedgerReporter::new(storage),
        }
    }

    // Account registry operations

    /// Create a single account
    pub async fn create_account(&mut self, spec: NewAccount) -> LedgerResult<Account> {
        self.registry.create_account(spec).await
    }

    /// Create a batch of accounts with per-item success/failure reporting
    pub async fn create_accounts(&mut self, specs: Vec<NewAccount>) -> BulkCreateOutcome {
        self.registry.create_accounts(specs).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.registry.get_account(account_id).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.registry.list_accounts().await
    }

    /// The active chart of accounts as a tree
    pub async fn chart_of_accounts(&self) -> LedgerResult<Vec<AccountNode>> {
        self.registry.chart_of_accounts().await
    }

    /// Accounts eligible as a payment's debit side
    pub async fn payment_debit_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.registry.payment_debit_accounts().await
    }

    /// Accounts eligible as a receipt's credit side
    pub async fn receipt_credit_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.registry.receipt_credit_accounts().await
    }

    /// Soft-delete an account
    pub async fn deactivate_account(&mut self, account_id: &str) -> LedgerResult<Account> {
        self.registry.deactivate(account_id).await
    }

    /// Hard-delete an account without postings
    pub async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        self.registry.delete_account(account_id).await
    }

    /// Mint a supplier's subsidiary payable account
    pub async fn create_supplier_account(&mut self, supplier: &Party) -> LedgerResult<Account> {
        self.registry.create_supplier_account(supplier).await
    }

    /// Mint a customer's subsidiary receivable account
    pub async fn create_customer_account(&mut self, customer: &Party) -> LedgerResult<Account> {
        self.registry.create_customer_account(customer).await
    }

    // Posting operations

    /// Post a payment (see [`PostingEngine::post_payment`])
    pub async fn post_payment(&mut self, request: PaymentRequest) -> LedgerResult<PostedPayment> {
        self.posting.post_payment(request).await
    }

    /// Post a receipt (see [`PostingEngine::post_receipt`])
    pub async fn post_receipt(&mut self, request: ReceiptRequest) -> LedgerResult<PostedReceipt> {
        self.posting.post_receipt(request).await
    }

    /// Post the ledger side of a new purchase document
    pub async fn post_purchase(&mut self, invoice: PurchaseInvoice) -> LedgerResult<Transaction> {
        self.posting.post_purchase(invoice).await
    }

    /// Post the ledger side of a new sale document
    pub async fn post_sale(&mut self, invoice: SaleInvoice) -> LedgerResult<Transaction> {
        self.posting.post_sale(invoice).await
    }

    /// Record a hand-written journal transaction
    pub async fn record_journal(&mut self, transaction: Transaction) -> LedgerResult<Transaction> {
        self.posting.record_journal(transaction).await
    }

    /// Cascade-delete a posting with its entries
    pub async fn unpost(&mut self, transaction_id: &str) -> LedgerResult<()> {
        self.posting.unpost(transaction_id).await
    }

    /// Refuse amendment of a purchase total once payments exist against it
    pub async fn ensure_purchase_amendable(&self, purchase_id: &str) -> LedgerResult<()> {
        self.posting.ensure_purchase_amendable(purchase_id).await
    }

    /// Refuse amendment of a sale total once receipts exist against it
    pub async fn ensure_sale_amendable(&self, sale_id: &str) -> LedgerResult<()> {
        self.posting.ensure_sale_amendable(sale_id).await
    }

    // Read operations

    /// Classified balance of one account
    pub async fn account_balance(
        &self,
        account_id: &str,
        context: Option<BalanceContext>,
    ) -> LedgerResult<BalanceReport> {
        self.balances.balance(account_id, context).await
    }

    /// Full running-balance ledger of one account
    pub async fn account_ledger(&self, account_id: &str) -> LedgerResult<Vec<LedgerLine>> {
        self.reporter.ledger(account_id).await
    }

    /// Trial balance across all accounts
    pub async fn trial_balance(&self) -> LedgerResult<TrialBalance> {
        self.reporter.trial_balance().await
    }

    /// Seed the well-known accounts every working chart needs
    /// (cash, bank, receivables, inventory, payables, equity, revenue,
    /// purchases). Idempotent: existing codes are kept as they are.
    pub async fn bootstrap_chart(&mut self) -> LedgerResult<HashMap<String, Account>> {
        let defaults = [
            (codes::CASH, "Cash", AccountType::Asset),
            (codes::BANK, "Bank", AccountType::Asset),
            (
                codes::TRADE_RECEIVABLES,
                "Trade Receivables",
                AccountType::Asset,
            ),
            (codes::INVENTORY, "Inventory", AccountType::Asset),
            (codes::TRADE_PAYABLES, "Trade Payables", AccountType::Liability),
            (codes::OWNERS_EQUITY, "Owner's Equity", AccountType::Equity),
            (codes::SALES_REVENUE, "Sales Revenue", AccountType::Revenue),
            (codes::PURCHASES, "Purchases", AccountType::Expense),
        ];

        let mut accounts = HashMap::new();
        for (code, name, account_type) in defaults {
            let account = match self.registry.storage.get_account_by_code(code).await? {
                Some(existing) => existing,
                None => {
                    self.registry
                        .create_account(NewAccount::new(code, name, account_type))
                        .await?
                }
            };
            accounts.insert(code.to_string(), account);
        }
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn bootstrap_then_pay_a_supplier() {
        let storage = MemoryStore::new();
        storage.seed_supplier(Party {
            id: "sup-1".to_string(),
            name: "ABC Traders".to_string(),
        });

        let mut ledger = Ledger::new(storage);
        ledger.bootstrap_chart().await.unwrap();

        let payable = ledger
            .create_supplier_account(&Party {
                id: "sup-1".to_string(),
                name: "ABC Traders".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(payable.code, "2100.1");
        assert_eq!(payable.supplier_id.as_deref(), Some("sup-1"));

        let posted = ledger
            .post_payment(
                PaymentRequest::new(&payable.id, PaymentMethod::Cash, dec("500"))
                    .supplier("sup-1")
                    .date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(posted.transaction.entries.len(), 2);
        assert!(posted.transaction.is_balanced());
        assert_eq!(
            posted.transaction.description,
            "Payment (Cash) to ABC Traders"
        );

        let report = ledger.account_balance(&payable.id, None).await.unwrap();
        assert_eq!(report.accounting_balance, dec("500.00"));
        assert_eq!(report.nature, BalanceNature::Debit);
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let first = ledger.bootstrap_chart().await.unwrap();
        let second = ledger.bootstrap_chart().await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(
            first[codes::CASH].id,
            second[codes::CASH].id
        );
    }
}
