//! In-memory store implementation for testing and development
//!
//! Holds all state behind one `RwLock`, so `commit_posting` is genuinely
//! all-or-nothing: everything a posting carries is applied under a single
//! write lock, after every lookup it depends on has succeeded.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    transactions: HashMap<String, Transaction>,
    payments: HashMap<String, PaymentRecord>,
    receipts: HashMap<String, ReceiptRecord>,
    suppliers: HashMap<String, Party>,
    customers: HashMap<String, Party>,
    purchases: HashMap<String, PurchaseDocument>,
    sales: HashMap<String, SaleDocument>,
}

/// In-memory storage for tests and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.inner.write().unwrap() = Inner::default();
    }

    /// Arm a one-shot failure: the next `commit_posting` returns a
    /// [`LedgerError::Storage`] before writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Seed a supplier directory row
    pub fn seed_supplier(&self, supplier: Party) {
        self.inner
            .write()
            .unwrap()
            .suppliers
            .insert(supplier.id.clone(), supplier);
    }

    /// Seed a customer directory row
    pub fn seed_customer(&self, customer: Party) {
        self.inner
            .write()
            .unwrap()
            .customers
            .insert(customer.id.clone(), customer);
    }

    /// Seed a purchase document
    pub fn seed_purchase(&self, purchase: PurchaseDocument) {
        self.inner
            .write()
            .unwrap()
            .purchases
            .insert(purchase.id.clone(), purchase);
    }

    /// Seed a sale document
    pub fn seed_sale(&self, sale: SaleDocument) {
        self.inner
            .write()
            .unwrap()
            .sales
            .insert(sale.id.clone(), sale);
    }

    /// Look up a stored payment record (test inspection)
    pub fn payment(&self, payment_id: &str) -> Option<PaymentRecord> {
        self.inner.read().unwrap().payments.get(payment_id).cloned()
    }

    /// Look up a stored receipt record (test inspection)
    pub fn receipt(&self, receipt_id: &str) -> Option<ReceiptRecord> {
        self.inner.read().unwrap().receipts.get(receipt_id).cloned()
    }

    /// Current state of a purchase document (test inspection)
    pub fn purchase(&self, purchase_id: &str) -> Option<PurchaseDocument> {
        self.inner
            .read()
            .unwrap()
            .purchases
            .get(purchase_id)
            .cloned()
    }

    /// Current state of a sale document (test inspection)
    pub fn sale(&self, sale_id: &str) -> Option<SaleDocument> {
        self.inner.read().unwrap().sales.get(sale_id).cloned()
    }

    /// Number of stored transactions (test inspection)
    pub fn transaction_count(&self) -> usize {
        self.inner.read().unwrap().transactions.len()
    }

    /// Every stored transaction (test inspection)
    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner
            .read()
            .unwrap()
            .transactions
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.inner.read().unwrap().accounts.get(account_id).cloned())
    }

    async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .accounts
            .values()
            .filter(|a| account_type.is_none_or(|t| a.account_type == t))
            .cloned()
            .collect())
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.accounts.contains_key(&account.id) {
            inner.accounts.insert(account.id.clone(), account.clone());
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound(account.id.clone()))
        }
    }

    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        if self
            .inner
            .write()
            .unwrap()
            .accounts
            .remove(account_id)
            .is_some()
        {
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound(account_id.to_string()))
        }
    }

    async fn account_has_entries(&self, account_id: &str) -> LedgerResult<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner.transactions.values().any(|txn| {
            txn.entries.iter().any(|e| e.account_id == account_id)
        }))
    }

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .transactions
            .get(transaction_id)
            .cloned())
    }

    async fn account_transactions(&self, account_id: &str) -> LedgerResult<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .transactions
            .values()
            .filter(|txn| txn.entries.iter().any(|e| e.account_id == account_id))
            .cloned()
            .collect())
    }

    async fn delete_transaction(&mut self, transaction_id: &str) -> LedgerResult<()> {
        if self
            .inner
            .write()
            .unwrap()
            .transactions
            .remove(transaction_id)
            .is_some()
        {
            Ok(())
        } else {
            Err(LedgerError::TransactionNotFound(transaction_id.to_string()))
        }
    }

    async fn commit_posting(&mut self, posting: Posting) -> LedgerResult<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Storage(
                "injected commit failure".to_string(),
            ));
        }

        let mut inner = self.inner.write().unwrap();

        // Resolve the document before any write so a missing reference
        // leaves the store untouched
        let mut updated_purchase: Option<PurchaseDocument> = None;
        let mut updated_sale: Option<SaleDocument> = None;
        match &posting.document_update {
            Some(DocumentUpdate {
                document: DocumentRef::Purchase(id),
                amount,
            }) => {
                let mut doc = inner
                    .purchases
                    .get(id)
                    .cloned()
                    .ok_or_else(|| LedgerError::PurchaseNotFound(id.clone()))?;
                doc.paid_amount = round_money(&(&doc.paid_amount + amount));
                doc.balance = round_money(&(&doc.total_amount - &doc.paid_amount));
                updated_purchase = Some(doc);
            }
            Some(DocumentUpdate {
                document: DocumentRef::Sale(id),
                amount,
            }) => {
                let mut doc = inner
                    .sales
                    .get(id)
                    .cloned()
                    .ok_or_else(|| LedgerError::SaleNotFound(id.clone()))?;
                doc.received_amount = round_money(&(&doc.received_amount + amount));
                doc.balance = round_money(&(&doc.total_amount - &doc.received_amount));
                updated_sale = Some(doc);
            }
            None => {}
        }

        inner
            .transactions
            .insert(posting.transaction.id.clone(), posting.transaction);
        if let Some(payment) = posting.payment {
            inner.payments.insert(payment.id.clone(), payment);
        }
        if let Some(receipt) = posting.receipt {
            inner.receipts.insert(receipt.id.clone(), receipt);
        }
        if let Some(purchase) = updated_purchase {
            inner.purchases.insert(purchase.id.clone(), purchase);
        }
        if let Some(sale) = updated_sale {
            inner.sales.insert(sale.id.clone(), sale);
        }

        Ok(())
    }
}

#[async_trait]
impl PartyDirectory for MemoryStore {
    async fn get_supplier(&self, supplier_id: &str) -> LedgerResult<Option<Party>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .suppliers
            .get(supplier_id)
            .cloned())
    }

    async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Party>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .customers
            .get(customer_id)
            .cloned())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_purchase(&self, purchase_id: &str) -> LedgerResult<Option<PurchaseDocument>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .purchases
            .get(purchase_id)
            .cloned())
    }

    async fn get_sale(&self, sale_id: &str) -> LedgerResult<Option<SaleDocument>> {
        Ok(self.inner.read().unwrap().sales.get(sale_id).cloned())
    }
}
