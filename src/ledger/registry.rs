//! Account registry: chart of accounts management

use bigdecimal::BigDecimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Input for creating one account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<String>,
    pub opening_balance: Option<BigDecimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub supplier_id: Option<String>,
    pub customer_id: Option<String>,
    pub can_debit_on_payment: bool,
    pub can_credit_on_receipt: bool,
}

impl NewAccount {
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
            opening_balance: None,
            description: None,
            is_active: None,
            supplier_id: None,
            customer_id: None,
            can_debit_on_payment: false,
            can_credit_on_receipt: false,
        }
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn opening_balance(mut self, amount: BigDecimal) -> Self {
        self.opening_balance = Some(amount);
        self
    }

    pub fn supplier(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Allow the account as a payment's debit side regardless of its type
    pub fn allow_payment_debit(mut self) -> Self {
        self.can_debit_on_payment = true;
        self
    }

    /// Allow the account as a receipt's credit side regardless of its type
    pub fn allow_receipt_credit(mut self) -> Self {
        self.can_credit_on_receipt = true;
        self
    }
}

/// One node of the hierarchical chart of accounts
#[derive(Debug, Clone, PartialEq)]
pub struct AccountNode {
    pub account: Account,
    pub children: Vec<AccountNode>,
}

/// Per-item failure from a bulk account creation
#[derive(Debug)]
pub struct BulkCreateFailure {
    /// Position of the failed item in the input batch
    pub index: usize,
    pub code: String,
    pub error: LedgerError,
}

/// Outcome of a bulk account creation: some items may succeed while
/// others fail, and the caller gets both lists (multi-status semantics).
#[derive(Debug)]
pub struct BulkCreateOutcome {
    pub created: Vec<Account>,
    pub failures: Vec<BulkCreateFailure>,
}

/// Registry managing the chart of accounts
pub struct AccountRegistry<S: LedgerStore> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStore> AccountRegistry<S> {
    /// Create a new registry over the given store
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a registry with a custom account validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account.
    ///
    /// Fails with [`LedgerError::DuplicateCode`] if the code is taken,
    /// [`LedgerError::AccountNotFound`] if the parent does not exist, and
    /// [`LedgerError::Validation`] if the parent's type differs from the
    /// requested type.
    pub async fn create_account(&mut self, spec: NewAccount) -> LedgerResult<Account> {
        let mut account = Account::new(
            Uuid::new_v4().to_string(),
            spec.code,
            spec.name,
            spec.account_type,
            spec.parent_id,
        );
        if let Some(opening) = spec.opening_balance {
            account = account.with_opening_balance(opening);
        }
        if let Some(supplier_id) = spec.supplier_id {
            account = account.with_supplier(supplier_id);
        }
        if let Some(customer_id) = spec.customer_id {
            account = account.with_customer(customer_id);
        }
        account.description = spec.description;
        account.can_debit_on_payment = spec.can_debit_on_payment;
        account.can_credit_on_receipt = spec.can_credit_on_receipt;
        if let Some(is_active) = spec.is_active {
            account.is_active = is_active;
        }

        self.validator.validate_account(&account)?;

        if self.storage.get_account_by_code(&account.code).await?.is_some() {
            return Err(LedgerError::DuplicateCode(account.code));
        }

        // An account's type must match its parent's type
        if let Some(ref parent_id) = account.parent_id {
            let parent = self
                .storage
                .get_account(parent_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(parent_id.clone()))?;
            if parent.account_type != account.account_type {
                return Err(LedgerError::Validation(format!(
                    "account type {} does not match parent '{}' type {}",
                    account.account_type.label(),
                    parent.code,
                    parent.account_type.label()
                )));
            }
        }

        self.storage.save_account(&account).await?;
        tracing::info!(code = %account.code, name = %account.name, "account created");

        Ok(account)
    }

    /// Create a batch of accounts, validating and persisting each item
    /// independently. One bad item never aborts the rest; the outcome
    /// enumerates successes and per-item failures.
    pub async fn create_accounts(&mut self, specs: Vec<NewAccount>) -> BulkCreateOutcome {
        let mut created = Vec::new();
        let mut failures = Vec::new();

        for (index, spec) in specs.into_iter().enumerate() {
            let code = spec.code.clone();
            match self.create_account(spec).await {
                Ok(account) => created.push(account),
                Err(error) => failures.push(BulkCreateFailure { index, code, error }),
            }
        }

        BulkCreateOutcome { created, failures }
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Get an account by code, returning an error if not found
    pub async fn get_account_by_code_required(&self, code: &str) -> LedgerResult<Account> {
        self.storage
            .get_account_by_code(code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(format!("code {code}")))
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// The active chart of accounts as a tree: root accounts with children
    /// attached recursively, every level sorted by code.
    pub async fn chart_of_accounts(&self) -> LedgerResult<Vec<AccountNode>> {
        let accounts = self.storage.list_accounts(None).await?;

        let mut by_parent: HashMap<Option<String>, Vec<Account>> = HashMap::new();
        for account in accounts.into_iter().filter(|a| a.is_active) {
            by_parent
                .entry(account.parent_id.clone())
                .or_default()
                .push(account);
        }

        fn build(
            parent_id: Option<&str>,
            by_parent: &HashMap<Option<String>, Vec<Account>>,
        ) -> Vec<AccountNode> {
            let mut accounts = by_parent
                .get(&parent_id.map(str::to_string))
                .cloned()
                .unwrap_or_default();
            accounts.sort_by(|a, b| a.code.cmp(&b.code));
            accounts
                .into_iter()
                .map(|account| {
                    let children = build(Some(account.id.as_str()), by_parent);
                    AccountNode { account, children }
                })
                .collect()
        }

        Ok(build(None, &by_parent))
    }

    /// Active accounts usable as the debited side of a payment: all Expense
    /// accounts, supplier-linked Liability accounts, and accounts flagged
    /// with `can_debit_on_payment`.
    pub async fn payment_debit_accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .storage
            .list_accounts(None)
            .await?
            .into_iter()
            .filter(|a| a.is_active && a.is_payment_debit_eligible())
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    /// Active accounts usable as the credited side of a receipt: all Revenue
    /// accounts, customer-linked Asset (receivable) accounts, and accounts
    /// flagged with `can_credit_on_receipt`.
    pub async fn receipt_credit_accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .storage
            .list_accounts(None)
            .await?
            .into_iter()
            .filter(|a| a.is_active && a.is_receipt_credit_eligible())
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    /// Soft-delete an account; it keeps its history but takes no new postings
    pub async fn deactivate(&mut self, account_id: &str) -> LedgerResult<Account> {
        let mut account = self.get_account_required(account_id).await?;
        account.is_active = false;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Hard-delete an account. Refused once the account has postings or
    /// child accounts; deactivate it instead.
    pub async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        let account = self.get_account_required(account_id).await?;

        if self.storage.account_has_entries(account_id).await? {
            return Err(LedgerError::ConsistencyViolation(format!(
                "account '{}' has ledger entries and cannot be deleted; deactivate it instead",
                account.code
            )));
        }

        let has_children = self
            .storage
            .list_accounts(None)
            .await?
            .iter()
            .any(|a| a.parent_id.as_deref() == Some(account_id));
        if has_children {
            return Err(LedgerError::ConsistencyViolation(format!(
                "account '{}' has child accounts and cannot be deleted",
                account.code
            )));
        }

        self.storage.delete_account(account_id).await
    }

    /// Mint the subsidiary payable account for a supplier under the fixed
    /// Trade Payables parent.
    pub async fn create_supplier_account(&mut self, supplier: &Party) -> LedgerResult<Account> {
        let parent = self
            .get_account_by_code_required(codes::TRADE_PAYABLES)
            .await?;
        let code = self.next_child_code(&parent).await?;
        self.create_account(
            NewAccount::new(
                code,
                format!("{} - Payable", supplier.name),
                AccountType::Liability,
            )
            .parent(parent.id)
            .supplier(supplier.id.clone()),
        )
        .await
    }

    /// Mint the subsidiary receivable account for a customer under the fixed
    /// Trade Receivables parent.
    pub async fn create_customer_account(&mut self, customer: &Party) -> LedgerResult<Account> {
        let parent = self
            .get_account_by_code_required(codes::TRADE_RECEIVABLES)
            .await?;
        let code = self.next_child_code(&parent).await?;
        self.create_account(
            NewAccount::new(
                code,
                format!("{} - Receivable", customer.name),
                AccountType::Asset,
            )
            .parent(parent.id)
            .customer(customer.id.clone()),
        )
        .await
    }

    /// First free "<parent code>.<n>" code under the parent
    async fn next_child_code(&self, parent: &Account) -> LedgerResult<String> {
        let sibling_count = self
            .storage
            .list_accounts(None)
            .await?
            .iter()
            .filter(|a| a.parent_id.as_deref() == Some(parent.id.as_str()))
            .count();

        let mut suffix = sibling_count + 1;
        loop {
            let candidate = format!("{}.{}", parent.code, suffix);
            if self.storage.get_account_by_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}
