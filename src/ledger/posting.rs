//! Posting engine: translates business events into balanced ledger postings
//!
//! Every operation here resolves its participant accounts, builds a balanced
//! transaction, and hands the whole unit to [`LedgerStore::commit_posting`] in
//! one all-or-nothing step. Nothing is persisted piecemeal.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Request to post a payment against a supplier or expense
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// The liability/expense account being settled (caller's choice)
    pub debit_account_id: String,
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub supplier_id: Option<String>,
    pub purchase_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn new(
        debit_account_id: impl Into<String>,
        method: PaymentMethod,
        amount: BigDecimal,
    ) -> Self {
        Self {
            debit_account_id: debit_account_id.into(),
            method,
            amount,
            supplier_id: None,
            purchase_id: None,
            date: None,
            reference: None,
            notes: None,
        }
    }

    pub fn supplier(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    pub fn purchase(mut self, purchase_id: impl Into<String>) -> Self {
        self.purchase_id = Some(purchase_id.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Request to post a receipt from a customer or revenue source
#[derive(Debug, Clone)]
pub struct ReceiptRequest {
    /// The revenue/receivable account being settled (caller's choice)
    pub credit_account_id: String,
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub customer_id: Option<String>,
    pub sale_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl ReceiptRequest {
    pub fn new(
        credit_account_id: impl Into<String>,
        method: PaymentMethod,
        amount: BigDecimal,
    ) -> Self {
        Self {
            credit_account_id: credit_account_id.into(),
            method,
            amount,
            customer_id: None,
            sale_id: None,
            date: None,
            reference: None,
            notes: None,
        }
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn sale(mut self, sale_id: impl Into<String>) -> Self {
        self.sale_id = Some(sale_id.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of a payment posting
#[derive(Debug, Clone)]
pub struct PostedPayment {
    pub payment: PaymentRecord,
    pub transaction: Transaction,
}

/// Result of a receipt posting
#[derive(Debug, Clone)]
pub struct PostedReceipt {
    pub receipt: ReceiptRecord,
    pub transaction: Transaction,
}

/// One line of a purchase invoice
#[derive(Debug, Clone)]
pub struct PurchaseLine {
    pub quantity: BigDecimal,
    pub weight_deduction: BigDecimal,
    pub rate: BigDecimal,
}

impl PurchaseLine {
    pub fn new(quantity: BigDecimal, weight_deduction: BigDecimal, rate: BigDecimal) -> Self {
        Self {
            quantity,
            weight_deduction,
            rate,
        }
    }

    /// Billable quantity: the weight deduction comes off before the rate
    /// applies, floored at zero.
    pub fn billable_quantity(&self) -> BigDecimal {
        let net = &self.quantity - &self.weight_deduction;
        if net < BigDecimal::from(0) {
            BigDecimal::from(0)
        } else {
            net
        }
    }

    /// Line amount before rounding
    pub fn amount(&self) -> BigDecimal {
        self.billable_quantity() * &self.rate
    }
}

/// Total invoice amount over purchase lines, rounded once at the end
pub fn purchase_invoice_amount(lines: &[PurchaseLine]) -> BigDecimal {
    let total: BigDecimal = lines.iter().map(|line| line.amount()).sum();
    round_money(&total)
}

/// A purchase invoice to post at document creation time
#[derive(Debug, Clone)]
pub struct PurchaseInvoice {
    pub purchase_id: String,
    pub supplier_id: String,
    pub date: NaiveDate,
    pub lines: Vec<PurchaseLine>,
    pub reference: Option<String>,
}

/// A sale invoice to post at document creation time
#[derive(Debug, Clone)]
pub struct SaleInvoice {
    pub sale_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub amount: BigDecimal,
    pub reference: Option<String>,
}

/// The posting engine. Generic over one injected store handle that also
/// provides the party directory and document reads.
pub struct PostingEngine<S: LedgerStore + PartyDirectory + DocumentStore> {
    storage: S,
}

impl<S: LedgerStore + PartyDirectory + DocumentStore> PostingEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Post a payment: debit the chosen payable/expense account, credit the
    /// cash or bank account selected by the payment method.
    ///
    /// If a purchase is referenced, its cumulative `paid_amount` goes up and
    /// its `balance` comes down by the payment amount, inside the same atomic
    /// unit as the transaction itself.
    pub async fn post_payment(&mut self, request: PaymentRequest) -> LedgerResult<PostedPayment> {
        validation::validate_positive_amount(&request.amount)?;
        let amount = round_money(&request.amount);

        let debit_account = self.active_account(&request.debit_account_id).await?;
        if !debit_account.is_payment_debit_eligible() {
            return Err(LedgerError::InvalidAccountState(format!(
                "account '{}' ({}) is not eligible as a payment debit target",
                debit_account.code,
                debit_account.account_type.label()
            )));
        }

        let settlement = self
            .active_account_by_code(request.method.settlement_account_code())
            .await?;

        let supplier = match &request.supplier_id {
            Some(id) => Some(
                self.storage
                    .get_supplier(id)
                    .await?
                    .ok_or_else(|| LedgerError::SupplierNotFound(id.clone()))?,
            ),
            None => None,
        };

        if let Some(purchase_id) = &request.purchase_id {
            let purchase = self
                .storage
                .get_purchase(purchase_id)
                .await?
                .ok_or_else(|| LedgerError::PurchaseNotFound(purchase_id.clone()))?;
            if let Some(supplier_id) = &request.supplier_id {
                if &purchase.supplier_id != supplier_id {
                    return Err(LedgerError::ConsistencyViolation(format!(
                        "purchase '{}' belongs to supplier '{}', not '{}'",
                        purchase_id, purchase.supplier_id, supplier_id
                    )));
                }
            }
        }

        let payee = supplier
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| debit_account.name.clone());
        let date = request
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let description = format!("Payment ({}) to {}", request.method.label(), payee);

        let mut transaction =
            Transaction::new(TransactionType::Payment, date, amount.clone(), description);
        transaction.reference = request.reference.clone();
        transaction.notes = request.notes.clone();
        transaction.purchase_id = request.purchase_id.clone();
        transaction.add_entry(TransactionEntry::debit(
            debit_account.id.clone(),
            amount.clone(),
            Some(format!("Paid to {payee}")),
        ));
        transaction.add_entry(TransactionEntry::credit(
            settlement.id.clone(),
            amount.clone(),
            Some(format!("{} out", settlement.name)),
        ));
        transaction.validate()?;

        let payment = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            date,
            method: request.method,
            amount: amount.clone(),
            supplier_id: request.supplier_id.clone(),
            purchase_id: request.purchase_id.clone(),
            reference: request.reference,
            notes: request.notes,
            transaction_id: transaction.id.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        transaction.payment_id = Some(payment.id.clone());

        let document_update = request.purchase_id.clone().map(|id| DocumentUpdate {
            document: DocumentRef::Purchase(id),
            amount: amount.clone(),
        });

        self.storage
            .commit_posting(Posting {
                transaction: transaction.clone(),
                payment: Some(payment.clone()),
                receipt: None,
                document_update,
            })
            .await?;

        tracing::info!(
            transaction = %transaction.id,
            amount = %amount,
            method = request.method.label(),
            "payment posted"
        );

        Ok(PostedPayment {
            payment,
            transaction,
        })
    }

    /// Post a receipt: debit the cash or bank account selected by the payment
    /// method, credit the chosen receivable/revenue account.
    pub async fn post_receipt(&mut self, request: ReceiptRequest) -> LedgerResult<PostedReceipt> {
        validation::validate_positive_amount(&request.amount)?;
        let amount = round_money(&request.amount);

        let credit_account = self.active_account(&request.credit_account_id).await?;
        if !credit_account.is_receipt_credit_eligible() {
            return Err(LedgerError::InvalidAccountState(format!(
                "account '{}' ({}) is not eligible as a receipt credit target",
                credit_account.code,
                credit_account.account_type.label()
            )));
        }

        let settlement = self
            .active_account_by_code(request.method.settlement_account_code())
            .await?;

        let customer = match &request.customer_id {
            Some(id) => Some(
                self.storage
                    .get_customer(id)
                    .await?
                    .ok_or_else(|| LedgerError::CustomerNotFound(id.clone()))?,
            ),
            None => None,
        };

        if let Some(sale_id) = &request.sale_id {
            let sale = self
                .storage
                .get_sale(sale_id)
                .await?
                .ok_or_else(|| LedgerError::SaleNotFound(sale_id.clone()))?;
            if let Some(customer_id) = &request.customer_id {
                if &sale.customer_id != customer_id {
                    return Err(LedgerError::ConsistencyViolation(format!(
                        "sale '{}' belongs to customer '{}', not '{}'",
                        sale_id, sale.customer_id, customer_id
                    )));
                }
            }
        }

        let payer = customer
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| credit_account.name.clone());
        let date = request
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let description = format!("Receipt ({}) from {}", request.method.label(), payer);

        let mut transaction =
            Transaction::new(TransactionType::Receipt, date, amount.clone(), description);
        transaction.reference = request.reference.clone();
        transaction.notes = request.notes.clone();
        transaction.sale_id = request.sale_id.clone();
        transaction.add_entry(TransactionEntry::debit(
            settlement.id.clone(),
            amount.clone(),
            Some(format!("{} in", settlement.name)),
        ));
        transaction.add_entry(TransactionEntry::credit(
            credit_account.id.clone(),
            amount.clone(),
            Some(format!("Received from {payer}")),
        ));
        transaction.validate()?;

        let receipt = ReceiptRecord {
            id: Uuid::new_v4().to_string(),
            date,
            method: request.method,
            amount: amount.clone(),
            customer_id: request.customer_id.clone(),
            sale_id: request.sale_id.clone(),
            reference: request.reference,
            notes: request.notes,
            transaction_id: transaction.id.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        transaction.receipt_id = Some(receipt.id.clone());

        let document_update = request.sale_id.clone().map(|id| DocumentUpdate {
            document: DocumentRef::Sale(id),
            amount: amount.clone(),
        });

        self.storage
            .commit_posting(Posting {
                transaction: transaction.clone(),
                payment: None,
                receipt: Some(receipt.clone()),
                document_update,
            })
            .await?;

        tracing::info!(
            transaction = %transaction.id,
            amount = %amount,
            method = request.method.label(),
            "receipt posted"
        );

        Ok(PostedReceipt {
            receipt,
            transaction,
        })
    }

    /// Post the ledger side of a newly created purchase document:
    /// debit Inventory, credit the supplier's payable account.
    pub async fn post_purchase(&mut self, invoice: PurchaseInvoice) -> LedgerResult<Transaction> {
        let amount = purchase_invoice_amount(&invoice.lines);
        validation::validate_positive_amount(&amount)?;

        let supplier = self
            .storage
            .get_supplier(&invoice.supplier_id)
            .await?
            .ok_or_else(|| LedgerError::SupplierNotFound(invoice.supplier_id.clone()))?;

        let purchase = self
            .storage
            .get_purchase(&invoice.purchase_id)
            .await?
            .ok_or_else(|| LedgerError::PurchaseNotFound(invoice.purchase_id.clone()))?;
        if purchase.supplier_id != invoice.supplier_id {
            return Err(LedgerError::ConsistencyViolation(format!(
                "purchase '{}' belongs to supplier '{}', not '{}'",
                invoice.purchase_id, purchase.supplier_id, invoice.supplier_id
            )));
        }

        let inventory = self.active_account_by_code(codes::INVENTORY).await?;
        let payable = self.supplier_payable_account(&invoice.supplier_id).await?;

        let mut transaction = Transaction::new(
            TransactionType::Purchase,
            invoice.date,
            amount.clone(),
            format!("Purchase from {}", supplier.name),
        );
        transaction.reference = invoice.reference;
        transaction.purchase_id = Some(invoice.purchase_id.clone());
        transaction.add_entry(TransactionEntry::debit(
            inventory.id.clone(),
            amount.clone(),
            Some("Stock received".to_string()),
        ));
        transaction.add_entry(TransactionEntry::credit(
            payable.id.clone(),
            amount.clone(),
            Some(format!("Owed to {}", supplier.name)),
        ));
        transaction.validate()?;

        self.storage
            .commit_posting(Posting::transaction_only(transaction.clone()))
            .await?;

        tracing::info!(transaction = %transaction.id, amount = %amount, "purchase posted");

        Ok(transaction)
    }

    /// Post the ledger side of a newly created sale document:
    /// debit the customer's receivable account, credit Sales Revenue.
    pub async fn post_sale(&mut self, invoice: SaleInvoice) -> LedgerResult<Transaction> {
        validation::validate_positive_amount(&invoice.amount)?;
        let amount = round_money(&invoice.amount);

        let customer = self
            .storage
            .get_customer(&invoice.customer_id)
            .await?
            .ok_or_else(|| LedgerError::CustomerNotFound(invoice.customer_id.clone()))?;

        let sale = self
            .storage
            .get_sale(&invoice.sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(invoice.sale_id.clone()))?;
        if sale.customer_id != invoice.customer_id {
            return Err(LedgerError::ConsistencyViolation(format!(
                "sale '{}' belongs to customer '{}', not '{}'",
                invoice.sale_id, sale.customer_id, invoice.customer_id
            )));
        }

        let receivable = self
            .customer_receivable_account(&invoice.customer_id)
            .await?;
        let revenue = self.active_account_by_code(codes::SALES_REVENUE).await?;

        let mut transaction = Transaction::new(
            TransactionType::Sale,
            invoice.date,
            amount.clone(),
            format!("Sale to {}", customer.name),
        );
        transaction.reference = invoice.reference;
        transaction.sale_id = Some(invoice.sale_id.clone());
        transaction.add_entry(TransactionEntry::debit(
            receivable.id.clone(),
            amount.clone(),
            Some(format!("Due from {}", customer.name)),
        ));
        transaction.add_entry(TransactionEntry::credit(
            revenue.id.clone(),
            amount.clone(),
            Some("Sales revenue".to_string()),
        ));
        transaction.validate()?;

        self.storage
            .commit_posting(Posting::transaction_only(transaction.clone()))
            .await?;

        tracing::info!(transaction = %transaction.id, amount = %amount, "sale posted");

        Ok(transaction)
    }

    /// Record a hand-written journal transaction, usually built with
    /// [`TransactionComposer`]. Every referenced account must exist and be
    /// active.
    pub async fn record_journal(&mut self, transaction: Transaction) -> LedgerResult<Transaction> {
        validation::validate_description(&transaction.description)?;
        transaction.validate()?;
        for entry in &transaction.entries {
            self.active_account(&entry.account_id).await?;
        }
        self.storage
            .commit_posting(Posting::transaction_only(transaction.clone()))
            .await?;
        tracing::info!(transaction = %transaction.id, "journal posted");
        Ok(transaction)
    }

    /// Remove a posting when its originating business document is deleted.
    /// The transaction and its entries go together (cascade).
    pub async fn unpost(&mut self, transaction_id: &str) -> LedgerResult<()> {
        if self
            .storage
            .get_transaction(transaction_id)
            .await?
            .is_none()
        {
            return Err(LedgerError::TransactionNotFound(transaction_id.to_string()));
        }
        self.storage.delete_transaction(transaction_id).await?;
        tracing::info!(transaction = %transaction_id, "posting removed");
        Ok(())
    }

    /// Refuse amendment of a purchase's total once payments exist against it
    pub async fn ensure_purchase_amendable(&self, purchase_id: &str) -> LedgerResult<()> {
        let purchase = self
            .storage
            .get_purchase(purchase_id)
            .await?
            .ok_or_else(|| LedgerError::PurchaseNotFound(purchase_id.to_string()))?;
        if purchase.paid_amount > BigDecimal::from(0) {
            return Err(LedgerError::ConsistencyViolation(format!(
                "purchase '{}' already has {} paid against it; its total amount can no longer change",
                purchase_id, purchase.paid_amount
            )));
        }
        Ok(())
    }

    /// Same restriction, applied symmetrically to sales and receipts
    pub async fn ensure_sale_amendable(&self, sale_id: &str) -> LedgerResult<()> {
        let sale = self
            .storage
            .get_sale(sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(sale_id.to_string()))?;
        if sale.received_amount > BigDecimal::from(0) {
            return Err(LedgerError::ConsistencyViolation(format!(
                "sale '{}' already has {} received against it; its total amount can no longer change",
                sale_id, sale.received_amount
            )));
        }
        Ok(())
    }

    async fn active_account(&self, account_id: &str) -> LedgerResult<Account> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        if !account.is_active {
            return Err(LedgerError::InvalidAccountState(format!(
                "account '{}' is inactive",
                account.code
            )));
        }
        Ok(account)
    }

    async fn active_account_by_code(&self, code: &str) -> LedgerResult<Account> {
        let account = self
            .storage
            .get_account_by_code(code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(format!("code {code}")))?;
        if !account.is_active {
            return Err(LedgerError::InvalidAccountState(format!(
                "account '{}' is inactive",
                account.code
            )));
        }
        Ok(account)
    }

    async fn supplier_payable_account(&self, supplier_id: &str) -> LedgerResult<Account> {
        self.storage
            .list_accounts(Some(AccountType::Liability))
            .await?
            .into_iter()
            .find(|a| a.is_active && a.supplier_id.as_deref() == Some(supplier_id))
            .ok_or_else(|| {
                LedgerError::AccountNotFound(format!("payable account for supplier {supplier_id}"))
            })
    }

    async fn customer_receivable_account(&self, customer_id: &str) -> LedgerResult<Account> {
        self.storage
            .list_accounts(Some(AccountType::Asset))
            .await?
            .into_iter()
            .find(|a| a.is_active && a.customer_id.as_deref() == Some(customer_id))
            .ok_or_else(|| {
                LedgerError::AccountNotFound(format!(
                    "receivable account for customer {customer_id}"
                ))
            })
    }
}

/// Fluent builder for hand-written (journal) transactions
#[derive(Debug)]
pub struct TransactionComposer {
    transaction: Transaction,
}

impl TransactionComposer {
    pub fn new(
        txn_type: TransactionType,
        date: NaiveDate,
        amount: BigDecimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction: Transaction::new(txn_type, date, amount, description.into()),
        }
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.transaction.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.transaction.notes = Some(notes.into());
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: impl Into<String>, amount: BigDecimal) -> Self {
        self.transaction
            .add_entry(TransactionEntry::debit(account_id.into(), amount, None));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_id: impl Into<String>, amount: BigDecimal) -> Self {
        self.transaction
            .add_entry(TransactionEntry::credit(account_id.into(), amount, None));
        self
    }

    /// Validate and produce the transaction
    pub fn build(self) -> LedgerResult<Transaction> {
        self.transaction.validate()?;
        Ok(self.transaction)
    }
}
