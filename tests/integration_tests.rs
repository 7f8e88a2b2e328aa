//! Integration tests for tradebook-core

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tradebook_core::{
    codes, Account, AccountType, BalanceContext, BalanceNature, BalanceStatus, LedgerError,
    MemoryStore, NewAccount, Party, PaymentMethod, PaymentRequest, PurchaseDocument,
    PurchaseInvoice, PurchaseLine, ReceiptRequest, SaleDocument, SaleInvoice,
};

type Ledger = tradebook_core::Ledger<MemoryStore>;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fresh ledger with the standard chart, one supplier with a payable
/// account, and one customer with a receivable account.
async fn setup() -> (MemoryStore, Ledger, HashMap<String, Account>) {
    let storage = MemoryStore::new();
    storage.seed_supplier(Party {
        id: "sup-abc".to_string(),
        name: "ABC Traders".to_string(),
    });
    storage.seed_customer(Party {
        id: "cus-xyz".to_string(),
        name: "XYZ Stores".to_string(),
    });

    let mut ledger = Ledger::new(storage.clone());
    let mut accounts = ledger.bootstrap_chart().await.unwrap();

    let payable = ledger
        .create_supplier_account(&Party {
            id: "sup-abc".to_string(),
            name: "ABC Traders".to_string(),
        })
        .await
        .unwrap();
    let receivable = ledger
        .create_customer_account(&Party {
            id: "cus-xyz".to_string(),
            name: "XYZ Stores".to_string(),
        })
        .await
        .unwrap();
    accounts.insert("payable".to_string(), payable);
    accounts.insert("receivable".to_string(), receivable);

    (storage, ledger, accounts)
}

#[tokio::test]
async fn every_posted_transaction_is_balanced_with_exclusive_entries() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_purchase(PurchaseDocument {
        id: "pur-1".to_string(),
        supplier_id: "sup-abc".to_string(),
        total_amount: dec("1437.50"),
        paid_amount: dec("0"),
        balance: dec("1437.50"),
    });
    storage.seed_sale(SaleDocument {
        id: "sal-1".to_string(),
        customer_id: "cus-xyz".to_string(),
        total_amount: dec("2000.00"),
        received_amount: dec("0"),
        balance: dec("2000.00"),
    });

    ledger
        .post_purchase(PurchaseInvoice {
            purchase_id: "pur-1".to_string(),
            supplier_id: "sup-abc".to_string(),
            date: date(2024, 3, 1),
            lines: vec![PurchaseLine::new(dec("120"), dec("5"), dec("12.50"))],
            reference: None,
        })
        .await
        .unwrap();
    ledger
        .post_sale(SaleInvoice {
            sale_id: "sal-1".to_string(),
            customer_id: "cus-xyz".to_string(),
            date: date(2024, 3, 2),
            amount: dec("2000"),
            reference: None,
        })
        .await
        .unwrap();
    ledger
        .post_payment(
            PaymentRequest::new(&accounts["payable"].id, PaymentMethod::Cash, dec("437.50"))
                .supplier("sup-abc")
                .purchase("pur-1")
                .date(date(2024, 3, 3)),
        )
        .await
        .unwrap();
    ledger
        .post_receipt(
            ReceiptRequest::new(&accounts["receivable"].id, PaymentMethod::Upi, dec("800"))
                .customer("cus-xyz")
                .sale("sal-1")
                .date(date(2024, 3, 4)),
        )
        .await
        .unwrap();

    let transactions = storage.transactions();
    assert_eq!(transactions.len(), 4);
    let zero = BigDecimal::from(0);
    for txn in &transactions {
        assert!(txn.is_balanced(), "unbalanced transaction: {}", txn.id);
        assert!(txn.entries.len() >= 2);
        for entry in &txn.entries {
            let has_debit = entry.debit_amount > zero;
            let has_credit = entry.credit_amount > zero;
            assert!(
                has_debit != has_credit,
                "entry {} is not exclusively debit or credit",
                entry.id
            );
        }
    }
}

#[tokio::test]
async fn asset_sign_convention_round_trips() {
    let (_storage, mut ledger, accounts) = setup().await;

    let rent = ledger
        .create_account(NewAccount::new("6000", "Rent", AccountType::Expense))
        .await
        .unwrap();
    let cash_id = accounts[codes::CASH].id.clone();

    // A cash receipt debits the cash account
    ledger
        .post_receipt(
            ReceiptRequest::new(
                &accounts[codes::SALES_REVENUE].id,
                PaymentMethod::Cash,
                dec("350.25"),
            )
            .date(date(2024, 4, 1)),
        )
        .await
        .unwrap();

    let report = ledger.account_balance(&cash_id, None).await.unwrap();
    assert_eq!(report.accounting_balance, dec("350.25"));
    assert_eq!(report.nature, BalanceNature::Debit);
    assert_eq!(report.status, BalanceStatus::Available);

    // Paying the same amount out returns the balance to zero
    ledger
        .post_payment(
            PaymentRequest::new(&rent.id, PaymentMethod::Cash, dec("350.25"))
                .date(date(2024, 4, 2)),
        )
        .await
        .unwrap();

    let report = ledger.account_balance(&cash_id, None).await.unwrap();
    assert_eq!(report.accounting_balance, dec("0.00"));
}

#[tokio::test]
async fn ledger_running_balance_matches_point_balance() {
    let (_storage, mut ledger, accounts) = setup().await;
    let payable_id = accounts["payable"].id.clone();

    for (amount, day) in [("200", 1), ("150.75", 2), ("99.25", 3)] {
        ledger
            .post_payment(
                PaymentRequest::new(&payable_id, PaymentMethod::Cash, dec(amount))
                    .supplier("sup-abc")
                    .date(date(2024, 5, day)),
            )
            .await
            .unwrap();
    }

    let lines = ledger.account_ledger(&payable_id).await.unwrap();
    assert_eq!(lines.len(), 3);
    // Date order is preserved
    assert!(lines.windows(2).all(|w| w[0].date <= w[1].date));

    let report = ledger.account_balance(&payable_id, None).await.unwrap();
    let last = lines.last().unwrap();
    assert_eq!(last.running_balance, report.accounting_balance);
    assert_eq!(last.running_nature, report.nature);
}

#[tokio::test]
async fn failed_commit_leaves_no_trace() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_purchase(PurchaseDocument {
        id: "pur-9".to_string(),
        supplier_id: "sup-abc".to_string(),
        total_amount: dec("1000.00"),
        paid_amount: dec("100.00"),
        balance: dec("900.00"),
    });

    let before_txns = storage.transaction_count();
    let before_doc = storage.purchase("pur-9").unwrap();

    storage.fail_next_commit();
    let err = ledger
        .post_payment(
            PaymentRequest::new(&accounts["payable"].id, PaymentMethod::Cash, dec("500"))
                .supplier("sup-abc")
                .purchase("pur-9")
                .date(date(2024, 6, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));

    // Nothing persisted: no transaction, no payment, no document change
    assert_eq!(storage.transaction_count(), before_txns);
    assert_eq!(storage.purchase("pur-9").unwrap(), before_doc);

    // The same input succeeds on retry
    ledger
        .post_payment(
            PaymentRequest::new(&accounts["payable"].id, PaymentMethod::Cash, dec("500"))
                .supplier("sup-abc")
                .purchase("pur-9")
                .date(date(2024, 6, 1)),
        )
        .await
        .unwrap();
    assert_eq!(storage.transaction_count(), before_txns + 1);
}

#[tokio::test]
async fn receipt_updates_sale_document_exactly() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_sale(SaleDocument {
        id: "sal-7".to_string(),
        customer_id: "cus-xyz".to_string(),
        total_amount: dec("1000.00"),
        received_amount: dec("200.00"),
        balance: dec("800.00"),
    });

    let posted = ledger
        .post_receipt(
            ReceiptRequest::new(&accounts["receivable"].id, PaymentMethod::BankTransfer, dec("300"))
                .customer("cus-xyz")
                .sale("sal-7")
                .date(date(2024, 6, 5))
                .reference("UTR-1234"),
        )
        .await
        .unwrap();

    let sale = storage.sale("sal-7").unwrap();
    assert_eq!(sale.received_amount, dec("500.00"));
    assert_eq!(sale.balance, dec("500.00"));

    // The receipt record landed in the same commit
    let stored = storage.receipt(&posted.receipt.id).unwrap();
    assert_eq!(stored.transaction_id, posted.transaction.id);
    assert_eq!(stored.reference.as_deref(), Some("UTR-1234"));
}

#[tokio::test]
async fn cash_payment_to_supplier_payable() {
    let (_storage, mut ledger, accounts) = setup().await;
    let payable = &accounts["payable"];
    let cash = &accounts[codes::CASH];

    let posted = ledger
        .post_payment(
            PaymentRequest::new(&payable.id, PaymentMethod::Cash, dec("500.00"))
                .supplier("sup-abc")
                .date(date(2024, 7, 1)),
        )
        .await
        .unwrap();

    assert_eq!(posted.transaction.entries.len(), 2);
    let debit = &posted.transaction.entries[0];
    let credit = &posted.transaction.entries[1];
    assert_eq!(debit.account_id, payable.id);
    assert_eq!(debit.debit_amount, dec("500.00"));
    assert_eq!(credit.account_id, cash.id);
    assert_eq!(credit.credit_amount, dec("500.00"));

    // The payable now carries a debit balance (we over-paid relative to
    // nothing owed), shown as a positive amount on the debit side
    let report = ledger.account_balance(&payable.id, None).await.unwrap();
    assert_eq!(report.accounting_balance, dec("500.00"));
    assert_eq!(report.nature, BalanceNature::Debit);
    assert_eq!(report.status, BalanceStatus::Advance);

    // Cash went negative and warns about it
    let report = ledger
        .account_balance(&cash.id, Some(BalanceContext::Payment))
        .await
        .unwrap();
    assert_eq!(report.accounting_balance, dec("-500.00"));
    assert_eq!(report.status, BalanceStatus::Overdrawn);
    assert!(report.warning.is_some());
    assert_eq!(
        report.context_message.as_deref(),
        Some("insufficient funds for payments")
    );
}

#[tokio::test]
async fn bulk_create_reports_per_item_outcomes() {
    let (_storage, mut ledger, _accounts) = setup().await;

    let outcome = ledger
        .create_accounts(vec![
            NewAccount::new("5001", "Freight Charges", AccountType::Expense),
            NewAccount::new("5001", "Freight Charges (dup)", AccountType::Expense),
            NewAccount::new("5002", "Loading Charges", AccountType::Expense),
        ])
        .await;

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.index, 1);
    assert_eq!(failure.code, "5001");
    assert!(matches!(failure.error, LedgerError::DuplicateCode(_)));
}

#[tokio::test]
async fn purchase_posting_applies_weight_deduction() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_purchase(PurchaseDocument {
        id: "pur-2".to_string(),
        supplier_id: "sup-abc".to_string(),
        total_amount: dec("1437.50"),
        paid_amount: dec("0"),
        balance: dec("1437.50"),
    });

    let txn = ledger
        .post_purchase(PurchaseInvoice {
            purchase_id: "pur-2".to_string(),
            supplier_id: "sup-abc".to_string(),
            date: date(2024, 7, 10),
            // 120kg less 5kg deduction at 12.50 = 1437.50
            lines: vec![PurchaseLine::new(dec("120"), dec("5"), dec("12.50"))],
            reference: Some("INV-88".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(txn.amount, dec("1437.50"));
    assert_eq!(txn.description, "Purchase from ABC Traders");

    let inventory = ledger
        .account_balance(&accounts[codes::INVENTORY].id, None)
        .await
        .unwrap();
    assert_eq!(inventory.accounting_balance, dec("1437.50"));

    let payable = ledger
        .account_balance(&accounts["payable"].id, None)
        .await
        .unwrap();
    assert_eq!(payable.accounting_balance, dec("1437.50"));
    assert_eq!(payable.nature, BalanceNature::Credit);
    assert_eq!(payable.status, BalanceStatus::Owed);
}

#[tokio::test]
async fn ineligible_and_inactive_accounts_are_rejected() {
    let (_storage, mut ledger, accounts) = setup().await;

    // A revenue account cannot be a payment's debit target
    let err = ledger
        .post_payment(PaymentRequest::new(
            &accounts[codes::SALES_REVENUE].id,
            PaymentMethod::Cash,
            dec("100"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAccountState(_)));

    // Neither can a deactivated expense account
    let freight = ledger
        .create_account(NewAccount::new("5001", "Freight", AccountType::Expense))
        .await
        .unwrap();
    ledger.deactivate_account(&freight.id).await.unwrap();
    let err = ledger
        .post_payment(PaymentRequest::new(
            &freight.id,
            PaymentMethod::Cash,
            dec("100"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAccountState(_)));
}

#[tokio::test]
async fn party_document_mismatch_is_a_consistency_violation() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_supplier(Party {
        id: "sup-other".to_string(),
        name: "Other Supplier".to_string(),
    });
    storage.seed_purchase(PurchaseDocument {
        id: "pur-3".to_string(),
        supplier_id: "sup-other".to_string(),
        total_amount: dec("100.00"),
        paid_amount: dec("0"),
        balance: dec("100.00"),
    });

    let err = ledger
        .post_payment(
            PaymentRequest::new(&accounts["payable"].id, PaymentMethod::Cash, dec("100"))
                .supplier("sup-abc")
                .purchase("pur-3"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ConsistencyViolation(_)));
}

#[tokio::test]
async fn amendment_guard_applies_to_both_document_kinds() {
    let (storage, ledger, _accounts) = setup().await;
    storage.seed_purchase(PurchaseDocument {
        id: "pur-4".to_string(),
        supplier_id: "sup-abc".to_string(),
        total_amount: dec("100.00"),
        paid_amount: dec("40.00"),
        balance: dec("60.00"),
    });
    storage.seed_sale(SaleDocument {
        id: "sal-4".to_string(),
        customer_id: "cus-xyz".to_string(),
        total_amount: dec("100.00"),
        received_amount: dec("40.00"),
        balance: dec("60.00"),
    });

    assert!(matches!(
        ledger.ensure_purchase_amendable("pur-4").await.unwrap_err(),
        LedgerError::ConsistencyViolation(_)
    ));
    assert!(matches!(
        ledger.ensure_sale_amendable("sal-4").await.unwrap_err(),
        LedgerError::ConsistencyViolation(_)
    ));

    storage.seed_purchase(PurchaseDocument {
        id: "pur-5".to_string(),
        supplier_id: "sup-abc".to_string(),
        total_amount: dec("100.00"),
        paid_amount: dec("0"),
        balance: dec("100.00"),
    });
    assert!(ledger.ensure_purchase_amendable("pur-5").await.is_ok());
}

#[tokio::test]
async fn unpost_cascades_and_account_delete_is_guarded() {
    let (storage, mut ledger, accounts) = setup().await;
    let payable_id = accounts["payable"].id.clone();

    let posted = ledger
        .post_payment(
            PaymentRequest::new(&payable_id, PaymentMethod::Cash, dec("250"))
                .supplier("sup-abc")
                .date(date(2024, 8, 1)),
        )
        .await
        .unwrap();

    // The payable has entries now, so hard delete is refused with guidance
    let err = ledger.delete_account(&payable_id).await.unwrap_err();
    match err {
        LedgerError::ConsistencyViolation(message) => {
            assert!(message.contains("deactivate"));
        }
        other => panic!("expected ConsistencyViolation, got {other:?}"),
    }

    // Removing the posting takes the entries with it
    ledger.unpost(&posted.transaction.id).await.unwrap();
    assert_eq!(storage.transaction_count(), 0);
    assert!(ledger.delete_account(&payable_id).await.is_ok());
}

#[tokio::test]
async fn trial_balance_stays_balanced_across_postings() {
    let (storage, mut ledger, accounts) = setup().await;
    storage.seed_sale(SaleDocument {
        id: "sal-9".to_string(),
        customer_id: "cus-xyz".to_string(),
        total_amount: dec("5000.00"),
        received_amount: dec("0"),
        balance: dec("5000.00"),
    });

    ledger
        .post_sale(SaleInvoice {
            sale_id: "sal-9".to_string(),
            customer_id: "cus-xyz".to_string(),
            date: date(2024, 9, 1),
            amount: dec("5000"),
            reference: None,
        })
        .await
        .unwrap();
    ledger
        .post_receipt(
            ReceiptRequest::new(&accounts["receivable"].id, PaymentMethod::Cheque, dec("1200"))
                .customer("cus-xyz")
                .sale("sal-9")
                .date(date(2024, 9, 3)),
        )
        .await
        .unwrap();

    let trial = ledger.trial_balance().await.unwrap();
    assert!(trial.is_balanced);
    assert_eq!(trial.total_debits, trial.total_credits);
}

#[tokio::test]
async fn chart_of_accounts_nests_subsidiary_ledgers() {
    let (_storage, ledger, _accounts) = setup().await;

    let chart = ledger.chart_of_accounts().await.unwrap();
    let payables = chart
        .iter()
        .find(|node| node.account.code == codes::TRADE_PAYABLES)
        .expect("trade payables root");
    assert_eq!(payables.children.len(), 1);
    assert_eq!(payables.children[0].account.code, "2100.1");

    let eligible = ledger.payment_debit_accounts().await.unwrap();
    assert!(eligible.iter().any(|a| a.code == "2100.1"));
    let eligible = ledger.receipt_credit_accounts().await.unwrap();
    assert!(eligible.iter().any(|a| a.code == "1200.1"));
}
