//! Running-balance ledgers and the trial balance
//!
//! Read-only consumers of the entry store. Ordering is deterministic:
//! transaction date ascending, ties broken by transaction id then entry id.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::balance::{entry_signed_change, present};
use crate::traits::LedgerStore;
use crate::types::*;

/// One row of an account's ledger: the entry's own amounts plus the
/// post-entry running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub transaction_id: String,
    pub entry_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub debit_amount: BigDecimal,
    pub credit_amount: BigDecimal,
    /// Cumulative balance after this entry, classified the same way
    /// [`crate::BalanceCalculator`] classifies a point balance
    pub running_balance: BigDecimal,
    /// Which side the running balance sits on ("Dr"/"Cr" column)
    pub running_nature: BalanceNature,
}

/// One row of the trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account: Account,
    pub debit_balance: Option<BigDecimal>,
    pub credit_balance: Option<BigDecimal>,
}

/// Snapshot of every account's classified balance in debit/credit columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: BigDecimal,
    pub total_credits: BigDecimal,
    pub is_balanced: bool,
}

/// Read-only ledger reporter over an injected store handle
pub struct LedgerReporter<S: LedgerStore> {
    storage: S,
}

impl<S: LedgerStore> LedgerReporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The account's full ledger: every entry in date order with a running
    /// balance folded from the opening balance.
    pub async fn ledger(&self, account_id: &str) -> LedgerResult<Vec<LedgerLine>> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let mut rows: Vec<(NaiveDate, String, String, Option<String>, TransactionEntry)> =
            Vec::new();
        for transaction in self.storage.account_transactions(account_id).await? {
            for entry in transaction
                .entries
                .iter()
                .filter(|e| e.account_id == account_id)
            {
                rows.push((
                    transaction.date,
                    transaction.id.clone(),
                    transaction.description.clone(),
                    transaction.reference.clone(),
                    entry.clone(),
                ));
            }
        }
        rows.sort_by(|a, b| {
            (a.0, &a.1, &a.4.id).cmp(&(b.0, &b.1, &b.4.id))
        });

        let mut signed = account.opening_balance.clone();
        let mut lines = Vec::with_capacity(rows.len());
        for (date, transaction_id, description, reference, entry) in rows {
            signed += entry_signed_change(account.account_type, &entry);
            let (running_balance, running_nature) = present(account.account_type, &signed);
            lines.push(LedgerLine {
                transaction_id,
                entry_id: entry.id.clone(),
                date,
                description,
                reference,
                debit_amount: entry.debit_amount,
                credit_amount: entry.credit_amount,
                running_balance,
                running_nature,
            });
        }

        Ok(lines)
    }

    /// Classified balance of every account, laid out in debit/credit columns
    pub async fn trial_balance(&self) -> LedgerResult<TrialBalance> {
        let accounts = self.storage.list_accounts(None).await?;
        let mut rows = Vec::with_capacity(accounts.len());
        let mut total_debits = BigDecimal::from(0);
        let mut total_credits = BigDecimal::from(0);

        let zero = BigDecimal::from(0);
        for account in accounts {
            let signed = self.signed_balance(&account).await?;
            // Columns always carry magnitudes; a balance on the wrong side
            // of its normal nature lands in the opposite column
            let side = if signed >= zero {
                account.account_type.normal_balance()
            } else {
                account.account_type.normal_balance().opposite()
            };
            let magnitude = round_money(&signed.abs());
            let row = match side {
                BalanceNature::Debit => {
                    total_debits += &magnitude;
                    TrialBalanceRow {
                        account,
                        debit_balance: Some(magnitude),
                        credit_balance: None,
                    }
                }
                BalanceNature::Credit => {
                    total_credits += &magnitude;
                    TrialBalanceRow {
                        account,
                        debit_balance: None,
                        credit_balance: Some(magnitude),
                    }
                }
            };
            rows.push(row);
        }

        rows.sort_by(|a, b| a.account.code.cmp(&b.account.code));
        let is_balanced = total_debits == total_credits;

        Ok(TrialBalance {
            rows,
            total_debits,
            total_credits,
            is_balanced,
        })
    }

    async fn signed_balance(&self, account: &Account) -> LedgerResult<BigDecimal> {
        let mut signed = account.opening_balance.clone();
        for transaction in self.storage.account_transactions(&account.id).await? {
            for entry in transaction
                .entries
                .iter()
                .filter(|e| e.account_id == account.id)
            {
                signed += entry_signed_change(account.account_type, entry);
            }
        }
        Ok(signed)
    }
}
