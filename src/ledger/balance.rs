//! Balance calculation and classification
//!
//! Read-only consumer of the ledger entry store: sums an account's entries,
//! applies the opening balance and the normal-balance sign convention, and
//! classifies the result for display. Deterministic over the entry set.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::traits::LedgerStore;
use crate::types::*;

/// What the caller intends to do with the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceContext {
    Payment,
    Receipt,
}

/// User-facing classification of a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStatus {
    /// Positive asset balance: funds on hand
    Available,
    /// Negative asset balance: more has gone out than came in
    Overdrawn,
    /// Positive liability balance: amount we owe
    Owed,
    /// Negative liability balance: we over-paid and hold an advance
    Advance,
    /// Expense/Revenue/Equity totals carry no "available" semantics
    Informational,
}

/// Full result of a balance computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub account_id: String,
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    /// Sum of all debit amounts posted against the account
    pub total_debits: BigDecimal,
    /// Sum of all credit amounts posted against the account
    pub total_credits: BigDecimal,
    pub opening_balance: BigDecimal,
    /// Classified balance: debit-normal accounts keep their sign, a
    /// credit-normal account in the negative reports its absolute value
    /// reclassified to the debit side (see `nature`)
    pub accounting_balance: BigDecimal,
    /// Which side the balance sits on
    pub nature: BalanceNature,
    pub status: BalanceStatus,
    pub warning: Option<String>,
    pub context_message: Option<String>,
}

/// Signed normal-side change one entry contributes to its account's balance
pub(crate) fn entry_signed_change(
    account_type: AccountType,
    entry: &TransactionEntry,
) -> BigDecimal {
    match account_type.normal_balance() {
        BalanceNature::Debit => &entry.debit_amount - &entry.credit_amount,
        BalanceNature::Credit => &entry.credit_amount - &entry.debit_amount,
    }
}

/// Present a signed normal-side balance for display.
///
/// Debit-normal accounts keep their sign (a negative asset is shown
/// negative, flagged overdrawn elsewhere). Credit-normal accounts report a
/// negative balance as its absolute value sitting on the debit side, the way
/// a supplier advance reads in a subsidiary ledger.
pub(crate) fn present(account_type: AccountType, signed: &BigDecimal) -> (BigDecimal, BalanceNature) {
    let zero = BigDecimal::from(0);
    match account_type.normal_balance() {
        BalanceNature::Debit => {
            let nature = if *signed >= zero {
                BalanceNature::Debit
            } else {
                BalanceNature::Credit
            };
            (round_money(signed), nature)
        }
        BalanceNature::Credit => {
            if *signed >= zero {
                (round_money(signed), BalanceNature::Credit)
            } else {
                (round_money(&signed.abs()), BalanceNature::Debit)
            }
        }
    }
}

/// Read-only balance calculator over an injected store handle
pub struct BalanceCalculator<S: LedgerStore> {
    storage: S,
}

impl<S: LedgerStore> BalanceCalculator<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Compute the account's classified balance.
    ///
    /// The optional context attaches a human-readable message; it never
    /// alters the numeric result.
    pub async fn balance(
        &self,
        account_id: &str,
        context: Option<BalanceContext>,
    ) -> LedgerResult<BalanceReport> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let mut total_debits = BigDecimal::from(0);
        let mut total_credits = BigDecimal::from(0);
        for transaction in self.storage.account_transactions(account_id).await? {
            for entry in transaction
                .entries
                .iter()
                .filter(|e| e.account_id == account_id)
            {
                total_debits += &entry.debit_amount;
                total_credits += &entry.credit_amount;
            }
        }

        let raw = match account.account_type.normal_balance() {
            BalanceNature::Debit => &total_debits - &total_credits,
            BalanceNature::Credit => &total_credits - &total_debits,
        };
        let signed = raw + &account.opening_balance;
        let (accounting_balance, nature) = present(account.account_type, &signed);

        let zero = BigDecimal::from(0);
        let (status, warning) = match account.account_type {
            AccountType::Asset => {
                if signed >= zero {
                    (BalanceStatus::Available, None)
                } else {
                    (
                        BalanceStatus::Overdrawn,
                        Some(format!(
                            "account '{}' is overdrawn by {}",
                            account.code,
                            round_money(&signed.abs())
                        )),
                    )
                }
            }
            AccountType::Liability => {
                if signed >= zero {
                    (BalanceStatus::Owed, None)
                } else {
                    (BalanceStatus::Advance, None)
                }
            }
            AccountType::Equity | AccountType::Revenue | AccountType::Expense => {
                (BalanceStatus::Informational, None)
            }
        };

        let context_message = context.map(|ctx| {
            contextual_message(ctx, account.account_type, status, &accounting_balance)
        });

        Ok(BalanceReport {
            account_id: account.id,
            account_code: account.code,
            account_name: account.name,
            account_type: account.account_type,
            total_debits: round_money(&total_debits),
            total_credits: round_money(&total_credits),
            opening_balance: account.opening_balance,
            accounting_balance,
            nature,
            status,
            warning,
            context_message,
        })
    }
}

fn contextual_message(
    context: BalanceContext,
    account_type: AccountType,
    status: BalanceStatus,
    balance: &BigDecimal,
) -> String {
    match (context, account_type) {
        (BalanceContext::Payment, AccountType::Asset) => match status {
            BalanceStatus::Overdrawn => "insufficient funds for payments".to_string(),
            _ => format!("{balance} available for payments"),
        },
        (BalanceContext::Payment, AccountType::Liability) => match status {
            BalanceStatus::Advance => format!("{balance} already paid in advance"),
            _ => format!("{balance} due for payment"),
        },
        (BalanceContext::Payment, _) => format!("{balance} paid to date"),
        (BalanceContext::Receipt, AccountType::Asset) => match status {
            BalanceStatus::Overdrawn => format!("{balance} over-collected"),
            _ => format!("{balance} outstanding to collect"),
        },
        (BalanceContext::Receipt, _) => format!("{balance} received to date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn debit_normal_accounts_keep_their_sign() {
        let (balance, nature) = present(AccountType::Asset, &dec("-500"));
        assert_eq!(balance, dec("-500.00"));
        assert_eq!(nature, BalanceNature::Credit);

        let (balance, nature) = present(AccountType::Asset, &dec("250"));
        assert_eq!(balance, dec("250.00"));
        assert_eq!(nature, BalanceNature::Debit);
    }

    #[test]
    fn negative_credit_normal_balances_flip_to_the_debit_side() {
        // A supplier paid 500 beyond what was owed: the payable account shows
        // a 500 debit balance, not -500 credit.
        let (balance, nature) = present(AccountType::Liability, &dec("-500"));
        assert_eq!(balance, dec("500.00"));
        assert_eq!(nature, BalanceNature::Debit);

        let (balance, nature) = present(AccountType::Liability, &dec("750"));
        assert_eq!(balance, dec("750.00"));
        assert_eq!(nature, BalanceNature::Credit);
    }

    #[test]
    fn signed_change_follows_the_normal_side() {
        let debit = TransactionEntry::debit("a".into(), dec("100"), None);
        assert_eq!(entry_signed_change(AccountType::Asset, &debit), dec("100.00"));
        assert_eq!(
            entry_signed_change(AccountType::Liability, &debit),
            dec("-100.00")
        );

        let credit = TransactionEntry::credit("a".into(), dec("40"), None);
        assert_eq!(entry_signed_change(AccountType::Asset, &credit), dec("-40.00"));
        assert_eq!(
            entry_signed_change(AccountType::Revenue, &credit),
            dec("40.00")
        );
    }
}
