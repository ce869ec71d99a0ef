// models/paymentmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Wallet,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

/// What a ledger row means, derived from who pays whom.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    TopUp,
    Payment,
    Withdrawal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub payer_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub work_id: Option<Uuid>,
    pub bank_account: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self.receiver_id {
            None => TransactionKind::Withdrawal,
            Some(receiver) if receiver == self.payer_id => TransactionKind::TopUp,
            Some(_) => TransactionKind::Payment,
        }
    }

    /// Signed effect of this row on `user_id`'s wallet. Only settled rows
    /// move money, and only wallet-funded payments draw on the payer's balance.
    pub fn wallet_delta(&self, user_id: Uuid) -> BigDecimal {
        if self.status != TransactionStatus::Success {
            return BigDecimal::from(0);
        }

        match self.kind() {
            TransactionKind::TopUp if self.payer_id == user_id => self.amount.clone(),
            TransactionKind::Withdrawal if self.payer_id == user_id => -self.amount.clone(),
            TransactionKind::Payment => {
                let mut delta = BigDecimal::from(0);
                if self.receiver_id == Some(user_id) {
                    delta += self.amount.clone();
                }
                if self.payer_id == user_id && self.method == PaymentMethod::Wallet {
                    delta -= self.amount.clone();
                }
                delta
            }
            _ => BigDecimal::from(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

/// A ledger row about to be written.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub payer_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub work_id: Option<Uuid>,
    pub bank_account: Option<String>,
    pub message: String,
}

impl NewTransaction {
    /// Amount this row would take out of the payer's wallet if it settles.
    pub fn payer_debit(&self) -> BigDecimal {
        let draws_on_wallet = match self.receiver_id {
            None => true,
            Some(receiver) => receiver != self.payer_id && self.method == PaymentMethod::Wallet,
        };

        if self.status == TransactionStatus::Success && draws_on_wallet {
            self.amount.clone()
        } else {
            BigDecimal::from(0)
        }
    }
}

pub fn generate_transaction_reference() -> String {
    format!("WH_{}", Uuid::new_v4().simple().to_string().to_uppercase()[..16].to_string())
}
