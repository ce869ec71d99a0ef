// dtos/paymentdtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dtos::workdtos::validate_not_blank;
use crate::models::paymentmodel::*;
use crate::utils::money::money_to_f64;

fn validate_bank_account(value: &str) -> Result<(), ValidationError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let valid_length = (6..=34).contains(&compact.len());
    if !valid_length || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new("bank_account"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CardDetailsDto {
    #[validate(custom(function = "validate_not_blank", message = "Card number is required"))]
    pub card_number: String,

    #[validate(custom(function = "validate_not_blank", message = "Card expiry is required"))]
    pub expiry: String,

    #[validate(length(min = 3, max = 4, message = "CVC must be 3 or 4 digits"))]
    pub cvc: String,

    pub holder_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequestDto {
    pub payer_id: Uuid,

    pub receiver_id: Uuid,

    #[validate(range(min = 0.01, max = 9999999999.99, message = "Amount must be between 0.01 and 9,999,999,999.99"))]
    pub amount: f64,

    pub method: PaymentMethod,

    pub work_id: Option<Uuid>,

    #[validate]
    pub card_details: Option<CardDetailsDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponseDto {
    pub success: bool,
    pub message: String,
    pub transaction_id: Uuid,
    pub reference: String,
    pub balance: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequestDto {
    pub user_id: Uuid,

    #[validate(range(min = 0.01, max = 9999999999.99, message = "Amount must be between 0.01 and 9,999,999,999.99"))]
    pub amount: f64,

    #[validate(custom(function = "validate_bank_account", message = "Bank account must be 6 to 34 letters or digits"))]
    pub bank_account: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQueryDto {
    #[validate(range(min = 1, max = 200, message = "Limit must be between 1 and 200"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "Offset cannot be negative"))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponseDto {
    pub id: Uuid,
    pub reference: String,
    pub kind: TransactionKind,
    pub payer_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub work_id: Option<Uuid>,
    pub bank_account: Option<String>,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Transaction> for TransactionResponseDto {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind(),
            amount: money_to_f64(&tx.amount),
            reference: tx.reference,
            payer_id: tx.payer_id,
            receiver_id: tx.receiver_id,
            method: tx.method,
            status: tx.status,
            work_id: tx.work_id,
            bank_account: tx.bank_account.map(|account| mask_account(&account)),
            message: tx.message,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryDto {
    pub user_id: Uuid,
    pub balance: f64,
    pub transactions: Vec<TransactionResponseDto>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletReconciliationDto {
    pub user_id: Uuid,
    pub cached_balance: f64,
    pub ledger_balance: f64,
    pub in_sync: bool,
}

/// Keeps the last four characters of an account number.
pub fn mask_account(account: &str) -> String {
    let chars: Vec<char> = account.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn charge_body_parses_spec_fields() {
        let payer = Uuid::new_v4();
        let body = json!({
            "payerId": payer,
            "receiverId": payer,
            "amount": 150.5,
            "method": "CREDIT_CARD",
            "cardDetails": {
                "cardNumber": "4242 4242 4242 4242",
                "expiry": "12/30",
                "cvc": "123"
            }
        });

        let dto: ChargeRequestDto = serde_json::from_value(body).unwrap();
        assert_eq!(dto.method, PaymentMethod::CreditCard);
        assert!(dto.work_id.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn nested_card_details_are_validated() {
        let payer = Uuid::new_v4();
        let dto = ChargeRequestDto {
            payer_id: payer,
            receiver_id: payer,
            amount: 10.0,
            method: PaymentMethod::CreditCard,
            work_id: None,
            card_details: Some(CardDetailsDto {
                card_number: "4242424242424242".to_string(),
                expiry: "12/30".to_string(),
                cvc: "1".to_string(),
                holder_name: None,
            }),
        };

        assert!(dto.validate().is_err());
    }

    #[test]
    fn withdraw_requires_plausible_bank_account() {
        let withdraw = |account: &str| WithdrawRequestDto {
            user_id: Uuid::new_v4(),
            amount: 100.0,
            bank_account: account.to_string(),
        };

        assert!(withdraw("123-4-56789-0").validate().is_ok());
        assert!(withdraw("12345").validate().is_err());
        assert!(withdraw("1234567!").validate().is_err());
    }

    #[test]
    fn oversized_amounts_fail_validation() {
        let payer = Uuid::new_v4();
        let charge = ChargeRequestDto {
            payer_id: payer,
            receiver_id: payer,
            amount: 1e11,
            method: PaymentMethod::BankTransfer,
            work_id: None,
            card_details: None,
        };
        assert!(charge.validate().is_err());

        let withdraw = WithdrawRequestDto {
            user_id: payer,
            amount: 1e11,
            bank_account: "1234567890".to_string(),
        };
        assert!(withdraw.validate().is_err());
    }

    #[test]
    fn account_numbers_are_masked() {
        assert_eq!(mask_account("1234567890"), "******7890");
        assert_eq!(mask_account("123"), "123");
    }
}
