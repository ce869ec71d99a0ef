// service/payment_service.rs
use std::sync::Arc;

use num_traits::Zero;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, paymentdb::PaymentExt, userdb::UserExt, workdb::WorkExt},
    dtos::paymentdtos::*,
    models::{paymentmodel::*, usermodel::User},
    service::{card_gateway::CardGateway, error::ServiceError},
    utils::money::{money_to_f64, to_positive_money},
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct PaymentService {
    db_client: Arc<DBClient>,
    gateway: CardGateway,
}

impl PaymentService {
    pub fn new(db_client: Arc<DBClient>, gateway: CardGateway) -> Self {
        Self { db_client, gateway }
    }

    pub async fn charge(&self, user: &User, body: ChargeRequestDto) -> Result<ChargeResponseDto, ServiceError> {
        if body.payer_id != user.id {
            return Err(ServiceError::Forbidden("You can only pay on your own behalf".to_string()));
        }

        let amount = to_positive_money(body.amount).map_err(ServiceError::Validation)?;

        if body.method == PaymentMethod::Wallet && body.receiver_id == body.payer_id {
            return Err(ServiceError::Validation(
                "A wallet cannot be used to pay itself".to_string(),
            ));
        }

        if body.receiver_id != body.payer_id {
            self.db_client
                .get_user(body.receiver_id)
                .await?
                .ok_or(ServiceError::UserNotFound(body.receiver_id))?;
        }

        if let Some(work_id) = body.work_id {
            let work = self
                .db_client
                .get_work(work_id)
                .await?
                .ok_or(ServiceError::WorkNotFound(work_id))?;

            if work.job_seeker_id != body.payer_id || work.freelancer_id != body.receiver_id {
                return Err(ServiceError::Validation(format!(
                    "Payment parties do not match work {}",
                    work_id
                )));
            }
        }

        let (status, message) =
            initial_outcome(&self.gateway, body.method, body.card_details.as_ref())?;

        let (transaction, balance) = self
            .db_client
            .record_transaction(NewTransaction {
                payer_id: body.payer_id,
                receiver_id: Some(body.receiver_id),
                amount,
                method: body.method,
                status,
                work_id: body.work_id,
                bank_account: None,
                message,
            })
            .await?;

        let success = transaction.status == TransactionStatus::Success;
        if success {
            tracing::info!(
                reference = %transaction.reference,
                payer_id = %transaction.payer_id,
                kind = ?transaction.kind(),
                "charge succeeded"
            );
        } else {
            tracing::warn!(
                reference = %transaction.reference,
                payer_id = %transaction.payer_id,
                "charge failed: {}",
                transaction.message
            );
        }

        Ok(ChargeResponseDto {
            success,
            message: transaction.message,
            transaction_id: transaction.id,
            reference: transaction.reference,
            balance: money_to_f64(&balance),
        })
    }

    pub async fn withdraw(&self, user: &User, body: WithdrawRequestDto) -> Result<ChargeResponseDto, ServiceError> {
        if body.user_id != user.id {
            return Err(ServiceError::Forbidden("You can only withdraw from your own wallet".to_string()));
        }

        let amount = to_positive_money(body.amount).map_err(ServiceError::Validation)?;

        let available = self.db_client.get_wallet_balance(user.id).await?;
        if available < amount {
            return Err(ServiceError::InsufficientFunds {
                required: amount.to_string(),
                available: available.to_string(),
            });
        }

        let bank_account: String = body
            .bank_account
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        let (transaction, balance) = self
            .db_client
            .record_transaction(NewTransaction {
                payer_id: user.id,
                receiver_id: None,
                amount: amount.clone(),
                method: PaymentMethod::BankTransfer,
                status: TransactionStatus::Success,
                work_id: None,
                bank_account: Some(bank_account),
                message: "Withdrawal successful".to_string(),
            })
            .await?;

        // The balance can drop between the check above and the row lock; the
        // ledger keeps the failed attempt either way.
        if transaction.status != TransactionStatus::Success {
            return Err(ServiceError::InsufficientFunds {
                required: amount.to_string(),
                available: balance.to_string(),
            });
        }

        tracing::info!(reference = %transaction.reference, user_id = %user.id, "withdrawal recorded");

        Ok(ChargeResponseDto {
            success: true,
            message: transaction.message,
            transaction_id: transaction.id,
            reference: transaction.reference,
            balance: money_to_f64(&balance),
        })
    }

    pub async fn history(
        &self,
        user: &User,
        user_id: Uuid,
        query: HistoryQueryDto,
    ) -> Result<PaymentHistoryDto, ServiceError> {
        if user.id != user_id && !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "You can only view your own payment history".to_string(),
            ));
        }

        let (limit, offset) = page(query.limit, query.offset);
        let balance = self.db_client.get_wallet_balance(user_id).await?;
        let transactions = self
            .db_client
            .get_user_transactions(user_id, limit, offset)
            .await?;

        Ok(PaymentHistoryDto {
            user_id,
            balance: money_to_f64(&balance),
            transactions: transactions.into_iter().map(TransactionResponseDto::from).collect(),
            limit,
            offset,
        })
    }

    pub async fn reconcile(&self, user_id: Uuid) -> Result<WalletReconciliationDto, ServiceError> {
        let cached = self.db_client.get_wallet_balance(user_id).await?;
        let ledger = self.db_client.get_ledger_balance(user_id).await?;
        let in_sync = (&cached - &ledger).is_zero();

        if !in_sync {
            tracing::warn!(
                user_id = %user_id,
                cached = %cached,
                ledger = %ledger,
                "wallet balance drifted from ledger"
            );
        }

        Ok(WalletReconciliationDto {
            user_id,
            cached_balance: money_to_f64(&cached),
            ledger_balance: money_to_f64(&ledger),
            in_sync,
        })
    }
}

/// Status and message a charge is recorded with before wallet funds are
/// checked under lock.
pub fn initial_outcome(
    gateway: &CardGateway,
    method: PaymentMethod,
    card: Option<&CardDetailsDto>,
) -> Result<(TransactionStatus, String), ServiceError> {
    match method {
        PaymentMethod::CreditCard => {
            let card = card.ok_or_else(|| {
                ServiceError::Validation("Card details are required for CREDIT_CARD payments".to_string())
            })?;
            let decision = gateway.authorize(card);
            let status = if decision.approved {
                TransactionStatus::Success
            } else {
                TransactionStatus::Failed
            };
            Ok((status, decision.message))
        }
        PaymentMethod::BankTransfer => Ok((
            TransactionStatus::Success,
            "Bank transfer successful".to_string(),
        )),
        PaymentMethod::Wallet => Ok((
            TransactionStatus::Success,
            "Payment successful".to_string(),
        )),
    }
}

pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{paymentdb::INSUFFICIENT_BALANCE_MESSAGE, testutils::insert_user},
        models::usermodel::UserRole,
    };
    use sqlx::{types::BigDecimal, PgPool};

    fn card(number: &str) -> CardDetailsDto {
        CardDetailsDto {
            card_number: number.to_string(),
            expiry: "12/30".to_string(),
            cvc: "123".to_string(),
            holder_name: None,
        }
    }

    #[test]
    fn card_outcomes_follow_gateway() {
        let gateway = CardGateway::new();

        let (status, message) =
            initial_outcome(&gateway, PaymentMethod::CreditCard, Some(&card("4242424242424242"))).unwrap();
        assert_eq!(status, TransactionStatus::Success);
        assert_eq!(message, "Payment successful");

        let (status, message) =
            initial_outcome(&gateway, PaymentMethod::CreditCard, Some(&card("4000000000000000"))).unwrap();
        assert_eq!(status, TransactionStatus::Failed);
        assert_eq!(message, "Card declined");
    }

    #[test]
    fn card_payment_without_details_is_rejected() {
        let err = initial_outcome(&CardGateway::new(), PaymentMethod::CreditCard, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn bank_transfer_and_wallet_start_successful() {
        let gateway = CardGateway::new();
        for method in [PaymentMethod::BankTransfer, PaymentMethod::Wallet] {
            let (status, _) = initial_outcome(&gateway, method, None).unwrap();
            assert_eq!(status, TransactionStatus::Success);
        }
    }

    #[test]
    fn history_paging_is_clamped() {
        assert_eq!(page(None, None), (50, 0));
        assert_eq!(page(Some(500), Some(10)), (200, 10));
        assert_eq!(page(Some(0), Some(-3)), (1, 0));
    }

    fn service(pool: PgPool) -> PaymentService {
        PaymentService::new(Arc::new(DBClient::new(pool)), CardGateway::new())
    }

    fn request(payer: &User, receiver: &User, amount: f64, method: PaymentMethod) -> ChargeRequestDto {
        ChargeRequestDto {
            payer_id: payer.id,
            receiver_id: receiver.id,
            amount,
            method,
            work_id: None,
            card_details: None,
        }
    }

    async fn top_up(payments: &PaymentService, user: &User, amount: f64) -> ChargeResponseDto {
        let mut body = request(user, user, amount, PaymentMethod::CreditCard);
        body.card_details = Some(card("4242 4242 4242 4242"));
        payments.charge(user, body).await.unwrap()
    }

    async fn status_of(payments: &PaymentService, user: &User, transaction_id: Uuid) -> TransactionStatus {
        let history = payments
            .history(user, user.id, HistoryQueryDto { limit: None, offset: None })
            .await
            .unwrap();
        history
            .transactions
            .into_iter()
            .find(|t| t.id == transaction_id)
            .map(|t| t.status)
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn wallet_payment_without_funds_is_stored_as_failed(pool: PgPool) {
        let payer = insert_user(&pool, "Payer", UserRole::JobSeeker).await;
        let receiver = insert_user(&pool, "Receiver", UserRole::Freelancer).await;
        let payments = service(pool);

        let response = payments
            .charge(&payer, request(&payer, &receiver, 25.0, PaymentMethod::Wallet))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.message, INSUFFICIENT_BALANCE_MESSAGE);
        assert_eq!(response.balance, 0.0);
        assert_eq!(
            status_of(&payments, &payer, response.transaction_id).await,
            TransactionStatus::Failed
        );

        let report = payments.reconcile(receiver.id).await.unwrap();
        assert_eq!(report.cached_balance, 0.0);
        assert!(report.in_sync);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn wallet_payment_moves_funds_between_parties(pool: PgPool) {
        let payer = insert_user(&pool, "Payer", UserRole::JobSeeker).await;
        let receiver = insert_user(&pool, "Receiver", UserRole::Freelancer).await;
        let payments = service(pool);

        let topped = top_up(&payments, &payer, 100.0).await;
        assert!(topped.success);
        assert_eq!(topped.balance, 100.0);

        let paid = payments
            .charge(&payer, request(&payer, &receiver, 40.0, PaymentMethod::Wallet))
            .await
            .unwrap();
        assert!(paid.success);
        assert_eq!(paid.balance, 60.0);

        let receiver_history = payments
            .history(&receiver, receiver.id, HistoryQueryDto { limit: None, offset: None })
            .await
            .unwrap();
        assert_eq!(receiver_history.balance, 40.0);
        assert_eq!(receiver_history.transactions.len(), 1);

        for user in [&payer, &receiver] {
            let report = payments.reconcile(user.id).await.unwrap();
            assert!(report.in_sync, "{:?}", report);
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn declined_card_leaves_balance_untouched(pool: PgPool) {
        let payer = insert_user(&pool, "Payer", UserRole::JobSeeker).await;
        let payments = service(pool);
        top_up(&payments, &payer, 10.0).await;

        let mut body = request(&payer, &payer, 50.0, PaymentMethod::CreditCard);
        body.card_details = Some(card("4000 0000 0000 0002"));
        let response = payments.charge(&payer, body).await.unwrap();

        assert!(!response.success);
        assert_eq!(response.message, "Card declined");
        assert_eq!(response.balance, 10.0);
        assert_eq!(
            status_of(&payments, &payer, response.transaction_id).await,
            TransactionStatus::Failed
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn withdraw_beyond_balance_is_payment_required(pool: PgPool) {
        let user = insert_user(&pool, "Saver", UserRole::Freelancer).await;
        let payments = service(pool);
        top_up(&payments, &user, 30.0).await;

        let err = payments
            .withdraw(
                &user,
                WithdrawRequestDto {
                    user_id: user.id,
                    amount: 30.01,
                    bank_account: "0123456789".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds { .. }));
        assert_eq!(err.status_code(), axum::http::StatusCode::PAYMENT_REQUIRED);

        let response = payments
            .withdraw(
                &user,
                WithdrawRequestDto {
                    user_id: user.id,
                    amount: 12.5,
                    bank_account: "0123-456-789".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.balance, 17.5);

        let history = payments
            .history(&user, user.id, HistoryQueryDto { limit: None, offset: None })
            .await
            .unwrap();
        let withdrawal = history
            .transactions
            .iter()
            .find(|t| t.id == response.transaction_id)
            .unwrap();
        assert_eq!(withdrawal.kind, TransactionKind::Withdrawal);
        assert_eq!(withdrawal.bank_account.as_deref(), Some("******6789"));
        assert!(payments.reconcile(user.id).await.unwrap().in_sync);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reconcile_reports_drift(pool: PgPool) {
        let user = insert_user(&pool, "Drifter", UserRole::JobSeeker).await;
        let payments = service(pool.clone());
        top_up(&payments, &user, 20.0).await;

        sqlx::query("UPDATE wallets SET balance = balance + 1 WHERE user_id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let report = payments.reconcile(user.id).await.unwrap();
        assert!(!report.in_sync);
        assert_eq!(report.cached_balance, 21.0);
        assert_eq!(report.ledger_balance, 20.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn charges_check_the_parties(pool: PgPool) {
        let payer = insert_user(&pool, "Payer", UserRole::JobSeeker).await;
        let receiver = insert_user(&pool, "Receiver", UserRole::Freelancer).await;
        let other = insert_user(&pool, "Other", UserRole::Freelancer).await;
        let payments = service(pool);

        let err = payments
            .charge(&receiver, request(&payer, &receiver, 5.0, PaymentMethod::BankTransfer))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = payments
            .charge(&payer, request(&payer, &payer, 5.0, PaymentMethod::Wallet))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let work = payments
            .db_client
            .create_work(
                other.id,
                payer.id,
                "Logo Design".to_string(),
                None,
                BigDecimal::from(500),
                3,
            )
            .await
            .unwrap();
        let mut body = request(&payer, &receiver, 5.0, PaymentMethod::BankTransfer);
        body.work_id = Some(work.id);
        let err = payments.charge(&payer, body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
