// db/paymentdb.rs
use async_trait::async_trait;
use num_traits::{Signed, Zero};
use sqlx::{types::BigDecimal, Error, Row};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::*;

const TRANSACTION_COLUMNS: &str = "id, reference, payer_id, receiver_id, amount, method, status, \
    work_id, bank_account, message, created_at";

pub const INSUFFICIENT_BALANCE_MESSAGE: &str = "Insufficient wallet balance";

#[async_trait]
pub trait PaymentExt {
    async fn get_wallet(&self, user_id: Uuid) -> Result<Option<Wallet>, Error>;

    async fn get_wallet_balance(&self, user_id: Uuid) -> Result<BigDecimal, Error>;

    /// Balance recomputed from settled ledger rows.
    async fn get_ledger_balance(&self, user_id: Uuid) -> Result<BigDecimal, Error>;

    // Writes the ledger row and applies its wallet effects in one transaction.
    // A settled row that would overdraw the payer is stored as failed instead.
    // Returns the stored row and the payer's balance afterwards.
    async fn record_transaction(
        &self,
        new_tx: NewTransaction,
    ) -> Result<(Transaction, BigDecimal), Error>;

    async fn get_user_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn get_wallet(&self, user_id: Uuid) -> Result<Option<Wallet>, Error> {
        sqlx::query_as::<_, Wallet>(
            "SELECT user_id, balance, updated_at FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_wallet_balance(&self, user_id: Uuid) -> Result<BigDecimal, Error> {
        Ok(self
            .get_wallet(user_id)
            .await?
            .map(|wallet| wallet.balance)
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    async fn get_ledger_balance(&self, user_id: Uuid) -> Result<BigDecimal, Error> {
        sqlx::query_scalar::<_, BigDecimal>(
            r#"
            SELECT COALESCE(SUM(
                CASE
                    WHEN payer_id = $1 AND receiver_id = $1 THEN amount
                    WHEN payer_id = $1 AND receiver_id IS NULL THEN -amount
                    WHEN receiver_id = $1 THEN amount
                    WHEN payer_id = $1 AND method = 'wallet'::payment_method THEN -amount
                    ELSE 0
                END
            ), 0)::NUMERIC(14, 2)
            FROM transactions
            WHERE status = 'success'::transaction_status
              AND (payer_id = $1 OR receiver_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn record_transaction(
        &self,
        mut new_tx: NewTransaction,
    ) -> Result<(Transaction, BigDecimal), Error> {
        let mut tx = self.pool.begin().await?;

        let mut parties = vec![new_tx.payer_id];
        if let Some(receiver) = new_tx.receiver_id {
            if receiver != new_tx.payer_id {
                parties.push(receiver);
            }
        }
        // Lock in a stable order so concurrent payments between the same
        // two users cannot deadlock.
        parties.sort();

        sqlx::query(
            "INSERT INTO wallets (user_id) SELECT UNNEST($1::uuid[]) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(&parties)
        .execute(&mut *tx)
        .await?;

        let locked = sqlx::query(
            "SELECT user_id, balance FROM wallets WHERE user_id = ANY($1) ORDER BY user_id FOR UPDATE",
        )
        .bind(&parties)
        .fetch_all(&mut *tx)
        .await?;

        let payer_balance = locked
            .iter()
            .find(|row| row.get::<Uuid, _>("user_id") == new_tx.payer_id)
            .map(|row| row.get::<BigDecimal, _>("balance"))
            .unwrap_or_else(|| BigDecimal::from(0));

        if new_tx.payer_debit() > payer_balance {
            new_tx.status = TransactionStatus::Failed;
            new_tx.message = INSUFFICIENT_BALANCE_MESSAGE.to_string();
        }

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions
            (reference, payer_id, receiver_id, amount, method, status, work_id, bank_account, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(generate_transaction_reference())
        .bind(new_tx.payer_id)
        .bind(new_tx.receiver_id)
        .bind(&new_tx.amount)
        .bind(new_tx.method)
        .bind(new_tx.status)
        .bind(new_tx.work_id)
        .bind(&new_tx.bank_account)
        .bind(&new_tx.message)
        .fetch_one(&mut *tx)
        .await?;

        let mut payer_balance_after = payer_balance;
        for user_id in &parties {
            let delta = transaction.wallet_delta(*user_id);
            if delta.is_zero() {
                continue;
            }

            let balance = sqlx::query_scalar::<_, BigDecimal>(
                r#"
                UPDATE wallets
                SET balance = balance + $2, updated_at = NOW()
                WHERE user_id = $1
                RETURNING balance
                "#,
            )
            .bind(user_id)
            .bind(&delta)
            .fetch_one(&mut *tx)
            .await?;

            if balance.is_negative() {
                tracing::error!(user_id = %user_id, "wallet would go negative, rolling back");
                tx.rollback().await?;
                return Err(Error::Protocol("wallet balance would become negative".into()));
            }

            if *user_id == new_tx.payer_id {
                payer_balance_after = balance;
            }
        }

        tx.commit().await?;
        Ok((transaction, payer_balance_after))
    }

    async fn get_user_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE payer_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}
