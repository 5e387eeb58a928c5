use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::store::{CatalogStore, TransactionLedger, UpsertOutcome};
use crate::connectors::BillingError;
use crate::models::{
    BillCategory, BillProduct, BillTransaction, Biller, ProductFlags, TransactionOutcome,
    TransactionType,
};

/// Postgres-backed catalog and transaction ledger (see `migrations/`).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), BillingError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| BillingError::Storage(format!("Migration failed: {}", err)))
    }
}

// `xmax = 0` only holds for a freshly inserted tuple.
fn outcome(inserted: bool) -> UpsertOutcome {
    if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    }
}

fn to_db_amount(value: Option<u64>) -> Result<Option<i64>, BillingError> {
    value
        .map(|v| {
            i64::try_from(v)
                .map_err(|_| BillingError::Storage(format!("Amount {} exceeds BIGINT", v)))
        })
        .transpose()
}

fn from_db_amount(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn parse_type(raw: &str) -> Result<TransactionType, BillingError> {
    match raw {
        "airtime" => Ok(TransactionType::Airtime),
        "data" => Ok(TransactionType::Data),
        "power" => Ok(TransactionType::Power),
        "tv" => Ok(TransactionType::Tv),
        other => Err(BillingError::Storage(format!("Unknown transaction type {}", other))),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn upsert_category(&self, category: &BillCategory) -> Result<UpsertOutcome, BillingError> {
        let span = tracing::info_span!("upsert_bill_category", external_id = %category.external_id);
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO bill_categories (provider, external_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, external_id) DO UPDATE
            SET name = EXCLUDED.name,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&category.provider)
        .bind(&category.external_id)
        .bind(&category.name)
        .fetch_one(&self.pool)
        .instrument(span)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert category {}: {:?}", category.external_id, e);
            BillingError::from(e)
        })?;

        Ok(outcome(inserted))
    }

    async fn upsert_biller(&self, biller: &Biller) -> Result<UpsertOutcome, BillingError> {
        let span = tracing::info_span!("upsert_bill_provider", external_id = %biller.external_id);
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO bill_providers (provider, external_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, external_id) DO UPDATE
            SET name = EXCLUDED.name,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&biller.provider)
        .bind(&biller.external_id)
        .bind(&biller.name)
        .fetch_one(&self.pool)
        .instrument(span)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert biller {}: {:?}", biller.external_id, e);
            BillingError::from(e)
        })?;

        Ok(outcome(inserted))
    }

    async fn upsert_product(&self, product: &BillProduct) -> Result<UpsertOutcome, BillingError> {
        let span = tracing::info_span!("upsert_bill_product", external_id = %product.external_id);
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO bill_products (
                provider, external_id, name, category_external_id, biller_external_id,
                payment_code, currency_code, amount_minor_units, fee_minor_units,
                is_airtime, is_data, is_power, is_tv
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0), COALESCE($9, 0), $10, $11, $12, $13)
            ON CONFLICT (provider, external_id) DO UPDATE
            SET name = EXCLUDED.name,
                category_external_id = EXCLUDED.category_external_id,
                biller_external_id = EXCLUDED.biller_external_id,
                payment_code = EXCLUDED.payment_code,
                currency_code = EXCLUDED.currency_code,
                amount_minor_units = COALESCE($8, bill_products.amount_minor_units),
                fee_minor_units = COALESCE($9, bill_products.fee_minor_units),
                is_airtime = EXCLUDED.is_airtime,
                is_data = EXCLUDED.is_data,
                is_power = EXCLUDED.is_power,
                is_tv = EXCLUDED.is_tv,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&product.provider)
        .bind(&product.external_id)
        .bind(&product.name)
        .bind(&product.category_external_id)
        .bind(&product.biller_external_id)
        .bind(&product.payment_code)
        .bind(&product.currency_code)
        .bind(to_db_amount(product.amount_minor_units)?)
        .bind(to_db_amount(product.fee_minor_units)?)
        .bind(product.flags.is_airtime)
        .bind(product.flags.is_data)
        .bind(product.flags.is_power)
        .bind(product.flags.is_tv)
        .fetch_one(&self.pool)
        .instrument(span)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert product {}: {:?}", product.external_id, e);
            BillingError::from(e)
        })?;

        Ok(outcome(inserted))
    }

    async fn list_products(&self, provider: &str) -> Result<Vec<BillProduct>, BillingError> {
        let rows = sqlx::query(
            r#"
            SELECT provider, external_id, name, category_external_id, biller_external_id,
                   payment_code, currency_code, amount_minor_units, fee_minor_units,
                   is_airtime, is_data, is_power, is_tv
            FROM bill_products
            WHERE provider = $1
            ORDER BY external_id
            "#,
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .instrument(tracing::info_span!("list_bill_products", provider = %provider))
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BillProduct {
                    provider: row.try_get("provider")?,
                    external_id: row.try_get("external_id")?,
                    name: row.try_get("name")?,
                    category_external_id: row.try_get("category_external_id")?,
                    biller_external_id: row.try_get("biller_external_id")?,
                    payment_code: row.try_get("payment_code")?,
                    currency_code: row.try_get("currency_code")?,
                    amount_minor_units: Some(from_db_amount(row.try_get("amount_minor_units")?)),
                    fee_minor_units: Some(from_db_amount(row.try_get("fee_minor_units")?)),
                    flags: ProductFlags {
                        is_airtime: row.try_get("is_airtime")?,
                        is_data: row.try_get("is_data")?,
                        is_power: row.try_get("is_power")?,
                        is_tv: row.try_get("is_tv")?,
                    },
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(BillingError::from)
    }
}

#[async_trait]
impl TransactionLedger for PgStore {
    async fn insert_pending(&self, transaction: &BillTransaction) -> Result<(), BillingError> {
        let span = tracing::info_span!("insert_bill_transaction", reference = %transaction.reference);
        let result = sqlx::query(
            r#"
            INSERT INTO bill_transactions (reference, provider, type, status, request_payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(&transaction.reference)
        .bind(&transaction.provider)
        .bind(transaction.kind.as_str())
        .bind(&transaction.status)
        .bind(&transaction.request_payload)
        .execute(&self.pool)
        .instrument(span)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BillingError::DuplicateReference(transaction.reference.clone()));
        }
        Ok(())
    }

    async fn record_outcome(
        &self,
        reference: &str,
        outcome: &TransactionOutcome,
    ) -> Result<(), BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE bill_transactions
            SET status = $2,
                external_reference = COALESCE($3, external_reference),
                response_payload = $4,
                updated_at = NOW()
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .bind(&outcome.status)
        .bind(&outcome.external_reference)
        .bind(&outcome.response_payload)
        .execute(&self.pool)
        .instrument(tracing::info_span!("update_bill_transaction", reference = %reference))
        .await?;

        if result.rows_affected() == 0 {
            return Err(BillingError::Storage(format!("Unknown transaction {}", reference)));
        }
        Ok(())
    }

    async fn find(&self, reference: &str) -> Result<Option<BillTransaction>, BillingError> {
        let row = sqlx::query(
            r#"
            SELECT reference, external_reference, provider, type, status,
                   request_payload, response_payload, created_at, updated_at
            FROM bill_transactions
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let kind: String = row.try_get("type")?;
        Ok(Some(BillTransaction {
            reference: row.try_get("reference")?,
            external_reference: row.try_get("external_reference")?,
            provider: row.try_get("provider")?,
            kind: parse_type(&kind)?,
            status: row.try_get("status")?,
            request_payload: row.try_get("request_payload")?,
            response_payload: row.try_get("response_payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_conversion_bounds() {
        assert_eq!(to_db_amount(None).unwrap(), None);
        assert_eq!(to_db_amount(Some(50_000)).unwrap(), Some(50_000));
        assert!(to_db_amount(Some(u64::MAX)).is_err());
        assert_eq!(from_db_amount(-5), 0);
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("tv").unwrap(), TransactionType::Tv);
        assert!(parse_type("gift").is_err());
    }
}
