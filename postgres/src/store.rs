//! Postgres-backed ticket directory and scan ledger.
//!
//! The scan ledger's primary key on `scan_records.ticket_order_id` is the
//! system's single "scanned at most once" enforcement point. The insert
//! here deliberately carries no transaction or advisory lock: when two
//! gates race on the same ticket, Postgres accepts exactly one row and
//! the loser's unique violation is translated into
//! [`LedgerOutcome::Duplicate`] with the winning record.

use matchday_core::ledger::{LedgerOutcome, ScanLedger, StoreError, TicketDirectory};
use matchday_core::types::{
    MatchId, MatchInfo, OperatorId, PaymentStatus, ScanRecord, TicketOrder, TicketOrderId,
    TicketType,
};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Map a sqlx failure onto the gate's store error taxonomy.
pub(crate) fn map_sqlx(err: &sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Connection(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}

/// Postgres implementation of the gate's two store surfaces.
///
/// # Example
///
/// ```ignore
/// let store = PostgresGateStore::connect(&config.database_url).await?;
/// store.migrate().await?;
///
/// let validator = Validator::new(
///     Arc::new(store.clone()),
///     Arc::new(store.clone()),
///     Arc::new(SystemClock),
/// );
/// ```
#[derive(Clone)]
pub struct PostgresGateStore {
    pool: PgPool,
}

impl PostgresGateStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small dedicated pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Run the workspace migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool, for callers composing their own queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a ticket order (shop-side write; the gate never calls this).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn insert_order(&self, order: &TicketOrder) -> Result<(), StoreError> {
        let info = order.ticket_type.match_info.as_ref();
        sqlx::query(
            "INSERT INTO ticket_orders
                 (id, ticket_type, quantity, payment_status, customer_name,
                  match_id, home_team, away_team, kickoff)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id.as_uuid())
        .bind(&order.ticket_type.name)
        .bind(i32::try_from(order.quantity).unwrap_or(i32::MAX))
        .bind(order.payment_status.as_str())
        .bind(&order.customer_name)
        .bind(info.map(|i| *i.match_id.as_uuid()))
        .bind(info.map(|i| i.home_team.clone()))
        .bind(info.map(|i| i.away_team.clone()))
        .bind(info.map(|i| i.kickoff))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx(&e))?;
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<TicketOrder, StoreError> {
        let id: Uuid = row.try_get("id").map_err(|e| map_sqlx(&e))?;
        let status_text: String = row.try_get("payment_status").map_err(|e| map_sqlx(&e))?;
        let payment_status = PaymentStatus::parse(&status_text)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown payment status: {status_text}")))?;
        let quantity: i32 = row.try_get("quantity").map_err(|e| map_sqlx(&e))?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("quantity out of range: {quantity}")))?;

        let match_id: Option<Uuid> = row.try_get("match_id").map_err(|e| map_sqlx(&e))?;
        let match_info = match match_id {
            Some(match_id) => Some(MatchInfo {
                match_id: MatchId::from_uuid(match_id),
                home_team: row.try_get("home_team").map_err(|e| map_sqlx(&e))?,
                away_team: row.try_get("away_team").map_err(|e| map_sqlx(&e))?,
                kickoff: row.try_get("kickoff").map_err(|e| map_sqlx(&e))?,
            }),
            None => None,
        };

        Ok(TicketOrder {
            id: TicketOrderId::from_uuid(id),
            ticket_type: TicketType {
                name: row.try_get("ticket_type").map_err(|e| map_sqlx(&e))?,
                match_info,
            },
            quantity,
            payment_status,
            customer_name: row.try_get("customer_name").map_err(|e| map_sqlx(&e))?,
        })
    }

    fn row_to_scan(row: &PgRow) -> Result<ScanRecord, StoreError> {
        let ticket_order_id: Uuid = row.try_get("ticket_order_id").map_err(|e| map_sqlx(&e))?;
        let operator_id: Uuid = row.try_get("operator_id").map_err(|e| map_sqlx(&e))?;
        Ok(ScanRecord {
            ticket_order_id: TicketOrderId::from_uuid(ticket_order_id),
            scanned_at: row.try_get("scanned_at").map_err(|e| map_sqlx(&e))?,
            operator_id: OperatorId::from_uuid(operator_id),
        })
    }

    async fn fetch_scan(&self, id: TicketOrderId) -> Result<Option<ScanRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT ticket_order_id, scanned_at, operator_id
             FROM scan_records
             WHERE ticket_order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx(&e))?;

        row.as_ref().map(Self::row_to_scan).transpose()
    }
}

impl TicketDirectory for PostgresGateStore {
    fn paid_order(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TicketOrder>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            // Payment filter lives in the query: unpaid orders read as
            // absent, exactly like unknown ids.
            let row = sqlx::query(
                "SELECT id, ticket_type, quantity, payment_status, customer_name,
                        match_id, home_team, away_team, kickoff
                 FROM ticket_orders
                 WHERE id = $1 AND payment_status = 'completed'",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(&e))?;

            row.as_ref().map(Self::row_to_order).transpose()
        })
    }
}

impl ScanLedger for PostgresGateStore {
    fn find(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ScanRecord>, StoreError>> + Send + '_>> {
        Box::pin(self.fetch_scan(id))
    }

    fn record(
        &self,
        record: ScanRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LedgerOutcome, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let inserted = sqlx::query(
                "INSERT INTO scan_records (ticket_order_id, scanned_at, operator_id)
                 VALUES ($1, $2, $3)",
            )
            .bind(record.ticket_order_id.as_uuid())
            .bind(record.scanned_at)
            .bind(record.operator_id.as_uuid())
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => Ok(LedgerOutcome::Recorded),
                Err(err) => {
                    let unique_violation = err
                        .as_database_error()
                        .is_some_and(|db| db.is_unique_violation());
                    if unique_violation {
                        // Lost the race: surface the winner's record.
                        match self.fetch_scan(record.ticket_order_id).await? {
                            Some(existing) => Ok(LedgerOutcome::Duplicate(existing)),
                            None => Err(StoreError::Query(
                                "unique violation but winning scan not readable".to_string(),
                            )),
                        }
                    } else {
                        Err(map_sqlx(&err))
                    }
                }
            }
        })
    }
}
