//! Stock ledger service
//!
//! Owns the append-only movement log and the materialized per-branch stock
//! balances. Every change to `inventory.current_stock` goes through this
//! service so that replaying the movement log always reproduces the balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{MovementType, ReferenceType};

/// Ledger service for posting movements and managing reservations
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// A posted stock movement
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for posting a movement
#[derive(Debug, Deserialize)]
pub struct PostMovementInput {
    pub item_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: MovementType,
    /// Magnitude for IN/OUT/TRANSFER types; signed delta for ADJUSTMENT
    pub quantity: i32,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for reserving or releasing stock
#[derive(Debug, Deserialize)]
pub struct ReservationInput {
    pub item_id: Uuid,
    pub branch_id: Uuid,
    pub quantity: i32,
}

/// Input for setting an absolute stock level via an adjustment
#[derive(Debug, Deserialize)]
pub struct SetStockLevelInput {
    pub item_id: Uuid,
    pub branch_id: Uuid,
    pub new_stock_level: i32,
    pub notes: Option<String>,
}

/// Current balance row as locked inside a transaction
#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    current_stock: i32,
    reserved_stock: i32,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Post a movement and update the materialized balance atomically
    pub async fn post_movement(
        &self,
        created_by: Uuid,
        input: PostMovementInput,
    ) -> AppResult<MovementRecord> {
        let mut tx = self.db.begin().await?;
        let record = Self::post_movement_in(&mut tx, created_by, &input).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Post a movement inside the caller's transaction.
    ///
    /// Locks the inventory row, writes the movement with before/after
    /// snapshots, then updates the balance. Fails without side effects when
    /// the resulting balance would be negative, or when an OUT-direction
    /// movement would eat into reserved stock.
    pub(crate) async fn post_movement_in(
        tx: &mut Transaction<'_, Postgres>,
        created_by: Uuid,
        input: &PostMovementInput,
    ) -> AppResult<MovementRecord> {
        match input.movement_type {
            MovementType::Adjustment => {
                if input.quantity == 0 {
                    return Err(AppError::InvalidQuantity(
                        "Adjustment delta must be non-zero".to_string(),
                    ));
                }
            }
            _ => {
                if input.quantity <= 0 {
                    return Err(AppError::InvalidQuantity(
                        "Movement quantity must be positive".to_string(),
                    ));
                }
            }
        }

        let balance = Self::lock_balance(tx, input.item_id, input.branch_id).await?;

        let delta = input.movement_type.signed_delta(input.quantity);
        let new_stock = balance.current_stock + delta;

        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "Movement of {} would leave stock at {} (current {})",
                input.quantity, new_stock, balance.current_stock
            )));
        }
        if input.movement_type.is_outbound() && new_stock < balance.reserved_stock {
            return Err(AppError::InsufficientAvailableStock(format!(
                "Movement of {} exceeds available stock (current {}, reserved {})",
                input.quantity, balance.current_stock, balance.reserved_stock
            )));
        }

        let record = sqlx::query_as::<_, MovementRecord>(
            r#"
            INSERT INTO stock_movements
                (item_id, branch_id, movement_type, quantity, previous_stock, new_stock,
                 reference_type, reference_id, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, item_id, branch_id, movement_type, quantity, previous_stock,
                      new_stock, reference_type, reference_id, notes, created_by, created_at
            "#,
        )
        .bind(input.item_id)
        .bind(input.branch_id)
        .bind(input.movement_type.as_str())
        .bind(delta.abs())
        .bind(balance.current_stock)
        .bind(new_stock)
        .bind(input.reference_type.as_str())
        .bind(input.reference_id)
        .bind(&input.notes)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE inventory
            SET current_stock = $3, last_updated = NOW()
            WHERE item_id = $1 AND branch_id = $2
            "#,
        )
        .bind(input.item_id)
        .bind(input.branch_id)
        .bind(new_stock)
        .execute(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Post an adjustment bringing the balance to an absolute level.
    /// Returns `None` when the balance already matches.
    pub async fn set_stock_level(
        &self,
        created_by: Uuid,
        input: SetStockLevelInput,
    ) -> AppResult<Option<MovementRecord>> {
        let mut tx = self.db.begin().await?;
        let record = Self::set_stock_level_in(
            &mut tx,
            created_by,
            input.item_id,
            input.branch_id,
            input.new_stock_level,
            ReferenceType::Adjustment,
            None,
            input.notes,
        )
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn set_stock_level_in(
        tx: &mut Transaction<'_, Postgres>,
        created_by: Uuid,
        item_id: Uuid,
        branch_id: Uuid,
        new_stock_level: i32,
        reference_type: ReferenceType,
        reference_id: Option<Uuid>,
        notes: Option<String>,
    ) -> AppResult<Option<MovementRecord>> {
        if new_stock_level < 0 {
            return Err(AppError::InvalidQuantity(
                "Stock level cannot be negative".to_string(),
            ));
        }

        let balance = Self::lock_balance(tx, item_id, branch_id).await?;
        let delta = new_stock_level - balance.current_stock;
        if delta == 0 {
            return Ok(None);
        }

        let input = PostMovementInput {
            item_id,
            branch_id,
            movement_type: MovementType::Adjustment,
            quantity: delta,
            reference_type,
            reference_id,
            notes,
        };
        let record = Self::post_movement_in(tx, created_by, &input).await?;
        Ok(Some(record))
    }

    /// Reserve available stock for a pending outbound operation
    pub async fn reserve(&self, item_id: Uuid, branch_id: Uuid, quantity: i32) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        Self::reserve_in(&mut tx, item_id, branch_id, quantity).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reserve inside the caller's transaction.
    ///
    /// The guard on `available_stock` is part of the UPDATE itself, so two
    /// concurrent reservations serialize on the row and the loser observes
    /// the already-reduced availability.
    pub(crate) async fn reserve_in(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        branch_id: Uuid,
        quantity: i32,
    ) -> AppResult<()> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(
                "Reservation quantity must be positive".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved_stock = reserved_stock + $3, last_updated = NOW()
            WHERE item_id = $1 AND branch_id = $2 AND available_stock >= $3
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let existing = sqlx::query_as::<_, BalanceRow>(
                "SELECT current_stock, reserved_stock FROM inventory WHERE item_id = $1 AND branch_id = $2",
            )
            .bind(item_id)
            .bind(branch_id)
            .fetch_optional(&mut **tx)
            .await?;

            return match existing {
                None => Err(AppError::NotFound("Inventory record".to_string())),
                Some(balance) => Err(AppError::InsufficientAvailableStock(format!(
                    "Requested {} but only {} available (current {}, reserved {})",
                    quantity,
                    balance.current_stock - balance.reserved_stock,
                    balance.current_stock,
                    balance.reserved_stock
                ))),
            };
        }

        Ok(())
    }

    /// Release reserved stock, floored at zero
    pub async fn release(&self, item_id: Uuid, branch_id: Uuid, quantity: i32) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        Self::release_in(&mut tx, item_id, branch_id, quantity).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Release inside the caller's transaction. Over-release from a retried
    /// operation is absorbed by the floor rather than driving the counter
    /// negative.
    pub(crate) async fn release_in(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        branch_id: Uuid,
        quantity: i32,
    ) -> AppResult<()> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(
                "Release quantity must be positive".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved_stock = GREATEST(0, reserved_stock - $3), last_updated = NOW()
            WHERE item_id = $1 AND branch_id = $2
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory record".to_string()));
        }

        Ok(())
    }

    /// Rebuild the materialized balance from the full movement history and
    /// overwrite it, returning the recomputed value.
    ///
    /// This is a repair operation, not a business event: it posts no
    /// movement. Adjustments replay from their balance snapshots because the
    /// quantity column is stored unsigned.
    pub async fn reconcile_from_history(&self, item_id: Uuid, branch_id: Uuid) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;

        // Lock the row first so movements cannot land between the replay and
        // the overwrite.
        let locked = sqlx::query_scalar::<_, i32>(
            "SELECT current_stock FROM inventory WHERE item_id = $1 AND branch_id = $2 FOR UPDATE",
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(AppError::NotFound("Inventory record".to_string()));
        }

        let replayed: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE
                    WHEN movement_type IN ('IN', 'TRANSFER_IN') THEN quantity
                    WHEN movement_type IN ('OUT', 'TRANSFER_OUT') THEN -quantity
                    ELSE new_stock - previous_stock
                END
            ), 0)
            FROM stock_movements
            WHERE item_id = $1 AND branch_id = $2
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_one(&mut *tx)
        .await?;

        let corrected = i32::try_from(replayed)
            .map_err(|_| AppError::Internal("Replayed balance out of range".to_string()))?;

        sqlx::query(
            r#"
            UPDATE inventory
            SET current_stock = $3, last_updated = NOW()
            WHERE item_id = $1 AND branch_id = $2
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .bind(corrected)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(corrected)
    }

    /// Lock (creating on demand) the inventory row for an item at a branch.
    ///
    /// Inventory rows come into existence the first time an item is stocked
    /// at a branch; the insert is a no-op afterwards. Unknown items or
    /// branches surface as a foreign-key NotFound here rather than deeper in
    /// the operation.
    async fn lock_balance(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        branch_id: Uuid,
    ) -> AppResult<BalanceRow> {
        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&mut **tx)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let branch_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(branch_id)
                .fetch_one(&mut **tx)
                .await?;
        if !branch_exists {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO inventory (item_id, branch_id, current_stock, reserved_stock)
            VALUES ($1, $2, 0, 0)
            ON CONFLICT (item_id, branch_id) DO NOTHING
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .execute(&mut **tx)
        .await?;

        let balance = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT current_stock, reserved_stock
            FROM inventory
            WHERE item_id = $1 AND branch_id = $2
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(balance)
    }
}
