//! Transfer request lifecycle service
//!
//! Owns the PENDING -> APPROVED -> IN_TRANSIT -> DELIVERED state machine
//! (with REJECTED and CANCELLED exits) and drives the stock ledger at each
//! transition: dispatch reserves at the source branch, receive posts the
//! TRANSFER_OUT/TRANSFER_IN pair and releases the reservation. Status
//! transitions are conditional updates so concurrent callers race on the
//! row and exactly one wins.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{LedgerService, PostMovementInput};
use crate::services::sequence::SequenceService;
use shared::models::{
    ArrivalCondition, DocumentKind, MovementType, ReferenceType, TransferPriority, TransferStatus,
};
use shared::types::Pagination;
use shared::validation::validate_positive_quantity;

/// Transfer service for managing transfer requests and their slips
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
}

/// Full transfer request with joined display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferRequestRecord {
    pub id: Uuid,
    pub transfer_number: String,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub from_branch_name: String,
    pub to_branch_name: String,
    pub status: String,
    pub priority: String,
    pub requested_by: Uuid,
    pub requested_by_name: String,
    pub approved_by: Option<Uuid>,
    pub approved_by_name: Option<String>,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact transfer row for listings and approval queues
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferSummary {
    pub id: Uuid,
    pub transfer_number: String,
    pub from_branch: String,
    pub to_branch: String,
    pub requested_by: String,
    pub status: String,
    pub priority: String,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub total_items: i64,
}

/// Transfer line item with source-branch availability
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferItemRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub unit_of_measure: String,
    pub requested_quantity: i32,
    pub approved_quantity: Option<i32>,
    pub dispatched_quantity: Option<i32>,
    pub received_quantity: Option<i32>,
    pub available_stock: i32,
    pub notes: Option<String>,
}

/// Dispatch slip with joined display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DispatchRecord {
    pub id: Uuid,
    pub dispatch_number: String,
    pub transfer_id: Uuid,
    pub transfer_number: String,
    pub from_branch: String,
    pub to_branch: String,
    pub dispatched_by: Uuid,
    pub dispatched_by_name: String,
    pub loader_name: Option<String>,
    pub vehicle_info: Option<String>,
    pub dispatch_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Item line on a dispatch slip
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DispatchItemRecord {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub unit_of_measure: String,
    pub dispatched_quantity: i32,
}

/// Receiving slip with joined display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReceivingRecord {
    pub id: Uuid,
    pub receiving_number: String,
    pub transfer_id: Uuid,
    pub transfer_number: String,
    pub dispatch_id: Uuid,
    pub dispatch_number: String,
    pub from_branch: String,
    pub to_branch: String,
    pub received_by: Uuid,
    pub received_by_name: String,
    pub condition_on_arrival: String,
    pub receiving_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Item line on a receiving slip
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReceivingItemRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub unit_of_measure: String,
    pub dispatched_quantity: i32,
    pub received_quantity: i32,
    pub damaged_quantity: i32,
    pub condition_notes: Option<String>,
}

/// Input for creating a transfer request
#[derive(Debug, Deserialize)]
pub struct CreateTransferInput {
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    #[serde(default)]
    pub priority: TransferPriority,
    pub notes: Option<String>,
    pub items: Vec<TransferItemInput>,
}

/// Requested line item
#[derive(Debug, Deserialize)]
pub struct TransferItemInput {
    pub item_id: Uuid,
    pub requested_quantity: i32,
    pub notes: Option<String>,
}

/// Input for approving a transfer request
#[derive(Debug, Deserialize)]
pub struct ApproveTransferInput {
    pub items: Vec<ApproveItemInput>,
}

/// Approved quantity for one line item
#[derive(Debug, Deserialize)]
pub struct ApproveItemInput {
    pub item_id: Uuid,
    pub approved_quantity: i32,
}

/// Input for rejecting a transfer request
#[derive(Debug, Deserialize)]
pub struct RejectTransferInput {
    pub rejection_reason: String,
}

/// Input for dispatching an approved transfer
#[derive(Debug, Deserialize)]
pub struct DispatchInput {
    pub transfer_id: Uuid,
    pub loader_name: Option<String>,
    pub vehicle_info: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Input for receiving an in-transit transfer
#[derive(Debug, Deserialize)]
pub struct ReceiveInput {
    pub transfer_id: Uuid,
    pub dispatch_id: Uuid,
    #[serde(default)]
    pub condition_on_arrival: ArrivalCondition,
    pub notes: Option<String>,
    pub items: Vec<ReceiveItemInput>,
}

/// Received quantities for one line item
#[derive(Debug, Deserialize)]
pub struct ReceiveItemInput {
    pub item_id: Uuid,
    pub received_quantity: i32,
    #[serde(default)]
    pub damaged_quantity: i32,
    pub condition_notes: Option<String>,
}

/// Result of a batch approval
#[derive(Debug, Serialize)]
pub struct BatchApprovalResult {
    pub approved_count: u64,
    pub transfer_ids: Vec<Uuid>,
}

const TRANSFER_SELECT: &str = r#"
    SELECT tr.id, tr.transfer_number, tr.from_branch_id, tr.to_branch_id,
           fb.branch_name AS from_branch_name, tb.branch_name AS to_branch_name,
           tr.status, tr.priority, tr.requested_by, ru.full_name AS requested_by_name,
           tr.approved_by, au.full_name AS approved_by_name,
           tr.request_date, tr.approval_date, tr.dispatch_date, tr.delivery_date,
           tr.rejection_reason, tr.notes, tr.created_at, tr.updated_at
    FROM transfer_requests tr
    JOIN branches fb ON tr.from_branch_id = fb.id
    JOIN branches tb ON tr.to_branch_id = tb.id
    JOIN users ru ON tr.requested_by = ru.id
    LEFT JOIN users au ON tr.approved_by = au.id
"#;

const DISPATCH_SELECT: &str = r#"
    SELECT ds.id, ds.dispatch_number, ds.transfer_id, tr.transfer_number,
           fb.branch_name AS from_branch, tb.branch_name AS to_branch,
           ds.dispatched_by, u.full_name AS dispatched_by_name,
           ds.loader_name, ds.vehicle_info, ds.dispatch_date,
           ds.expected_delivery_date, ds.notes
    FROM dispatch_slips ds
    JOIN transfer_requests tr ON ds.transfer_id = tr.id
    JOIN branches fb ON tr.from_branch_id = fb.id
    JOIN branches tb ON tr.to_branch_id = tb.id
    JOIN users u ON ds.dispatched_by = u.id
"#;

const RECEIVING_SELECT: &str = r#"
    SELECT rs.id, rs.receiving_number, rs.transfer_id, tr.transfer_number,
           rs.dispatch_id, ds.dispatch_number,
           fb.branch_name AS from_branch, tb.branch_name AS to_branch,
           rs.received_by, u.full_name AS received_by_name,
           rs.condition_on_arrival, rs.receiving_date, rs.notes
    FROM receiving_slips rs
    JOIN transfer_requests tr ON rs.transfer_id = tr.id
    JOIN dispatch_slips ds ON rs.dispatch_id = ds.id
    JOIN branches fb ON tr.from_branch_id = fb.id
    JOIN branches tb ON tr.to_branch_id = tb.id
    JOIN users u ON rs.received_by = u.id
"#;

impl TransferService {
    /// Create a new TransferService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a transfer request in PENDING with its line items.
    /// No stock is reserved at this point.
    pub async fn create(
        &self,
        requested_by: Uuid,
        input: CreateTransferInput,
    ) -> AppResult<TransferRequestRecord> {
        if input.from_branch_id == input.to_branch_id {
            return Err(AppError::Validation {
                field: "to_branch_id".to_string(),
                message: "Source and destination branch must differ".to_string(),
            });
        }
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A transfer request needs at least one item".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for item in &input.items {
            if let Err(msg) = validate_positive_quantity(item.requested_quantity) {
                return Err(AppError::InvalidQuantity(msg.to_string()));
            }
            if !seen.insert(item.item_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Item {} appears more than once", item.item_id),
                });
            }
        }

        self.require_active_branch(input.from_branch_id).await?;
        self.require_active_branch(input.to_branch_id).await?;
        for item in &input.items {
            self.require_active_item(item.item_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let transfer_number = SequenceService::next_number_in(&mut tx, DocumentKind::Transfer).await?;

        let transfer_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transfer_requests
                (transfer_number, from_branch_id, to_branch_id, status, priority,
                 requested_by, notes)
            VALUES ($1, $2, $3, 'PENDING', $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&transfer_number)
        .bind(input.from_branch_id)
        .bind(input.to_branch_id)
        .bind(input.priority.as_str())
        .bind(requested_by)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO transfer_request_items (transfer_id, item_id, requested_quantity, notes)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(transfer_id)
            .bind(item.item_id)
            .bind(item.requested_quantity)
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_transfer(transfer_id).await
    }

    /// Get a transfer request with display names
    pub async fn get_transfer(&self, transfer_id: Uuid) -> AppResult<TransferRequestRecord> {
        let query = format!("{} WHERE tr.id = $1", TRANSFER_SELECT);
        sqlx::query_as::<_, TransferRequestRecord>(&query)
            .bind(transfer_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer request".to_string()))
    }

    /// List transfer requests, newest first
    pub async fn list_transfers(&self, pagination: Pagination) -> AppResult<Vec<TransferSummary>> {
        let pagination = pagination.clamped();
        let summaries = sqlx::query_as::<_, TransferSummary>(
            r#"
            SELECT tr.id, tr.transfer_number,
                   fb.branch_name AS from_branch, tb.branch_name AS to_branch,
                   u.full_name AS requested_by, tr.status, tr.priority,
                   tr.request_date, tr.approval_date,
                   COUNT(tri.id) AS total_items
            FROM transfer_requests tr
            JOIN branches fb ON tr.from_branch_id = fb.id
            JOIN branches tb ON tr.to_branch_id = tb.id
            JOIN users u ON tr.requested_by = u.id
            LEFT JOIN transfer_request_items tri ON tr.id = tri.transfer_id
            GROUP BY tr.id, fb.branch_name, tb.branch_name, u.full_name
            ORDER BY tr.request_date DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(summaries)
    }

    /// Pending requests awaiting approval at the source branch, most urgent
    /// first
    pub async fn pending_for_branch(&self, branch_id: Uuid) -> AppResult<Vec<TransferSummary>> {
        let summaries = sqlx::query_as::<_, TransferSummary>(
            r#"
            SELECT tr.id, tr.transfer_number,
                   fb.branch_name AS from_branch, tb.branch_name AS to_branch,
                   u.full_name AS requested_by, tr.status, tr.priority,
                   tr.request_date, tr.approval_date,
                   COUNT(tri.id) AS total_items
            FROM transfer_requests tr
            JOIN branches fb ON tr.from_branch_id = fb.id
            JOIN branches tb ON tr.to_branch_id = tb.id
            JOIN users u ON tr.requested_by = u.id
            LEFT JOIN transfer_request_items tri ON tr.id = tri.transfer_id
            WHERE tr.from_branch_id = $1 AND tr.status = 'PENDING'
            GROUP BY tr.id, fb.branch_name, tb.branch_name, u.full_name
            ORDER BY
                CASE tr.priority
                    WHEN 'URGENT' THEN 1
                    WHEN 'HIGH' THEN 2
                    WHEN 'MEDIUM' THEN 3
                    WHEN 'LOW' THEN 4
                END,
                tr.request_date
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(summaries)
    }

    /// Line items of a transfer, with current availability at the source
    /// branch
    pub async fn get_items(&self, transfer_id: Uuid) -> AppResult<Vec<TransferItemRecord>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM transfer_requests WHERE id = $1)",
        )
        .bind(transfer_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Transfer request".to_string()));
        }

        let items = sqlx::query_as::<_, TransferItemRecord>(
            r#"
            SELECT tri.id, tri.item_id, i.item_name, i.item_code, i.unit_of_measure,
                   tri.requested_quantity, tri.approved_quantity,
                   tri.dispatched_quantity, tri.received_quantity,
                   COALESCE(inv.available_stock, 0) AS available_stock,
                   tri.notes
            FROM transfer_request_items tri
            JOIN items i ON tri.item_id = i.id
            JOIN transfer_requests tr ON tri.transfer_id = tr.id
            LEFT JOIN inventory inv
                ON inv.item_id = tri.item_id AND inv.branch_id = tr.from_branch_id
            WHERE tri.transfer_id = $1
            ORDER BY i.item_name
            "#,
        )
        .bind(transfer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Approve a pending transfer, recording per-item approved quantities.
    /// Reservation happens later, at dispatch.
    pub async fn approve(
        &self,
        transfer_id: Uuid,
        approved_by: Uuid,
        input: ApproveTransferInput,
    ) -> AppResult<TransferRequestRecord> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = 'APPROVED', approved_by = $2, approval_date = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(transfer_id)
        .bind(approved_by)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::transition_error(&mut tx, transfer_id, TransferStatus::Approved).await);
        }

        let requested: HashMap<Uuid, i32> = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT item_id, requested_quantity FROM transfer_request_items WHERE transfer_id = $1",
        )
        .bind(transfer_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut seen = HashSet::new();
        for item in &input.items {
            if !seen.insert(item.item_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Item {} appears more than once", item.item_id),
                });
            }
        }
        if input.items.len() != requested.len() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Approval must cover every requested item".to_string(),
            });
        }

        for item in &input.items {
            let requested_quantity = requested.get(&item.item_id).copied().ok_or_else(|| {
                AppError::NotFound(format!("Transfer item {}", item.item_id))
            })?;

            if item.approved_quantity < 0 || item.approved_quantity > requested_quantity {
                return Err(AppError::InvalidQuantity(format!(
                    "Approved quantity {} for item {} exceeds requested {}",
                    item.approved_quantity, item.item_id, requested_quantity
                )));
            }

            sqlx::query(
                r#"
                UPDATE transfer_request_items
                SET approved_quantity = $3
                WHERE transfer_id = $1 AND item_id = $2
                "#,
            )
            .bind(transfer_id)
            .bind(item.item_id)
            .bind(item.approved_quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_transfer(transfer_id).await
    }

    /// Reject a pending transfer with a reason
    pub async fn reject(
        &self,
        transfer_id: Uuid,
        approved_by: Uuid,
        input: RejectTransferInput,
    ) -> AppResult<TransferRequestRecord> {
        if input.rejection_reason.trim().is_empty() {
            return Err(AppError::Validation {
                field: "rejection_reason".to_string(),
                message: "Rejection reason is required".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = 'REJECTED', approved_by = $2, approval_date = NOW(),
                rejection_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(transfer_id)
        .bind(approved_by)
        .bind(&input.rejection_reason)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::transition_error(&mut tx, transfer_id, TransferStatus::Rejected).await);
        }

        tx.commit().await?;

        self.get_transfer(transfer_id).await
    }

    /// Cancel a transfer before it leaves the source branch. Nothing was
    /// reserved yet, so there is no ledger rollback.
    pub async fn cancel(&self, transfer_id: Uuid) -> AppResult<TransferRequestRecord> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'APPROVED')
            "#,
        )
        .bind(transfer_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::transition_error(&mut tx, transfer_id, TransferStatus::Cancelled).await);
        }

        tx.commit().await?;

        self.get_transfer(transfer_id).await
    }

    /// Approve all pending LOW-priority transfers out of a branch in one
    /// conditional update, defaulting approved quantities to the requested
    /// ones
    pub async fn approve_low_priority(
        &self,
        from_branch_id: Uuid,
        approved_by: Uuid,
    ) -> AppResult<BatchApprovalResult> {
        let mut tx = self.db.begin().await?;

        let transfer_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE transfer_requests
            SET status = 'APPROVED', approved_by = $2, approval_date = NOW(), updated_at = NOW()
            WHERE status = 'PENDING' AND priority = 'LOW' AND from_branch_id = $1
            RETURNING id
            "#,
        )
        .bind(from_branch_id)
        .bind(approved_by)
        .fetch_all(&mut *tx)
        .await?;

        if !transfer_ids.is_empty() {
            sqlx::query(
                r#"
                UPDATE transfer_request_items
                SET approved_quantity = requested_quantity
                WHERE transfer_id = ANY($1)
                "#,
            )
            .bind(&transfer_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(BatchApprovalResult {
            approved_count: transfer_ids.len() as u64,
            transfer_ids,
        })
    }

    /// Dispatch an approved transfer: create the dispatch slip, move the
    /// request to IN_TRANSIT, copy approved into dispatched quantities, and
    /// reserve stock at the source branch. One transaction; a failed
    /// reservation rolls back the slip and the status change.
    pub async fn dispatch(
        &self,
        dispatched_by: Uuid,
        input: DispatchInput,
    ) -> AppResult<DispatchRecord> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = 'IN_TRANSIT', dispatch_date = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'APPROVED'
            "#,
        )
        .bind(input.transfer_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::transition_error(&mut tx, input.transfer_id, TransferStatus::InTransit).await);
        }

        let from_branch_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT from_branch_id FROM transfer_requests WHERE id = $1",
        )
        .bind(input.transfer_id)
        .fetch_one(&mut *tx)
        .await?;

        let dispatch_number = SequenceService::next_number_in(&mut tx, DocumentKind::Dispatch).await?;

        let dispatch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO dispatch_slips
                (dispatch_number, transfer_id, dispatched_by, loader_name,
                 vehicle_info, expected_delivery_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&dispatch_number)
        .bind(input.transfer_id)
        .bind(dispatched_by)
        .bind(&input.loader_name)
        .bind(&input.vehicle_info)
        .bind(input.expected_delivery_date)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE transfer_request_items
            SET dispatched_quantity = approved_quantity
            WHERE transfer_id = $1 AND approved_quantity IS NOT NULL
            "#,
        )
        .bind(input.transfer_id)
        .execute(&mut *tx)
        .await?;

        let to_reserve = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT item_id, approved_quantity
            FROM transfer_request_items
            WHERE transfer_id = $1 AND approved_quantity > 0
            "#,
        )
        .bind(input.transfer_id)
        .fetch_all(&mut *tx)
        .await?;

        for (item_id, quantity) in to_reserve {
            LedgerService::reserve_in(&mut tx, item_id, from_branch_id, quantity).await?;
        }

        tx.commit().await?;

        self.get_dispatch(dispatch_id).await
    }

    /// Get a dispatch slip
    pub async fn get_dispatch(&self, dispatch_id: Uuid) -> AppResult<DispatchRecord> {
        let query = format!("{} WHERE ds.id = $1", DISPATCH_SELECT);
        sqlx::query_as::<_, DispatchRecord>(&query)
            .bind(dispatch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Dispatch slip".to_string()))
    }

    /// List dispatch slips, newest first
    pub async fn list_dispatches(&self, pagination: Pagination) -> AppResult<Vec<DispatchRecord>> {
        let pagination = pagination.clamped();
        let query = format!(
            "{} ORDER BY ds.dispatch_date DESC LIMIT $1 OFFSET $2",
            DISPATCH_SELECT
        );
        let slips = sqlx::query_as::<_, DispatchRecord>(&query)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db)
            .await?;
        Ok(slips)
    }

    /// Items on a dispatch slip
    pub async fn get_dispatch_items(&self, dispatch_id: Uuid) -> AppResult<Vec<DispatchItemRecord>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM dispatch_slips WHERE id = $1)",
        )
        .bind(dispatch_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Dispatch slip".to_string()));
        }

        let items = sqlx::query_as::<_, DispatchItemRecord>(
            r#"
            SELECT tri.item_id, i.item_name, i.item_code, i.unit_of_measure,
                   tri.dispatched_quantity
            FROM transfer_request_items tri
            JOIN items i ON tri.item_id = i.id
            JOIN dispatch_slips ds ON tri.transfer_id = ds.transfer_id
            WHERE ds.id = $1 AND tri.dispatched_quantity IS NOT NULL
            ORDER BY i.item_name
            "#,
        )
        .bind(dispatch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Receive an in-transit transfer: create the receiving slip, mark the
    /// request DELIVERED, and settle the ledger per item: TRANSFER_OUT at
    /// the source, reservation release, TRANSFER_IN at the destination, all
    /// for the intact received quantity. Damaged or short units stay
    /// reserved at the source until settled through the discrepancy
    /// workflow.
    pub async fn receive(
        &self,
        received_by: Uuid,
        input: ReceiveInput,
    ) -> AppResult<ReceivingRecord> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = 'DELIVERED', delivery_date = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'IN_TRANSIT'
            "#,
        )
        .bind(input.transfer_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::transition_error(&mut tx, input.transfer_id, TransferStatus::Delivered).await);
        }

        let (from_branch_id, to_branch_id) = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT from_branch_id, to_branch_id FROM transfer_requests WHERE id = $1",
        )
        .bind(input.transfer_id)
        .fetch_one(&mut *tx)
        .await?;

        // The slip must reference the dispatch that actually carried this
        // transfer.
        let dispatch_transfer = sqlx::query_scalar::<_, Uuid>(
            "SELECT transfer_id FROM dispatch_slips WHERE id = $1",
        )
        .bind(input.dispatch_id)
        .fetch_optional(&mut *tx)
        .await?;
        match dispatch_transfer {
            Some(transfer_id) if transfer_id == input.transfer_id => {}
            _ => return Err(AppError::NotFound("Dispatch slip".to_string())),
        }

        let dispatched: HashMap<Uuid, i32> = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT item_id, dispatched_quantity
            FROM transfer_request_items
            WHERE transfer_id = $1 AND dispatched_quantity IS NOT NULL
            "#,
        )
        .bind(input.transfer_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut seen = HashSet::new();
        for item in &input.items {
            if !seen.insert(item.item_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Item {} appears more than once", item.item_id),
                });
            }
        }

        let receiving_number =
            SequenceService::next_number_in(&mut tx, DocumentKind::Receiving).await?;

        let receiving_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO receiving_slips
                (receiving_number, transfer_id, dispatch_id, received_by,
                 condition_on_arrival, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&receiving_number)
        .bind(input.transfer_id)
        .bind(input.dispatch_id)
        .bind(received_by)
        .bind(input.condition_on_arrival.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            let dispatched_quantity = dispatched.get(&item.item_id).copied().ok_or_else(|| {
                AppError::NotFound(format!("Dispatched item {}", item.item_id))
            })?;

            if item.received_quantity < 0 || item.damaged_quantity < 0 {
                return Err(AppError::InvalidQuantity(
                    "Received and damaged quantities cannot be negative".to_string(),
                ));
            }
            if item.received_quantity + item.damaged_quantity > dispatched_quantity {
                return Err(AppError::InvalidQuantity(format!(
                    "Received {} + damaged {} for item {} exceeds dispatched {}",
                    item.received_quantity,
                    item.damaged_quantity,
                    item.item_id,
                    dispatched_quantity
                )));
            }

            sqlx::query(
                r#"
                INSERT INTO receiving_slip_items
                    (receiving_id, item_id, dispatched_quantity, received_quantity,
                     damaged_quantity, condition_notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(receiving_id)
            .bind(item.item_id)
            .bind(dispatched_quantity)
            .bind(item.received_quantity)
            .bind(item.damaged_quantity)
            .bind(&item.condition_notes)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE transfer_request_items
                SET received_quantity = $3
                WHERE transfer_id = $1 AND item_id = $2
                "#,
            )
            .bind(input.transfer_id)
            .bind(item.item_id)
            .bind(item.received_quantity)
            .execute(&mut *tx)
            .await?;

            if item.received_quantity > 0 {
                LedgerService::release_in(
                    &mut tx,
                    item.item_id,
                    from_branch_id,
                    item.received_quantity,
                )
                .await?;

                LedgerService::post_movement_in(
                    &mut tx,
                    received_by,
                    &PostMovementInput {
                        item_id: item.item_id,
                        branch_id: from_branch_id,
                        movement_type: MovementType::TransferOut,
                        quantity: item.received_quantity,
                        reference_type: ReferenceType::Transfer,
                        reference_id: Some(input.transfer_id),
                        notes: Some("Dispatched to branch".to_string()),
                    },
                )
                .await?;

                LedgerService::post_movement_in(
                    &mut tx,
                    received_by,
                    &PostMovementInput {
                        item_id: item.item_id,
                        branch_id: to_branch_id,
                        movement_type: MovementType::TransferIn,
                        quantity: item.received_quantity,
                        reference_type: ReferenceType::Transfer,
                        reference_id: Some(input.transfer_id),
                        notes: Some("Received from branch".to_string()),
                    },
                )
                .await?;
            }
        }

        tx.commit().await?;

        self.get_receiving(receiving_id).await
    }

    /// Get a receiving slip
    pub async fn get_receiving(&self, receiving_id: Uuid) -> AppResult<ReceivingRecord> {
        let query = format!("{} WHERE rs.id = $1", RECEIVING_SELECT);
        sqlx::query_as::<_, ReceivingRecord>(&query)
            .bind(receiving_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Receiving slip".to_string()))
    }

    /// List receiving slips, newest first
    pub async fn list_receivings(&self, pagination: Pagination) -> AppResult<Vec<ReceivingRecord>> {
        let pagination = pagination.clamped();
        let query = format!(
            "{} ORDER BY rs.receiving_date DESC LIMIT $1 OFFSET $2",
            RECEIVING_SELECT
        );
        let slips = sqlx::query_as::<_, ReceivingRecord>(&query)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db)
            .await?;
        Ok(slips)
    }

    /// Items on a receiving slip
    pub async fn get_receiving_items(
        &self,
        receiving_id: Uuid,
    ) -> AppResult<Vec<ReceivingItemRecord>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM receiving_slips WHERE id = $1)",
        )
        .bind(receiving_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Receiving slip".to_string()));
        }

        let items = sqlx::query_as::<_, ReceivingItemRecord>(
            r#"
            SELECT rsi.id, rsi.item_id, i.item_name, i.item_code, i.unit_of_measure,
                   rsi.dispatched_quantity, rsi.received_quantity,
                   rsi.damaged_quantity, rsi.condition_notes
            FROM receiving_slip_items rsi
            JOIN items i ON rsi.item_id = i.id
            WHERE rsi.receiving_id = $1
            ORDER BY i.item_name
            "#,
        )
        .bind(receiving_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Turn a zero-row conditional update into the right error: the transfer
    /// either does not exist or is not in a state that permits the
    /// transition (including losing a concurrent race).
    async fn transition_error(
        tx: &mut Transaction<'_, Postgres>,
        transfer_id: Uuid,
        target: TransferStatus,
    ) -> AppError {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM transfer_requests WHERE id = $1",
        )
        .bind(transfer_id)
        .fetch_optional(&mut **tx)
        .await;

        match status {
            Ok(Some(current)) => AppError::InvalidStateTransition(format!(
                "Transfer cannot move from {} to {}",
                current,
                target.as_str()
            )),
            Ok(None) => AppError::NotFound("Transfer request".to_string()),
            Err(e) => AppError::DatabaseError(e),
        }
    }

    async fn require_active_branch(&self, branch_id: Uuid) -> AppResult<()> {
        let active =
            sqlx::query_scalar::<_, bool>("SELECT is_active FROM branches WHERE id = $1")
                .bind(branch_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;
        if !active {
            return Err(AppError::Validation {
                field: "branch_id".to_string(),
                message: format!("Branch {} is inactive", branch_id),
            });
        }
        Ok(())
    }

    async fn require_active_item(&self, item_id: Uuid) -> AppResult<()> {
        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        if !active {
            return Err(AppError::Validation {
                field: "item_id".to_string(),
                message: format!("Item {} is inactive", item_id),
            });
        }
        Ok(())
    }
}
