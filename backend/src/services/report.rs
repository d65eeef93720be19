//! Reporting service
//!
//! Read-only aggregations over inventory, transfers and user activity for
//! dashboards and analytics. Nothing here mutates state.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::DateRange;

/// Report service
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

/// Per-branch stock totals
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockSummaryEntry {
    pub branch_name: String,
    pub total_items: i64,
    pub total_stock: i64,
    pub total_reserved: i64,
    pub total_available: i64,
    pub low_stock_items: i64,
    pub out_of_stock_items: i64,
}

/// Stock valuation of one item at one branch
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockValuationEntry {
    pub branch_name: String,
    pub item_name: String,
    pub current_stock: i32,
    pub unit_price: Decimal,
    pub total_value: Decimal,
}

/// Stock that has not moved recently
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockAgingEntry {
    pub item_name: String,
    pub branch_name: String,
    pub current_stock: i32,
    pub last_movement: DateTime<Utc>,
    pub days_since_movement: i32,
}

/// Daily transfer counts by outcome
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferSummaryEntry {
    pub request_day: NaiveDate,
    pub total_requests: i64,
    pub pending: i64,
    pub approved: i64,
    pub completed: i64,
    pub rejected: i64,
    pub cancelled: i64,
}

/// Items most often requested for transfer
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MostRequestedEntry {
    pub item_name: String,
    pub request_count: i64,
    pub total_requested: i64,
}

/// Average lifecycle durations per branch pair, delivered transfers only
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferPerformanceEntry {
    pub from_branch: String,
    pub to_branch: String,
    pub total_transfers: i64,
    pub avg_approval_days: Option<f64>,
    pub avg_dispatch_days: Option<f64>,
    pub avg_delivery_days: Option<f64>,
    pub avg_total_days: Option<f64>,
}

/// Operation counts per active user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserActivityEntry {
    pub full_name: String,
    pub branch_name: String,
    pub role_name: String,
    pub transfer_requests: i64,
    pub dispatches: i64,
    pub receipts: i64,
    pub stock_movements: i64,
}

/// Headline counters for the dashboard
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardSummary {
    pub pending_transfers: i64,
    pub in_transit_transfers: i64,
    pub open_discrepancies: i64,
    pub low_stock_items: i64,
    pub movements_today: i64,
}

/// Recently posted movement, compact form
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentMovement {
    pub id: Uuid,
    pub item_name: String,
    pub branch_name: String,
    pub movement_type: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Recently created transfer, compact form
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentTransfer {
    pub id: Uuid,
    pub transfer_number: String,
    pub from_branch: String,
    pub to_branch: String,
    pub status: String,
    pub request_date: DateTime<Utc>,
}

/// Dashboard payload: counters plus latest activity
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    pub recent_transfers: Vec<RecentTransfer>,
    pub recent_movements: Vec<RecentMovement>,
}

impl ReportService {
    /// Create a new ReportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock totals per active branch
    pub async fn stock_summary(&self) -> AppResult<Vec<StockSummaryEntry>> {
        let rows = sqlx::query_as::<_, StockSummaryEntry>(
            r#"
            SELECT b.branch_name,
                   COUNT(DISTINCT inv.item_id) AS total_items,
                   COALESCE(SUM(inv.current_stock), 0)::BIGINT AS total_stock,
                   COALESCE(SUM(inv.reserved_stock), 0)::BIGINT AS total_reserved,
                   COALESCE(SUM(inv.available_stock), 0)::BIGINT AS total_available,
                   COUNT(*) FILTER (WHERE inv.available_stock <= i.minimum_stock_level) AS low_stock_items,
                   COUNT(*) FILTER (WHERE inv.available_stock <= 0) AS out_of_stock_items
            FROM branches b
            LEFT JOIN inventory inv ON b.id = inv.branch_id
            LEFT JOIN items i ON inv.item_id = i.id AND i.is_active = TRUE
            WHERE b.is_active = TRUE
            GROUP BY b.id, b.branch_name
            ORDER BY b.branch_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Valuation of current stock at the item's current unit price. Prices
    /// are never applied retroactively to historical movements.
    pub async fn stock_valuation(&self) -> AppResult<Vec<StockValuationEntry>> {
        let rows = sqlx::query_as::<_, StockValuationEntry>(
            r#"
            SELECT b.branch_name, i.item_name, inv.current_stock, i.unit_price,
                   (inv.current_stock * i.unit_price) AS total_value
            FROM inventory inv
            JOIN items i ON inv.item_id = i.id
            JOIN branches b ON inv.branch_id = b.id
            WHERE i.is_active = TRUE AND b.is_active = TRUE
            ORDER BY total_value DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Stock with no movement for more than `older_than_days` days
    pub async fn stock_aging(&self, older_than_days: i32) -> AppResult<Vec<StockAgingEntry>> {
        let rows = sqlx::query_as::<_, StockAgingEntry>(
            r#"
            SELECT i.item_name, b.branch_name, inv.current_stock,
                   COALESCE(MAX(sm.created_at), inv.last_updated) AS last_movement,
                   (CURRENT_DATE - COALESCE(MAX(sm.created_at), inv.last_updated)::date) AS days_since_movement
            FROM inventory inv
            JOIN items i ON inv.item_id = i.id
            JOIN branches b ON inv.branch_id = b.id
            LEFT JOIN stock_movements sm
                ON inv.item_id = sm.item_id AND inv.branch_id = sm.branch_id
            WHERE i.is_active = TRUE AND inv.current_stock > 0
            GROUP BY inv.item_id, inv.branch_id, i.item_name, b.branch_name,
                     inv.current_stock, inv.last_updated
            HAVING (CURRENT_DATE - COALESCE(MAX(sm.created_at), inv.last_updated)::date) > $1
            ORDER BY days_since_movement DESC
            "#,
        )
        .bind(older_than_days)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Daily transfer counts by outcome for a date range
    pub async fn transfer_summary(&self, range: DateRange) -> AppResult<Vec<TransferSummaryEntry>> {
        Self::require_valid_range(&range)?;
        let rows = sqlx::query_as::<_, TransferSummaryEntry>(
            r#"
            SELECT tr.request_date::date AS request_day,
                   COUNT(*) AS total_requests,
                   COUNT(*) FILTER (WHERE tr.status = 'PENDING') AS pending,
                   COUNT(*) FILTER (WHERE tr.status = 'APPROVED') AS approved,
                   COUNT(*) FILTER (WHERE tr.status = 'DELIVERED') AS completed,
                   COUNT(*) FILTER (WHERE tr.status = 'REJECTED') AS rejected,
                   COUNT(*) FILTER (WHERE tr.status = 'CANCELLED') AS cancelled
            FROM transfer_requests tr
            WHERE tr.request_date::date BETWEEN $1 AND $2
            GROUP BY request_day
            ORDER BY request_day DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Items most requested for transfer within a date range
    pub async fn most_requested_items(&self, range: DateRange) -> AppResult<Vec<MostRequestedEntry>> {
        Self::require_valid_range(&range)?;
        let rows = sqlx::query_as::<_, MostRequestedEntry>(
            r#"
            SELECT i.item_name,
                   COUNT(*) AS request_count,
                   COALESCE(SUM(tri.requested_quantity), 0)::BIGINT AS total_requested
            FROM transfer_request_items tri
            JOIN items i ON tri.item_id = i.id
            JOIN transfer_requests tr ON tri.transfer_id = tr.id
            WHERE tr.request_date::date BETWEEN $1 AND $2
            GROUP BY i.id, i.item_name
            ORDER BY request_count DESC, total_requested DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Average stage durations per branch pair for delivered transfers
    pub async fn transfer_performance(
        &self,
        range: DateRange,
    ) -> AppResult<Vec<TransferPerformanceEntry>> {
        Self::require_valid_range(&range)?;
        let rows = sqlx::query_as::<_, TransferPerformanceEntry>(
            r#"
            SELECT fb.branch_name AS from_branch, tb.branch_name AS to_branch,
                   COUNT(*) AS total_transfers,
                   AVG(tr.approval_date::date - tr.request_date::date)::FLOAT8 AS avg_approval_days,
                   AVG(tr.dispatch_date::date - tr.approval_date::date)::FLOAT8 AS avg_dispatch_days,
                   AVG(tr.delivery_date::date - tr.dispatch_date::date)::FLOAT8 AS avg_delivery_days,
                   AVG(tr.delivery_date::date - tr.request_date::date)::FLOAT8 AS avg_total_days
            FROM transfer_requests tr
            JOIN branches fb ON tr.from_branch_id = fb.id
            JOIN branches tb ON tr.to_branch_id = tb.id
            WHERE tr.status = 'DELIVERED'
              AND tr.request_date::date BETWEEN $1 AND $2
            GROUP BY tr.from_branch_id, tr.to_branch_id, fb.branch_name, tb.branch_name
            ORDER BY avg_total_days DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Operation counts per active user
    pub async fn user_activity(&self) -> AppResult<Vec<UserActivityEntry>> {
        let rows = sqlx::query_as::<_, UserActivityEntry>(
            r#"
            SELECT u.full_name, b.branch_name, r.role_name,
                   COUNT(DISTINCT tr.id) AS transfer_requests,
                   COUNT(DISTINCT ds.id) AS dispatches,
                   COUNT(DISTINCT rs.id) AS receipts,
                   COUNT(DISTINCT sm.id) AS stock_movements
            FROM users u
            JOIN branches b ON u.branch_id = b.id
            JOIN roles r ON u.role_id = r.id
            LEFT JOIN transfer_requests tr ON u.id = tr.requested_by
            LEFT JOIN dispatch_slips ds ON u.id = ds.dispatched_by
            LEFT JOIN receiving_slips rs ON u.id = rs.received_by
            LEFT JOIN stock_movements sm ON u.id = sm.created_by
            WHERE u.is_active = TRUE
            GROUP BY u.id, u.full_name, b.branch_name, r.role_name
            ORDER BY b.branch_name, u.full_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    fn require_valid_range(range: &DateRange) -> AppResult<()> {
        if !range.is_valid() {
            return Err(AppError::Validation {
                field: "start".to_string(),
                message: "Start date must not be after end date".to_string(),
            });
        }
        Ok(())
    }

    /// Dashboard counters plus the latest transfers and movements
    pub async fn dashboard(&self) -> AppResult<DashboardResponse> {
        let summary = sqlx::query_as::<_, DashboardSummary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM transfer_requests WHERE status = 'PENDING') AS pending_transfers,
                (SELECT COUNT(*) FROM transfer_requests WHERE status = 'IN_TRANSIT') AS in_transit_transfers,
                (SELECT COUNT(*) FROM stock_discrepancies WHERE status <> 'RESOLVED') AS open_discrepancies,
                (SELECT COUNT(*) FROM inventory inv
                     JOIN items i ON inv.item_id = i.id
                     WHERE i.is_active = TRUE
                       AND inv.available_stock <= i.minimum_stock_level) AS low_stock_items,
                (SELECT COUNT(*) FROM stock_movements
                     WHERE created_at::date = CURRENT_DATE) AS movements_today
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let recent_transfers = sqlx::query_as::<_, RecentTransfer>(
            r#"
            SELECT tr.id, tr.transfer_number,
                   fb.branch_name AS from_branch, tb.branch_name AS to_branch,
                   tr.status, tr.request_date
            FROM transfer_requests tr
            JOIN branches fb ON tr.from_branch_id = fb.id
            JOIN branches tb ON tr.to_branch_id = tb.id
            ORDER BY tr.request_date DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let recent_movements = sqlx::query_as::<_, RecentMovement>(
            r#"
            SELECT sm.id, i.item_name, b.branch_name, sm.movement_type,
                   sm.quantity, sm.created_at
            FROM stock_movements sm
            JOIN items i ON sm.item_id = i.id
            JOIN branches b ON sm.branch_id = b.id
            ORDER BY sm.created_at DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardResponse {
            summary,
            recent_transfers,
            recent_movements,
        })
    }
}
