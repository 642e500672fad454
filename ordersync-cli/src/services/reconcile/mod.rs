//! The reconciliation pass.
//!
//! One pass reads the current external row set, classifies every row as
//! new, changed, or unchanged against the store, then applies the insert,
//! update, and delete batches that bring storage in line with the source.

pub mod core;
pub mod models;

use std::collections::HashSet;
use std::fmt;

use sqlx::SqlitePool;

use crate::api::{RateSource, SheetSource};
use crate::config::{InvalidRowPolicy, SyncConfig};
use crate::error::SyncError;
use crate::store::orders;

use self::core::{PlanBuilder, SyncPlan, coerce_row};

/// What one pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped_rows: usize,
    /// The source was absent and the store was cleared.
    pub cleared: bool,
}

impl PassSummary {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0
            && self.updated == 0
            && self.deleted == 0
            && self.skipped_rows == 0
            && !self.cleared
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cleared {
            return write!(f, "source absent, cleared all stored orders");
        }
        write!(
            f,
            "{} inserted, {} updated, {} deleted",
            self.inserted, self.updated, self.deleted
        )?;
        if self.skipped_rows > 0 {
            write!(f, ", {} rows skipped", self.skipped_rows)?;
        }
        Ok(())
    }
}

/// Run one reconciliation pass.
///
/// The rate and the stored key set are fetched once, so every conversion
/// in the pass uses the same rate. Nothing is written until every row is
/// classified; batch application failures are logged and the remaining
/// batches still run.
pub async fn run_pass(
    pool: &SqlitePool,
    sheet: &dyn SheetSource,
    rates: &dyn RateSource,
    config: &SyncConfig,
) -> Result<PassSummary, SyncError> {
    let rows = match sheet.fetch_rows().await? {
        Some(rows) => rows,
        None => {
            // Source not configured / not ready, distinct from an empty
            // row set.
            return if config.clear_when_absent {
                orders::delete_all(pool).await?;
                log::warn!("Sheet returned no values; cleared stored orders");
                Ok(PassSummary {
                    cleared: true,
                    ..PassSummary::default()
                })
            } else {
                log::warn!("Sheet returned no values; leaving stored orders untouched");
                Ok(PassSummary::default())
            };
        }
    };

    let rate = rates.unit_rate().await?;
    let stored: HashSet<i64> = orders::list_order_numbers(pool).await?.into_iter().collect();

    let mut builder = PlanBuilder::new();
    let mut skipped_rows = 0usize;

    for (index, cells) in rows.iter().enumerate() {
        let row = match admit(coerce_row(index, cells), config.on_invalid_row, &mut skipped_rows)? {
            Some(row) => row,
            None => {
                // Skipping means leaving the row alone: when the order
                // number is still readable, keep its stored counterpart
                // out of the removed set.
                if let Some(order_num) = cells.get(1).and_then(|c| c.trim().parse::<i64>().ok()) {
                    if stored.contains(&order_num) {
                        builder.mark_unchanged(order_num);
                    }
                }
                continue;
            }
        };

        if !stored.contains(&row.order_num) {
            match admit(row.into_order(index, rate), config.on_invalid_row, &mut skipped_rows)? {
                Some(order) => builder.stage_insert(order),
                None => continue,
            }
        } else {
            let current = orders::get_order(pool, row.order_num).await?;
            let unchanged = current.as_ref().is_some_and(|cur| row.matches(cur));

            // Mark the key seen before attempting the date parse: a row
            // that fails validation under the skip policy must not get
            // its stored counterpart deleted.
            builder.mark_unchanged(row.order_num);
            if !unchanged {
                match admit(row.into_order(index, rate), config.on_invalid_row, &mut skipped_rows)? {
                    Some(order) => builder.stage_update(order),
                    None => continue,
                }
            }
        }
    }

    let plan = builder.into_plan(&stored);
    let mut summary = apply_plan(pool, plan).await;
    summary.skipped_rows = skipped_rows;

    Ok(summary)
}

/// Apply the staged batches in insert, update, delete order. A failed
/// batch is logged and the rest still run; per-row anomalies inside a
/// batch are the store's concern.
async fn apply_plan(pool: &SqlitePool, plan: SyncPlan) -> PassSummary {
    let mut summary = PassSummary::default();

    if let Err(err) = orders::insert_orders(pool, &plan.inserts).await {
        log::error!("Insert batch of {} orders failed: {err:#}", plan.inserts.len());
    } else {
        summary.inserted = plan.inserts.len();
    }

    match orders::update_orders(pool, &plan.updates).await {
        Ok(_) => summary.updated = plan.updates.len(),
        Err(err) => {
            log::error!("Update batch of {} orders failed: {err:#}", plan.updates.len());
        }
    }

    match orders::delete_orders(pool, &plan.deletes).await {
        Ok(_) => summary.deleted = plan.deletes.len(),
        Err(err) => {
            log::error!("Delete batch of {} orders failed: {err:#}", plan.deletes.len());
        }
    }

    summary
}

/// Apply the invalid-row policy to one row-level result.
fn admit<T>(
    result: Result<T, SyncError>,
    policy: InvalidRowPolicy,
    skipped_rows: &mut usize,
) -> Result<Option<T>, SyncError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ SyncError::InvalidRow { .. }) => match policy {
            InvalidRowPolicy::Fail => Err(err),
            InvalidRowPolicy::Skip => {
                log::warn!("Skipping invalid source row: {err}");
                *skipped_rows += 1;
                Ok(None)
            }
        },
        Err(other) => Err(other),
    }
}
