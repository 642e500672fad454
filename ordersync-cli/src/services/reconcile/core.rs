//! Pure classification core of the reconciler.
//!
//! Coerces raw sheet cells into typed rows and accumulates the staged
//! plan. No IO happens here; the driver in `mod.rs` owns the store and
//! feed round-trips.

use std::collections::{BTreeMap, HashSet};

use super::models::{Order, SheetRow};
use crate::error::SyncError;

/// The minimal set of mutations that brings the store in line with the
/// source. The three sets are disjoint by construction.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub inserts: Vec<Order>,
    pub updates: Vec<Order>,
    pub deletes: Vec<i64>,
}

#[derive(Debug, Clone)]
enum Staged {
    Insert(Order),
    Update(Order),
    Unchanged,
}

/// Accumulates per-row classifications keyed by order number.
///
/// Keyed staging makes the duplicate rule explicit: when one pull carries
/// the same order number twice, the later occurrence overwrites the
/// earlier one.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    staged: BTreeMap<i64, Staged>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_insert(&mut self, order: Order) {
        self.staged.insert(order.order_num, Staged::Insert(order));
    }

    pub fn stage_update(&mut self, order: Order) {
        self.staged.insert(order.order_num, Staged::Update(order));
    }

    /// Record a row as present in the source without staging a write.
    pub fn mark_unchanged(&mut self, order_num: i64) {
        self.staged.insert(order_num, Staged::Unchanged);
    }

    /// Finish the pass: everything stored but never seen becomes a delete.
    ///
    /// Batches come out sorted by order number, so apply order is
    /// deterministic.
    pub fn into_plan(self, stored: &HashSet<i64>) -> SyncPlan {
        let mut plan = SyncPlan::default();

        for order_num in stored {
            if !self.staged.contains_key(order_num) {
                plan.deletes.push(*order_num);
            }
        }
        plan.deletes.sort_unstable();

        for (_, staged) in self.staged {
            match staged {
                Staged::Insert(order) => plan.inserts.push(order),
                Staged::Update(order) => plan.updates.push(order),
                Staged::Unchanged => {}
            }
        }

        plan
    }
}

/// Coerce one raw sheet row into its semantic types.
///
/// The delivery date is kept as raw text; see [`SheetRow`].
pub fn coerce_row(index: usize, cells: &[String]) -> Result<SheetRow, SyncError> {
    if cells.len() != 4 {
        return Err(SyncError::invalid_row(
            index,
            format!("expected 4 columns, got {}", cells.len()),
        ));
    }

    let number = parse_int(index, &cells[0], "sequence number")?;
    let order_num = parse_int(index, &cells[1], "order number")?;

    let price_usd: f64 = cells[2].trim().parse().map_err(|_| {
        SyncError::invalid_row(index, format!("price {:?} is not a number", cells[2]))
    })?;
    if !price_usd.is_finite() || price_usd <= 0.0 {
        return Err(SyncError::invalid_row(
            index,
            format!("price must be positive, got {price_usd}"),
        ));
    }

    Ok(SheetRow {
        number,
        order_num,
        price_usd,
        delivery_time: cells[3].clone(),
    })
}

fn parse_int(index: usize, cell: &str, what: &str) -> Result<i64, SyncError> {
    cell.trim()
        .parse()
        .map_err(|_| SyncError::invalid_row(index, format!("{what} {cell:?} is not an integer")))
}
