//! Orders repository.
//!
//! Every function is its own unit of work against the pool; the batch
//! operations run inside a single transaction so a mid-batch failure
//! rolls the whole batch back. `delivery_completed` is owned by the
//! completion path and never written by the reconciliation batches.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::services::reconcile::models::{DATE_FORMAT, Order, OrderRecord, StoredOrder};

/// Create the backing table if it does not exist yet. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number INTEGER NOT NULL,
            order_num INTEGER NOT NULL UNIQUE,
            price_usd REAL NOT NULL,
            price_rub REAL NOT NULL,
            delivery_time DATE NOT NULL,
            delivery_completed BOOLEAN NOT NULL DEFAULT FALSE
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create orders table")?;

    Ok(())
}

/// Bulk insert. No-op on empty input; a duplicate order number fails the
/// whole batch (the transaction rolls it back).
pub async fn insert_orders(pool: &SqlitePool, orders: &[Order]) -> Result<()> {
    if orders.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await.context("Failed to begin insert transaction")?;

    for order in orders {
        sqlx::query(
            "INSERT INTO orders (number, order_num, price_usd, price_rub, delivery_time)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order.number)
        .bind(order.order_num)
        .bind(order.price_usd)
        .bind(order.price_rub)
        .bind(order.delivery_time)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert order {}", order.order_num))?;
    }

    tx.commit().await.context("Failed to commit insert transaction")?;

    Ok(())
}

/// Update all mutable fields of each order, keyed by order number.
///
/// Returns how many orders actually matched a stored row. A key that
/// matches nothing is logged, not an error: the source may have churned
/// between snapshot and apply.
pub async fn update_orders(pool: &SqlitePool, orders: &[Order]) -> Result<u64> {
    if orders.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("Failed to begin update transaction")?;
    let mut matched = 0u64;

    for order in orders {
        let result = sqlx::query(
            "UPDATE orders
             SET number = ?, price_usd = ?, price_rub = ?, delivery_time = ?
             WHERE order_num = ?",
        )
        .bind(order.number)
        .bind(order.price_usd)
        .bind(order.price_rub)
        .bind(order.delivery_time)
        .bind(order.order_num)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update order {}", order.order_num))?;

        if result.rows_affected() == 0 {
            log::warn!("Update matched no stored order for {}", order.order_num);
        } else {
            matched += result.rows_affected();
        }
    }

    tx.commit().await.context("Failed to commit update transaction")?;

    Ok(matched)
}

/// Full scan of stored business keys.
pub async fn list_order_numbers(pool: &SqlitePool) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT order_num FROM orders")
        .fetch_all(pool)
        .await
        .context("Failed to list order numbers")?;

    Ok(rows.into_iter().map(|(order_num,)| order_num).collect())
}

/// Point lookup of the comparable projection of one order. The delivery
/// date comes back formatted `DD.MM.YYYY`, the exact change-detection key.
pub async fn get_order(pool: &SqlitePool, order_num: i64) -> Result<Option<StoredOrder>> {
    let row: Option<(i64, i64, f64, NaiveDate)> = sqlx::query_as(
        "SELECT number, order_num, price_usd, delivery_time FROM orders WHERE order_num = ?",
    )
    .bind(order_num)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get order {order_num}"))?;

    Ok(row.map(|(number, order_num, price_usd, delivery_time)| StoredOrder {
        number,
        order_num,
        price_usd,
        delivery_time: delivery_time.format(DATE_FORMAT).to_string(),
    }))
}

/// Full rows for display.
pub async fn list_orders(pool: &SqlitePool) -> Result<Vec<OrderRecord>> {
    let rows: Vec<(i64, i64, f64, f64, NaiveDate, bool)> = sqlx::query_as(
        "SELECT number, order_num, price_usd, price_rub, delivery_time, delivery_completed
         FROM orders ORDER BY order_num",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list orders")?;

    Ok(rows
        .into_iter()
        .map(
            |(number, order_num, price_usd, price_rub, delivery_time, delivery_completed)| {
                OrderRecord {
                    number,
                    order_num,
                    price_usd,
                    price_rub,
                    delivery_time,
                    delivery_completed,
                }
            },
        )
        .collect())
}

/// Clear every stored order.
pub async fn delete_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM orders")
        .execute(pool)
        .await
        .context("Failed to delete all orders")?;

    Ok(())
}

/// Delete each listed key. No-op on empty input; a missing key is not an
/// error. Returns how many rows were actually removed.
pub async fn delete_orders(pool: &SqlitePool, order_nums: &[i64]) -> Result<u64> {
    if order_nums.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("Failed to begin delete transaction")?;
    let mut deleted = 0u64;

    for order_num in order_nums {
        let result = sqlx::query("DELETE FROM orders WHERE order_num = ?")
            .bind(*order_num)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete order {order_num}"))?;
        deleted += result.rows_affected();
    }

    tx.commit().await.context("Failed to commit delete transaction")?;

    Ok(deleted)
}

/// Flip the completion flag. Lives outside the reconciliation path, which
/// never touches this column. Returns false when no such order exists.
pub async fn set_delivery_completed(
    pool: &SqlitePool,
    order_num: i64,
    completed: bool,
) -> Result<bool> {
    let result = sqlx::query("UPDATE orders SET delivery_completed = ? WHERE order_num = ?")
        .bind(completed)
        .bind(order_num)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to set completion for order {order_num}"))?;

    Ok(result.rows_affected() > 0)
}
