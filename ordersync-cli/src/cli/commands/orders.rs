//! Handlers for inspecting and completing stored orders.

use anyhow::Result;
use colored::*;

use super::open_store;
use crate::config::Config;
use crate::services::reconcile::models::DATE_FORMAT;
use crate::store::orders;

pub async fn handle_list(config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let records = orders::list_orders(&pool).await?;

    if records.is_empty() {
        println!("{}", "No orders stored".dimmed());
        return Ok(());
    }

    println!(
        "{:>4}  {:>9}  {:>10}  {:>12}  {:>10}  {}",
        "#".bold(),
        "order".bold(),
        "price USD".bold(),
        "price RUB".bold(),
        "delivery".bold(),
        "done".bold()
    );
    for record in &records {
        println!(
            "{:>4}  {:>9}  {:>10.2}  {:>12.2}  {:>10}  {}",
            record.number,
            record.order_num,
            record.price_usd,
            record.price_rub,
            record.delivery_time.format(DATE_FORMAT),
            if record.delivery_completed {
                "yes".green()
            } else {
                "no".dimmed()
            }
        );
    }
    println!("{} orders", records.len());

    Ok(())
}

pub async fn handle_complete(config: &Config, order_num: i64, undo: bool) -> Result<()> {
    let pool = open_store(config).await?;

    let completed = !undo;
    if !orders::set_delivery_completed(&pool, order_num, completed).await? {
        anyhow::bail!("No stored order with number {order_num}");
    }

    let state = if completed { "completed" } else { "not completed" };
    println!("Order {} marked {}", order_num.to_string().bold(), state);

    Ok(())
}
