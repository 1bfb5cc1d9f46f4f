use anyhow::Result;
use chrono::{Duration, Utc};
use log::*;
use orderflow_common::Amount;
use orderflow_engine::{
    db_types::{ItemId, NewOrder, OrderId, OrderStatusType, StatusTransition},
    OrderManagement,
    SqliteDatabase,
};
use rand::{seq::SliceRandom, Rng};

use crate::{setup::create_database_if_not_exist, SeedParams};

struct CatalogueItem {
    id: &'static str,
    price: Amount,
}

const CATALOGUE: [CatalogueItem; 5] = [
    CatalogueItem { id: "ITEM001", price: Amount::from_cents(99_999) },
    CatalogueItem { id: "ITEM002", price: Amount::from_cents(69_999) },
    CatalogueItem { id: "ITEM003", price: Amount::from_cents(19_999) },
    CatalogueItem { id: "ITEM004", price: Amount::from_cents(49_999) },
    CatalogueItem { id: "ITEM005", price: Amount::from_cents(29_999) },
];

/// A random order, placed between one and four days ago.
fn sample_order(rng: &mut impl Rng) -> NewOrder {
    let count = rng.gen_range(1..=3);
    let items = CATALOGUE.choose_multiple(rng, count).collect::<Vec<_>>();
    let item_ids = items.iter().map(|item| ItemId::Text(item.id.to_string())).collect();
    let total = items.iter().map(|item| item.price).sum();
    let order_id = format!("ORD-{:08X}", rng.gen::<u32>());
    let user_id = format!("USER{:03}", rng.gen_range(1..=5));
    let created_at = Utc::now() - Duration::hours(rng.gen_range(25..=96)) - Duration::seconds(rng.gen_range(0..3600));
    NewOrder::new(OrderId::from(order_id), user_id, item_ids, total).with_created_at(created_at)
}

/// Inserts a sample order and, depending on the status drawn for it, walks it forward with plausible timestamps:
/// processing starts 1-24 hours after the order was placed, and takes 1-60 seconds.
async fn seed_order(db: &SqliteDatabase, rng: &mut impl Rng) -> Result<OrderStatusType> {
    let order = db.insert_order(sample_order(rng)).await?;
    let status = *OrderStatusType::ALL.choose(rng).unwrap_or(&OrderStatusType::Pending);
    if status == OrderStatusType::Pending {
        return Ok(status);
    }
    let started = order.created_at + Duration::hours(rng.gen_range(1..=24));
    db.update_order_status(&order.order_id, StatusTransition::StartProcessing { at: started }).await?;
    if status == OrderStatusType::Completed {
        let at = started + Duration::seconds(rng.gen_range(1..=60));
        db.update_order_status(&order.order_id, StatusTransition::Complete { at }).await?;
    }
    trace!("Seeded order {} as {status}", order.order_id);
    Ok(status)
}

pub async fn seed_orders(params: SeedParams) {
    async fn seed(count: usize) -> Result<usize> {
        create_database_if_not_exist().await?;
        let db = SqliteDatabase::new(1).await?;
        db.run_migrations().await?;
        let mut rng = rand::thread_rng();
        let mut created = 0;
        for _ in 0..count {
            match seed_order(&db, &mut rng).await {
                Ok(_) => created += 1,
                Err(e) => warn!("Could not create a sample order. {e}"),
            }
        }
        db.close().await;
        Ok(created)
    }

    match seed(params.count).await {
        Ok(n) => println!("Successfully created {n} sample orders"),
        Err(e) => println!("Error creating sample orders: {e}"),
    }
}
