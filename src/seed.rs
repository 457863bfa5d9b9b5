//! Demo data for trying out the sync engine.
//!
//! The source and target stores get overlapping but independently keyed
//! copies of the same sales data, and the identity mapping is pre-filled
//! for the rows both sides share (products by SKU, customers by email).

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use identity_map::MappingStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sync_core::{EntityKind, EntityRow, EntityStore};
use tracing::info;

/// Seed of the order generator, shared by both stores.
pub const ORDER_RNG_SEED: u64 = 1234;

const PRODUCT_COUNT: i32 = 10;
const TARGET_PRODUCT_COUNT: usize = 6;
const SOURCE_CUSTOMER_COUNT: i32 = 5;
const TARGET_CUSTOMER_COUNT: i32 = 3;

/// Row counts after seeding, keyed by table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub source: BTreeMap<String, u64>,
    pub target: BTreeMap<String, u64>,
    pub mapping_rows: usize,
}

#[derive(Debug, Clone)]
struct SeededProduct {
    id: i32,
    sku: String,
    price: Decimal,
}

#[derive(Debug, Clone)]
struct SeededCustomer {
    id: i32,
    email: String,
}

/// Reset all three stores and fill them with demo data.
pub async fn seed_demo_data<S, T, M>(source: &S, target: &T, mappings: &M) -> Result<SeedSummary>
where
    S: EntityStore,
    T: EntityStore,
    M: MappingStore,
{
    mappings.reset().await.context("Failed to reset identity mappings")?;
    source.reset().await.context("Failed to reset source store")?;
    target.reset().await.context("Failed to reset target store")?;
    info!("Reset source, target and mapping stores");

    let source_products = seed_products(source, PRODUCT_COUNT as usize)
        .await
        .context("Failed to seed source products")?;
    let target_products = seed_products(target, TARGET_PRODUCT_COUNT)
        .await
        .context("Failed to seed target products")?;
    info!(
        "Seeded {} source and {} target products",
        source_products.len(),
        target_products.len()
    );

    let source_customers = seed_customers(source, SOURCE_CUSTOMER_COUNT)
        .await
        .context("Failed to seed source customers")?;
    let target_customers = seed_customers(target, TARGET_CUSTOMER_COUNT)
        .await
        .context("Failed to seed target customers")?;
    info!(
        "Seeded {} source and {} target customers",
        source_customers.len(),
        target_customers.len()
    );

    seed_orders(source, &source_customers, &source_products)
        .await
        .context("Failed to seed source orders")?;
    seed_orders(target, &target_customers, &target_products)
        .await
        .context("Failed to seed target orders")?;

    let product_rows = map_overlap(
        mappings,
        EntityKind::Product,
        source_products.iter().map(|p| (p.sku.as_str(), p.id)),
        target_products.iter().map(|p| (p.sku.as_str(), p.id)),
    )
    .await?;
    let customer_rows = map_overlap(
        mappings,
        EntityKind::Customer,
        source_customers.iter().map(|c| (c.email.as_str(), c.id)),
        target_customers.iter().map(|c| (c.email.as_str(), c.id)),
    )
    .await?;
    info!("Recorded {product_rows} product and {customer_rows} customer mappings");

    Ok(SeedSummary {
        source: table_counts(source).await?,
        target: table_counts(target).await?,
        mapping_rows: mappings.list().await?.len(),
    })
}

async fn seed_products<S: EntityStore>(store: &S, count: usize) -> Result<Vec<SeededProduct>> {
    let mut seeded = Vec::with_capacity(count);
    for i in (1..=PRODUCT_COUNT).take(count) {
        let sku = format!("SKU-{i:03}");
        let price = Decimal::from(10 + i);
        let row = EntityRow::new(EntityKind::Product)
            .with("sku", sku.as_str())
            .with("name", format!("Product {i}"))
            .with("price", price);
        let id = store.insert(&row).await?;
        seeded.push(SeededProduct { id, sku, price });
    }
    Ok(seeded)
}

async fn seed_customers<S: EntityStore>(store: &S, count: i32) -> Result<Vec<SeededCustomer>> {
    let mut seeded = Vec::new();
    for i in 1..=count {
        let email = format!("customer{i}@example.com");
        let customer = EntityRow::new(EntityKind::Customer)
            .with("name", format!("Customer {i}"))
            .with("email", email.as_str());
        let id = store.insert(&customer).await?;

        let addresses = [
            (format!("{i} Main St"), "Metropolis", "NY", format!("100{i:02}")),
            (format!("{i} Second Ave"), "Gotham", "NJ", format!("070{i:02}")),
        ];
        for (street, city, state, postal_code) in addresses {
            let address = EntityRow::new(EntityKind::Address)
                .with("customer_id", id)
                .with("street", street)
                .with("city", city)
                .with("state", state)
                .with("postal_code", postal_code);
            store.insert(&address).await?;
        }

        seeded.push(SeededCustomer { id, email });
    }
    Ok(seeded)
}

/// One or two orders per customer with one to three line items each.
async fn seed_orders<S: EntityStore>(
    store: &S,
    customers: &[SeededCustomer],
    products: &[SeededProduct],
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(ORDER_RNG_SEED);
    let mut orders = 0;
    let mut items = 0;

    for customer in customers {
        let order_count: usize = rng.random_range(1..3);
        for _ in 0..order_count {
            let days_ago: i64 = rng.random_range(1..120);
            let order = EntityRow::new(EntityKind::Order)
                .with("customer_id", customer.id)
                .with("order_date", Utc::now() - Duration::days(days_ago));
            let order_id = store.insert(&order).await?;
            orders += 1;

            let item_count: usize = rng.random_range(1..4);
            for _ in 0..item_count {
                let product = &products[rng.random_range(0..products.len())];
                let quantity: i32 = rng.random_range(1..5);
                let item = EntityRow::new(EntityKind::OrderLineItem)
                    .with("order_id", order_id)
                    .with("product_id", product.id)
                    .with("quantity", quantity)
                    .with("unit_price", product.price);
                store.insert(&item).await?;
                items += 1;
            }
        }
    }

    info!("Seeded {orders} orders with {items} line items");
    Ok(())
}

/// Map every target row whose natural key also exists in the source.
async fn map_overlap<'a, M: MappingStore>(
    mappings: &M,
    kind: EntityKind,
    source: impl Iterator<Item = (&'a str, i32)>,
    target: impl Iterator<Item = (&'a str, i32)>,
) -> Result<usize> {
    let source_ids: HashMap<&str, i32> = source.collect();
    let mut recorded = 0;
    for (natural_key, target_id) in target {
        if let Some(&source_id) = source_ids.get(natural_key) {
            mappings
                .upsert(kind.name(), source_id, target_id)
                .await
                .with_context(|| format!("Failed to map {kind} {natural_key}"))?;
            recorded += 1;
        }
    }
    Ok(recorded)
}

async fn table_counts<S: EntityStore>(store: &S) -> Result<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::ALL {
        counts.insert(kind.descriptor().table.to_string(), store.count(kind).await?);
    }
    Ok(counts)
}
