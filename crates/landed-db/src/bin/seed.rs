//! # Seed Data Generator
//!
//! Populates the database with a demo shipment for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p landed-db --bin seed
//!
//! # Specify database path
//! cargo run -p landed-db --bin seed -- --db ./data/landed.db
//! ```
//!
//! ## Generated Data
//! One air shipment with:
//! - Freight (USD, with FX rate), insurance, brokerage, and packaging costs
//! - Three purchase items across the weight/value/unit spectrum
//! - Measured cartons for two items; the third item's carton carries no
//!   measurements, exercising the dimension fallback path
//! - Catalog products matching two SKUs (for cost history)

use chrono::Utc;
use rust_decimal_macros::dec;
use std::env;
use uuid::Uuid;

use landed_core::{
    CostType, Product, PurchaseItem, Shipment, ShipmentCarton, ShipmentCost, ShippingMode,
};
use landed_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./landed_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Landed Cost Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./landed_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Landed Cost Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let now = Utc::now();
    let consolidation_id = Uuid::new_v4().to_string();

    let shipment = Shipment {
        id: Uuid::new_v4().to_string(),
        shipment_number: format!("SHP-{}", now.format("%Y%m%d")),
        consolidation_id: Some(consolidation_id.clone()),
        shipping_mode: ShippingMode::Air,
        carrier: Some("DemoAir Cargo".to_string()),
        created_at: now,
        updated_at: now,
    };
    db.shipments().insert_shipment(&shipment).await?;
    println!("✓ Shipment {} ({})", shipment.shipment_number, shipment.id);

    // Cost lines: freight in USD with a rate, the rest already in base
    let costs = [
        (CostType::Freight, dec!(1200), "USD", Some(dec!(0.92)), dec!(1104)),
        (CostType::Insurance, dec!(85), "EUR", None, dec!(85)),
        (CostType::Brokerage, dec!(150), "EUR", None, dec!(150)),
        (CostType::Packaging, dec!(60), "EUR", None, dec!(60)),
    ];
    for (cost_type, amount, currency, fx, base) in costs {
        db.shipments()
            .insert_cost(&ShipmentCost {
                id: Uuid::new_v4().to_string(),
                shipment_id: shipment.id.clone(),
                cost_type,
                amount_original: amount,
                currency: currency.to_string(),
                fx_rate_used: fx,
                amount_base: base,
                volumetric_divisor: None,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} cost lines", costs.len());

    // Items: one heavy/cheap, one light/bulky, one with no physical data
    let items = [
        (
            "BOLT-M8",
            "Steel Bolts M8 (box)",
            10,
            dec!(12.50),
            Some((dec!(4.0), dec!(20), dec!(15), dec!(10))),
        ),
        (
            "PILLOW-STD",
            "Standard Pillows",
            40,
            dec!(8.00),
            Some((dec!(0.4), dec!(60), dec!(40), dec!(40))),
        ),
        ("MYSTERY-01", "Unspecified Sample Goods", 5, dec!(30.00), None),
    ];

    let mut item_ids = Vec::new();
    for (sku, name, qty, unit_price, physical) in items {
        let (weight, length, width, height) = match physical {
            Some((w, l, wd, h)) => (Some(w), Some(l), Some(wd), Some(h)),
            None => (None, None, None, None),
        };
        let item = PurchaseItem {
            id: Uuid::new_v4().to_string(),
            consolidation_id: Some(consolidation_id.clone()),
            sku: Some(sku.to_string()),
            name: name.to_string(),
            quantity: qty,
            unit_price: Some(unit_price),
            total_price: None,
            weight_kg: weight,
            length_cm: length,
            width_cm: width,
            height_cm: height,
            duty_rate_percent: Some(dec!(5)),
            hs_code: None,
            landing_cost_unit_base: None,
            created_at: now,
            updated_at: now,
        };
        db.shipments().insert_item(&item).await?;
        item_ids.push((sku, item.id.clone()));
    }
    println!("✓ {} purchase items", item_ids.len());

    // One carton per item; the third carries no measurements so the
    // calculation has to fall back to item-level estimates
    for (sku, item_id) in &item_ids {
        let measured = match *sku {
            "BOLT-M8" => Some((dec!(42), dec!(40), dec!(30), dec!(25))),
            "PILLOW-STD" => Some((dec!(18), dec!(120), dec!(80), dec!(80))),
            _ => None,
        };
        let (gross, l, w, h) = match measured {
            Some((g, l, w, h)) => (Some(g), Some(l), Some(w), Some(h)),
            None => (None, None, None, None),
        };
        db.shipments()
            .insert_carton(&ShipmentCarton {
                id: Uuid::new_v4().to_string(),
                shipment_id: shipment.id.clone(),
                purchase_item_id: item_id.clone(),
                gross_weight_kg: gross,
                length_cm: l,
                width_cm: w,
                height_cm: h,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} cartons (one unmeasured)", item_ids.len());

    // Catalog products for two of the SKUs
    for (sku, name) in [("BOLT-M8", "Steel Bolts M8"), ("PILLOW-STD", "Standard Pillow")] {
        db.products()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                sku: sku.to_string(),
                name: name.to_string(),
                created_at: now,
            })
            .await?;
    }
    println!("✓ 2 catalog products");

    println!();
    println!("✓ Seed complete! Shipment id: {}", shipment.id);

    Ok(())
}
