//! Passport lifecycle walkthrough
//!
//! Wires the service against the in-memory adapters and drives one battery
//! passport through create, public read, publish and a post-publish read,
//! printing each response as JSON.

use std::sync::Arc;

use passport_core::{OwnerId, Passport, PassportConfig, PassportError, PassportResult, Viewer};
use passport_schema::SchemaRegistry;
use passport_service::{init_tracing, PassportService, ServiceStores, TelemetryConfig};
use passport_storage::{
    BroadcastEventPublisher, InMemoryBlobStore, InMemoryCache, InMemoryIdempotencyStore,
    InMemoryRecordStore,
};
use serde_json::json;

#[tokio::main]
async fn main() -> PassportResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    if let Err(e) = init_tracing(&telemetry_config) {
        eprintln!("{}", e);
    }

    let config = PassportConfig::from_env();
    let schemas = Arc::new(SchemaRegistry::builtin().map_err(|e| PassportError::Internal {
        reason: e.to_string(),
    })?);

    let stores = ServiceStores {
        records: Arc::new(InMemoryRecordStore::new()),
        cache: Arc::new(InMemoryCache::new()),
        idempotency: Arc::new(InMemoryIdempotencyStore::new()),
        blobs: Arc::new(InMemoryBlobStore::new()),
        events: Arc::new(BroadcastEventPublisher::default()),
    };
    let service = PassportService::new(config, schemas, stores)?;

    let owner = OwnerId::from("mfg-1");
    let payload = serde_json::to_vec(&json!({
        "batteryModel": "PowerCell 9000",
        "chemistry": "LITHIUM_ION",
        "ratedCapacity": 100,
        "carbonFootprint": {"totalCarbonFootprint": 50.5, "shareOfRenewables": 90},
        "materialComposition": [{"material": "Lithium", "massPercentage": 5}],
        "disassemblyInstructions": {"steps": ["remove casing", "isolate cells"]}
    }))
    .map_err(|e| PassportError::Internal {
        reason: e.to_string(),
    })?;

    let created = service
        .create(&owner, "Acme Cells", "BATTERY_INDUSTRIAL", &payload)
        .await?;
    print_step("created", &created.passport)?;

    let replay = service
        .create(&owner, "Acme Cells", "BATTERY_INDUSTRIAL", &payload)
        .await?;
    println!(
        "replayed: {} (same id: {})",
        replay.replayed,
        replay.passport.passport_id == created.passport.passport_id
    );

    let id = created.passport.passport_id;
    let anonymous = Viewer::anonymous();
    print_step("public view", &service.get(id, &anonymous).await?)?;

    print_step("published", &service.publish(id).await?)?;
    service.drain().await;

    print_step("public view after publish", &service.get(id, &anonymous).await?)?;
    print_step(
        "owner view after publish",
        &service.get(id, &Viewer::authenticated(owner.clone())).await?,
    )?;

    match service.publish(id).await {
        Err(e) => println!("second publish: {} ({})", e.client_message(), e.code().http_status()),
        Ok(_) => println!("second publish unexpectedly succeeded"),
    }

    service.drain().await;
    Ok(())
}

fn print_step(label: &str, passport: &Passport) -> PassportResult<()> {
    let rendered = serde_json::to_string_pretty(passport).map_err(|e| PassportError::Internal {
        reason: e.to_string(),
    })?;
    println!("== {} ==\n{}", label, rendered);
    Ok(())
}
