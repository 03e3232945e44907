//! End-to-end scenarios: client facade over the in-memory remote.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use clinistock_client::{FilterCoordinator, FilterMode, StockLedgerClient};
use clinistock_core::SupplyId;
use clinistock_events::InMemoryEventBus;
use clinistock_infra::{
    InMemoryRemote, InMemorySupplyCatalog, LedgerError, MovementLedger,
    RecordingNotifier, Severity, SupplyCatalogStore, SupplyEnvelope,
};
use clinistock_inventory::{
    FilterCriteria, MovementError, MovementRequest, StockHealth, Supply, SupplyCategory,
    SupplyDetails,
};

type Client = StockLedgerClient<
    Arc<InMemoryRemote>,
    Arc<InMemorySupplyCatalog>,
    Arc<InMemoryRemote>,
    Arc<InMemoryEventBus<SupplyEnvelope>>,
>;

struct Harness {
    client: Client,
    remote: Arc<InMemoryRemote>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn local_quantity(&self, id: &SupplyId) -> u32 {
        self.client.store().get(id).unwrap().quantity()
    }
}

fn supply(id: &str, name: &str, quantity: u32, minimum: u32) -> Supply {
    Supply::from_parts(
        SupplyId::new(id).unwrap(),
        SupplyDetails::new(name, SupplyCategory::Disposable, "pack")
            .with_thresholds(minimum, None)
            .with_unit_price(Decimal::new(199, 2)),
        quantity,
        Utc::now(),
    )
}

/// Client wired to an in-memory remote; the local store starts empty.
fn wire(supplies: Vec<Supply>) -> Harness {
    let remote = Arc::new(InMemoryRemote::with_supplies(supplies));
    let notifier = Arc::new(RecordingNotifier::new());

    let coordinator = FilterCoordinator::new(Arc::clone(&remote)).with_notifier(notifier.clone());
    let ledger = MovementLedger::builder(
        Arc::new(InMemorySupplyCatalog::new()),
        Arc::clone(&remote),
        Arc::new(InMemoryEventBus::new()),
    )
    .remote_history(remote.clone())
    .notifier(notifier.clone())
    .build();

    let client = StockLedgerClient::new(coordinator, ledger)
        .with_notifier(notifier.clone())
        .with_history_limit(10);

    Harness {
        client,
        remote,
        notifier,
    }
}

/// [`wire`], then load the local store with a forced refresh (one catalog query).
async fn harness(supplies: Vec<Supply>) -> Harness {
    let h = wire(supplies);
    h.client.force_refresh().await.unwrap();
    h
}

fn gauze_id() -> SupplyId {
    SupplyId::new("gauze-10cm").unwrap()
}

#[tokio::test]
async fn scenario_a_consumption_crosses_into_low_stock() {
    let h = harness(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 5)]).await;
    let id = gauze_id();

    let first = h
        .client
        .submit_movement(MovementRequest::consumption(id.clone(), 3, "ward 2 dressing"))
        .await
        .unwrap();
    assert_eq!(first.new_quantity(), 7);
    assert_eq!(first.health, StockHealth::Normal);
    assert!(h.notifier.with_severity(Severity::Warning).is_empty());

    let second = h
        .client
        .submit_movement(MovementRequest::consumption(id.clone(), 3, "ward 2 dressing"))
        .await
        .unwrap();
    assert_eq!(second.new_quantity(), 4);
    assert_eq!(second.health, StockHealth::LowStock);
    assert_eq!(
        h.notifier.with_severity(Severity::Warning),
        vec!["Sterile gauze 10cm is low on stock: 4 pack left (minimum 5)"]
    );
    assert_eq!(h.notifier.with_severity(Severity::Success).len(), 2);

    // The forced refresh after each write keeps the view in step with the store.
    let low = h
        .client
        .get_filtered_catalog(&FilterCriteria::all().with_health(StockHealth::LowStock))
        .await
        .unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].quantity(), 4);
    assert_eq!(h.local_quantity(&id), 4);
}

#[tokio::test]
async fn scenario_b_over_consumption_reports_the_shortfall() {
    let h = harness(vec![supply("gauze-10cm", "Sterile gauze 10cm", 4, 0)]).await;
    let id = gauze_id();

    let err = h
        .client
        .submit_movement(MovementRequest::consumption(id.clone(), 10, "theatre"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Movement(MovementError::InsufficientStock { requested: 10, available: 4 })
    ));
    assert_eq!(
        h.notifier.with_severity(Severity::Error),
        vec!["insufficient stock: requested 10, available 4"]
    );
    assert_eq!(h.local_quantity(&id), 4);
    assert!(h.client.ledger().journal().is_empty());
    assert_eq!(h.remote.persist_calls(), 0);
}

#[tokio::test]
async fn scenario_c_unreachable_catalog_falls_back_to_cache() {
    let mut supplies: Vec<Supply> = (0..19)
        .map(|i| {
            let name = if i % 5 == 0 {
                format!("Sterile gauze {i}")
            } else {
                format!("Item {i}")
            };
            supply(&format!("s-{i:02}"), &name, i, 3)
        })
        .collect();
    let mut pad = supply("s-19", "Dressing pad", 40, 3);
    let details = pad.details().clone().with_description("Cotton GAUZE pad, sterile");
    pad.update_details(details, Utc::now()).unwrap();
    supplies.push(pad);

    let h = harness(supplies).await;
    assert_eq!(h.client.coordinator().snapshot().unwrap().len(), 20);
    h.remote.set_available(false);

    let criteria = FilterCriteria::all().with_category(SupplyCategory::Disposable);
    let view = h.client.get_filtered_catalog(&criteria).await.unwrap();

    assert_eq!(view.len(), 20);
    assert_eq!(h.client.mode(), FilterMode::LocalFallback);
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
    assert_eq!(h.remote.catalog_queries(), 2);

    let gauze = h
        .client
        .get_filtered_catalog(&FilterCriteria::search("gauze"))
        .await
        .unwrap();
    let mut ids: Vec<_> = gauze.iter().map(|s| s.id_typed().to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["s-00", "s-05", "s-10", "s-15", "s-19"]);
    // Fallback reads never reach the remote.
    assert_eq!(h.remote.catalog_queries(), 2);

    let out = h
        .client
        .get_filtered_catalog(&FilterCriteria::all().with_health(StockHealth::OutOfStock))
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id_typed().as_str(), "s-00");
}

#[tokio::test]
async fn scenario_d_adjustment_to_zero_is_out_of_stock() {
    let h = harness(vec![supply("gauze-10cm", "Sterile gauze 10cm", 7, 2)]).await;
    let id = gauze_id();

    let result = h
        .client
        .submit_movement(MovementRequest::adjustment(id.clone(), 0, "batch recalled"))
        .await
        .unwrap();

    assert_eq!(result.movement.previous_quantity(), 7);
    assert_eq!(result.new_quantity(), 0);
    assert_eq!(h.client.get_health_state(&result.supply), StockHealth::OutOfStock);
    assert_eq!(
        h.notifier.with_severity(Severity::Warning),
        vec!["Sterile gauze 10cm is out of stock"]
    );

    let report = h.client.stock_report();
    assert_eq!(report.out_of_stock, 1);
    assert_eq!(report.alerts[0].supply_id, id);
}

#[tokio::test]
async fn write_with_remote_down_has_no_partial_effect() {
    let h = harness(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 0)]).await;
    let id = gauze_id();
    h.remote.set_available(false);

    let err = h
        .client
        .submit_movement(MovementRequest::receipt(id.clone(), 5, "delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Transport(_)));
    assert_eq!(h.local_quantity(&id), 10);
    assert!(h.client.ledger().journal().is_empty());
    assert_eq!(h.notifier.with_severity(Severity::Error).len(), 1);
}

#[tokio::test]
async fn successful_write_brings_fallback_back_to_server_mode() {
    let h = harness(vec![
        supply("gauze-10cm", "Sterile gauze 10cm", 10, 0),
        supply("tape", "Surgical tape", 3, 0),
    ])
    .await;

    h.remote.set_available(false);
    h.client.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
    assert_eq!(h.client.mode(), FilterMode::LocalFallback);

    h.remote.set_available(true);
    h.client
        .submit_movement(MovementRequest::receipt(gauze_id(), 2, "delivery"))
        .await
        .unwrap();

    assert_eq!(h.client.mode(), FilterMode::ServerAuthoritative);
    let snapshot = h.client.coordinator().snapshot().unwrap();
    let gauze = snapshot
        .supplies
        .iter()
        .find(|s| s.id_typed() == &gauze_id())
        .unwrap();
    assert_eq!(gauze.quantity(), 12);
}

#[tokio::test]
async fn history_survives_an_unreachable_remote() {
    let h = harness(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 0)]).await;
    let id = gauze_id();

    h.client
        .submit_movement(MovementRequest::receipt(id.clone(), 5, "delivery"))
        .await
        .unwrap();
    h.client
        .submit_movement(MovementRequest::consumption(id.clone(), 4, "ward"))
        .await
        .unwrap();

    let remote = h.client.get_history(&id).await.unwrap();
    assert_eq!(remote.len(), 2);
    assert_eq!(remote[0].new_quantity(), 11);

    h.remote.set_available(false);
    let local = h.client.get_history(&id).await.unwrap();
    let snapshots: Vec<_> = local
        .iter()
        .map(|m| (m.previous_quantity(), m.new_quantity()))
        .collect();
    assert_eq!(snapshots, vec![(15, 11), (10, 15)]);
}

#[tokio::test]
async fn listed_supply_accepts_movement_without_explicit_refresh() {
    let h = wire(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 2)]);
    let id = gauze_id();

    let listed = h.client.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(h.local_quantity(&id), 10);

    let result = h
        .client
        .submit_movement(MovementRequest::consumption(id.clone(), 3, "ward 4"))
        .await
        .unwrap();

    assert_eq!(result.new_quantity(), 7);
    assert_eq!(h.local_quantity(&id), 7);
    // One listing, one resync after the write; no extra load before it.
    assert_eq!(h.remote.catalog_queries(), 2);
}

#[tokio::test]
async fn movement_on_fresh_client_loads_catalog_first() {
    let h = wire(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 2)]);
    let id = gauze_id();

    let result = h
        .client
        .submit_movement(MovementRequest::receipt(id.clone(), 4, "delivery"))
        .await
        .unwrap();

    assert_eq!(result.movement.previous_quantity(), 10);
    assert_eq!(h.local_quantity(&id), 14);
    assert_eq!(h.remote.persist_calls(), 1);
}

#[tokio::test]
async fn unknown_supply_is_still_not_found_after_catalog_load() {
    let h = wire(vec![supply("gauze-10cm", "Sterile gauze 10cm", 10, 2)]);
    let ghost = SupplyId::new("ghost").unwrap();

    let err = h
        .client
        .submit_movement(MovementRequest::receipt(ghost.clone(), 1, "delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Movement(MovementError::SupplyNotFound(id)) if id == ghost));
    assert_eq!(h.remote.catalog_queries(), 1);
    assert_eq!(h.remote.persist_calls(), 0);
}
