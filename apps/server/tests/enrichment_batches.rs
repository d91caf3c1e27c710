//! Batched reference lookups against an in-memory reference store

mod support;

use jeonse::{
    config::Config,
    db::{OfficetelPriceRow, UnitScope},
    models::PropertyType,
    services::{BatchStatus, UnitLookup},
};
use jeonse_keys::{SkipReason, UnitSummary};
use std::sync::Arc;
use std::time::Duration;
use support::*;

const GANGNAM: &str = "11680";
const DOGOK: &str = "도곡동";

#[tokio::test]
async fn appraisal_price_for_matching_key() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        apartment: vec![apartment_price("17", "3", "5", 84.97, 1_850_000_000.0)],
        ..Default::default()
    });
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97")];

    let batch = service.apartment_prices(GANGNAM, DOGOK, &rows).await?;

    assert_eq!(batch.status, BatchStatus::Resolved);
    let entry = batch.lookup(&rows[0]).expect("matched");
    assert_eq!(entry.price, 1_850_000_000);
    assert_eq!(entry.threshold_126, 2_331_000_000);

    match &store.calls()[..] {
        [ReferenceCall::Apartment { admin_code, keys }] => {
            assert_eq!(admin_code, "1168011800");
            assert_eq!(keys.len(), 1);
        }
        other => panic!("expected one appraisal query, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_rows_are_left_out_of_the_query() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        apartment: vec![
            apartment_price("17", "3", "5", 84.97, 900_000_000.0),
            apartment_price("18", "0", "2", 59.9, 600_000_000.0),
        ],
        ..Default::default()
    });
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![
        row(PropertyType::Apartment, GANGNAM, DOGOK, "12a-3", "5", "84.97"),
        row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97"),
        row(PropertyType::Apartment, GANGNAM, DOGOK, "18", "2", "59.90"),
    ];

    let batch = service.apartment_prices(GANGNAM, DOGOK, &rows).await?;

    assert_eq!(batch.skipped, vec![(0, SkipReason::NonDigitMainLot)]);
    assert_eq!(batch.entries.len(), 2);
    assert!(batch.lookup(&rows[0]).is_none());
    assert_eq!(batch.lookup(&rows[1]).map(|v| v.price), Some(900_000_000));
    assert_eq!(batch.lookup(&rows[2]).map(|v| v.price), Some(600_000_000));

    let [ReferenceCall::Apartment { keys, .. }] = &store.calls()[..] else {
        panic!("expected one appraisal query");
    };
    assert_eq!(keys.len(), 2);
    Ok(())
}

#[tokio::test]
async fn first_reference_row_wins_on_duplicate_keys() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        apartment: vec![
            apartment_price("17", "3", "5", 84.97, 1_000.0),
            apartment_price("0017", "0003", "5", 84.971, 2_000.0),
        ],
        ..Default::default()
    });
    let service = enrichment(store, &Config::default());
    let rows = vec![row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97")];

    let batch = service.apartment_prices(GANGNAM, DOGOK, &rows).await?;

    assert_eq!(batch.lookup(&rows[0]).map(|v| v.price), Some(1_000));
    assert_eq!(batch.ambiguous, 1);
    Ok(())
}

#[tokio::test]
async fn unknown_neighborhood_skips_the_batch() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore::default());
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![row(PropertyType::Villa, GANGNAM, "없는동", "1", "1", "40")];

    let prices = service.apartment_prices(GANGNAM, "없는동", &rows).await?;
    let units = service.unit_identities(GANGNAM, "없는동", &rows).await?;

    assert_eq!(prices.status, BatchStatus::AdminCodeNotFound);
    assert!(prices.entries.is_empty());
    assert_eq!(units.status, BatchStatus::AdminCodeNotFound);
    assert_eq!(units.summary_for(&rows[0]), UnitSummary::empty());
    assert!(store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn officetel_basement_standard_price() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        officetel: vec![OfficetelPriceRow {
            bunji: Some("22".into()),
            ho: Some("0".into()),
            floor_marker: Some("지하층".into()),
            floor_address: Some("1".into()),
            exclusive_area: Some(32.50),
            shared_area: Some(10.20),
            unit_price: Some(3_200_000.0),
        }],
        ..Default::default()
    });
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![row(PropertyType::Officetel, GANGNAM, DOGOK, "22", "-1", "32.50")];

    let batch = service.officetel_prices(GANGNAM, &rows).await?;

    let entry = batch.lookup(&rows[0]).expect("matched");
    assert!((entry.total_area - 42.70).abs() < 1e-9);
    assert_eq!(entry.standard_price, 136_640_000);
    assert_eq!(entry.threshold_126, 172_166_400);

    let [ReferenceCall::Officetel { district_code, .. }] = &store.calls()[..] else {
        panic!("expected one officetel query");
    };
    assert_eq!(district_code, GANGNAM);
    Ok(())
}

#[tokio::test]
async fn officetel_rows_with_non_numeric_floor_address_never_match() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        officetel: vec![OfficetelPriceRow {
            bunji: Some("22".into()),
            ho: Some("0".into()),
            floor_marker: Some("지상층".into()),
            floor_address: Some("3~4".into()),
            exclusive_area: Some(32.50),
            shared_area: Some(10.20),
            unit_price: Some(3_200_000.0),
        }],
        ..Default::default()
    });
    let service = enrichment(store, &Config::default());
    let rows = vec![row(PropertyType::Officetel, GANGNAM, DOGOK, "22", "3", "32.50")];

    let batch = service.officetel_prices(GANGNAM, &rows).await?;
    assert!(batch.entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn unit_labels_are_sorted_and_truncated() -> anyhow::Result<()> {
    let units = (1..=15)
        .map(|i| unit_row("0017", "0003", "20", "5", "84.97", Some("101동"), Some(format!("{:02}호", i).as_str())))
        .collect();
    let store = Arc::new(FakeReferenceStore {
        units,
        ..Default::default()
    });
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97")];

    let batch = service.unit_identities(GANGNAM, DOGOK, &rows).await?;
    let summary = batch.summary_for(&rows[0]);

    assert!(summary.has_more);
    assert_eq!(summary.all_units.len(), 15);
    let shown: Vec<String> = (1..=10).map(|i| format!("101동 {:02}호", i)).collect();
    assert_eq!(summary.display, format!("{} 외 5개", shown.join(", ")));

    let [ReferenceCall::Units { scope, keys, rows_per_key }] = &store.calls()[..] else {
        panic!("expected one unit query");
    };
    assert_eq!(
        scope,
        &UnitScope {
            district_code: GANGNAM.into(),
            neighborhood_part: "11800".into(),
        }
    );
    assert_eq!(keys[0].main, "0017");
    assert_eq!(keys[0].sub, "0003");
    assert_eq!(*rows_per_key, 100);
    Ok(())
}

#[tokio::test]
async fn crowded_key_does_not_crowd_out_its_batch_mates() -> anyhow::Result<()> {
    let mut units: Vec<_> = (1..=150)
        .map(|i| unit_row("0017", "0003", "20", "5", "84.97", Some("101동"), Some(format!("{:03}호", i).as_str())))
        .collect();
    units.extend(
        ["701호", "702호", "703호"]
            .into_iter()
            .map(|ho| unit_row("0022", "0000", "20", "7", "59.9", Some("201동"), Some(ho))),
    );
    let store = Arc::new(FakeReferenceStore {
        units,
        ..Default::default()
    });
    let service = enrichment(store.clone(), &Config::default());
    let crowded = row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97");
    let quiet = row(PropertyType::Apartment, GANGNAM, DOGOK, "22", "7", "59.9");

    let alone = service
        .unit_identities(GANGNAM, DOGOK, std::slice::from_ref(&quiet))
        .await?;
    let batch = service
        .unit_identities(GANGNAM, DOGOK, &[crowded.clone(), quiet.clone()])
        .await?;

    assert_eq!(batch.summary_for(&quiet), alone.summary_for(&quiet));
    assert_eq!(
        batch.summary_for(&quiet).all_units,
        vec!["201동 701호", "201동 702호", "201동 703호"]
    );
    assert_eq!(batch.summary_for(&crowded).all_units.len(), 100);

    for call in store.calls() {
        let ReferenceCall::Units { rows_per_key, .. } = call else {
            panic!("expected unit queries only");
        };
        assert_eq!(rows_per_key, 100);
    }
    Ok(())
}

#[tokio::test]
async fn unit_area_must_match_exactly() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        units: vec![unit_row("0017", "0003", "20", "5", "84.9", None, Some("502호"))],
        ..Default::default()
    });
    let service = enrichment(store, &Config::default());
    let rows = vec![row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97")];

    let batch = service.unit_identities(GANGNAM, DOGOK, &rows).await?;
    assert_eq!(batch.summary_for(&rows[0]), UnitSummary::empty());
    Ok(())
}

#[tokio::test]
async fn zero_unit_matches_give_the_empty_form() -> anyhow::Result<()> {
    let service = enrichment(Arc::new(FakeReferenceStore::default()), &Config::default());

    let lookup = service
        .unit_identity(GANGNAM, DOGOK, "17-3", "5", "84.97")
        .await?;

    assert_eq!(lookup, UnitLookup::NoMatch);
    let summary = lookup.summary();
    assert_eq!(summary.display, "-");
    assert!(summary.all_units.is_empty());
    assert!(!summary.has_more);
    Ok(())
}

#[tokio::test]
async fn statement_timeout_degrades_to_empty_units() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        units: vec![unit_row("0017", "0003", "20", "5", "84.97", None, Some("502호"))],
        unit_statement_timeout: true,
        ..Default::default()
    });
    let service = enrichment(store, &Config::default());

    let lookup = service
        .unit_identity(GANGNAM, DOGOK, "17-3", "5", "84.97")
        .await?;

    assert_eq!(lookup, UnitLookup::TimedOut);
    assert_eq!(lookup.summary(), UnitSummary::empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_unit_query_is_abandoned() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        units: vec![unit_row("0017", "0003", "20", "5", "84.97", None, Some("502호"))],
        unit_delay: Some(Duration::from_secs(60)),
        ..Default::default()
    });
    let mut config = Config::default();
    config.enrichment.unit_query_timeout_seconds = 2;
    let service = enrichment(store, &config);
    let rows = vec![row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97")];

    let batch = service.unit_identities(GANGNAM, DOGOK, &rows).await?;

    assert_eq!(batch.status, BatchStatus::TimedOut);
    assert_eq!(batch.summary_for(&rows[0]), UnitSummary::empty());
    Ok(())
}

#[tokio::test]
async fn unparsable_floor_is_reported_not_raised() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore::default());
    let service = enrichment(store.clone(), &Config::default());

    let lookup = service
        .unit_identity(GANGNAM, DOGOK, "17-3", "B1", "84.97")
        .await?;

    assert_eq!(lookup, UnitLookup::Skipped(SkipReason::UnparsableFloor));
    assert!(store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_batches_are_identical() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore {
        apartment: vec![
            apartment_price("17", "3", "5", 84.97, 1_850_000_000.0),
            apartment_price("17", "3", "5", 84.97, 1_900_000_000.0),
        ],
        units: vec![
            unit_row("0017", "0003", "20", "5", "84.97", Some("102동"), Some("502호")),
            unit_row("0017", "0003", "20", "5", "84.97", Some("101동"), Some("502호")),
        ],
        ..Default::default()
    });
    let service = enrichment(store, &Config::default());
    let rows = vec![
        row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97"),
        row(PropertyType::Apartment, GANGNAM, DOGOK, "x", "5", "84.97"),
    ];

    let first = service.enrich(rows.clone()).await?;
    let second = service.enrich(rows).await?;

    assert_eq!(first, second);
    assert_eq!(first[0].appraisal.map(|a| a.price), Some(1_850_000_000));
    assert_eq!(
        first[0].units.as_ref().map(|u| u.all_units.clone()),
        Some(vec!["101동 502호".to_string(), "102동 502호".to_string()])
    );
    assert!(first[1].appraisal.is_none());
    Ok(())
}

#[tokio::test]
async fn enrich_routes_each_type_to_its_table() -> anyhow::Result<()> {
    let store = Arc::new(FakeReferenceStore::default());
    let service = enrichment(store.clone(), &Config::default());
    let rows = vec![
        row(PropertyType::Apartment, GANGNAM, DOGOK, "17-3", "5", "84.97"),
        row(PropertyType::Villa, GANGNAM, DOGOK, "20", "2", "40.1"),
        row(PropertyType::Officetel, GANGNAM, "개포동", "22", "-1", "32.50"),
        row(PropertyType::SingleFamily, GANGNAM, DOGOK, "30", "1", "120"),
    ];

    let records = service.enrich(rows).await?;

    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.province == "서울" && r.district == "강남구"));
    assert!(records.iter().all(|r| r.units.is_some()));

    let calls = store.calls();
    let apartment_keys: usize = calls
        .iter()
        .filter_map(|c| match c {
            ReferenceCall::Apartment { keys, .. } => Some(keys.len()),
            _ => None,
        })
        .sum();
    let officetel_calls = calls
        .iter()
        .filter(|c| matches!(c, ReferenceCall::Officetel { .. }))
        .count();
    let unit_calls = calls
        .iter()
        .filter(|c| matches!(c, ReferenceCall::Units { .. }))
        .count();
    // apartment and villa share one (district, neighborhood) group
    assert_eq!(apartment_keys, 2);
    assert_eq!(officetel_calls, 1);
    // 도곡동 (apartment + villa) and 개포동 (officetel)
    assert_eq!(unit_calls, 2);
    Ok(())
}
