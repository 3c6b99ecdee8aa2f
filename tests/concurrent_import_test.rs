// ==========================================
// Concurrent import tests
// ==========================================
// Same company: serialized, continuity never sees a stale snapshot
// Different companies: independent, may run in parallel
// ==========================================


use sales_projection::app::AppState;
use sales_projection::config::ConfigManager;
use sales_projection::importer::{SalesImporter, SalesImporterImpl};
use sales_projection::logging;
use sales_projection::repository::{SalesHistoryRepository, SalesHistoryRepositoryImpl};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use test_helpers::{create_test_db, create_test_db_with_companies, csv_for_year, insert_companies};

fn create_shared_importer(
    db_path: &str,
) -> Arc<SalesImporterImpl<SalesHistoryRepositoryImpl, ConfigManager>> {
    let repo = SalesHistoryRepositoryImpl::new(db_path).expect("Failed to create repo");
    let config = ConfigManager::new(db_path).expect("Failed to create config");
    Arc::new(SalesImporterImpl::new(repo, config))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_company_imports_are_serialized() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db_with_companies().unwrap();
    let importer = create_shared_importer(&db_path);
    let content = csv_for_year(2024, 1..=12, 10_000, 250);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let importer = importer.clone();
            let content = content.clone();
            tokio::spawn(async move {
                importer
                    .import_bytes(1, &format!("copia_{}.csv", i), &content)
                    .await
            })
        })
        .collect();

    let mut inserted = 0;
    let mut updated = 0;
    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        inserted += summary.inserted_count;
        updated += summary.updated_count;
    }

    // exactly one import saw the empty store
    assert_eq!(inserted, 12);
    assert_eq!(updated, 36);
    assert_eq!(importer.history_repo().count_records(1).await.unwrap(), 12);
    assert!(importer.history_repo().find_gaps(1).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_companies_run_in_parallel() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let ids: Vec<i64> = (1..=5).collect();
    insert_companies(&db_path, &ids).unwrap();
    let importer = create_shared_importer(&db_path);

    let start = Instant::now();
    let handles: Vec<_> = ids
        .iter()
        .map(|&company_id| {
            let importer = importer.clone();
            let content = csv_for_year(2020 + company_id as i32, 1..=12, 1_000, 10);
            tokio::spawn(async move {
                importer
                    .import_bytes(company_id, "anual.csv", &content)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.inserted_count, 12);
    }
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "parallel imports done");

    for company_id in ids {
        let series = importer.history_repo().fetch_series(company_id).await.unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].year, 2020 + company_id as i32);
    }
}

#[tokio::test]
async fn test_batch_import_reports_each_entry() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    state.history_api.create_company(1, "Norte").unwrap();
    state.history_api.create_company(2, "Sur").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let good_path = dir.path().join("norte.csv");
    let mut good = std::fs::File::create(&good_path).unwrap();
    good.write_all(&csv_for_year(2024, 1..=3, 100, 10)).unwrap();

    let gap_path = dir.path().join("sur.csv");
    let mut gap = std::fs::File::create(&gap_path).unwrap();
    gap.write_all(b"Anio;Mes;Monto_Venta\n2024;1;100\n2024;3;300\n")
        .unwrap();

    let missing_path = dir.path().join("no_existe.csv");

    let results = state
        .import_api
        .batch_import(vec![
            (1, good_path),
            (2, gap_path),
            (3, missing_path),
        ])
        .await;

    assert_eq!(results.len(), 3);

    assert_eq!(results[0].company_id, 1);
    assert_eq!(results[0].result.as_ref().unwrap().inserted_count, 3);
    assert!(results[0].error.is_none());

    let gap_error = results[1].error.as_ref().unwrap();
    assert_eq!(gap_error.code, "CONTINUITY_ERROR");
    assert!(results[1].result.is_none());

    let missing_error = results[2].error.as_ref().unwrap();
    assert_eq!(missing_error.code, "FILE_FORMAT_ERROR");

    let series = state.history_api.get_series(2).await.unwrap();
    assert!(series.records.is_empty());
}
