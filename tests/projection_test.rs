// ==========================================
// Projection - end-to-end tests
// ==========================================
// AppState -> import -> projection run -> reload / list / delete
// ==========================================


use rust_decimal::Decimal;
use sales_projection::app::AppState;
use sales_projection::config::config_keys;
use sales_projection::domain::{Period, ProjectionMethod};
use sales_projection::engine::FORECAST_HORIZON_MONTHS;
use sales_projection::logging;
use test_helpers::{create_test_db, csv, csv_for_year};

fn setup_state() -> (tempfile::NamedTempFile, AppState) {
    let (tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    state.history_api.create_company(1, "Comercial Andina").unwrap();
    (tmp, state)
}

async fn import_rising_year(state: &AppState) {
    state
        .import_api
        .import_upload(1, "ventas_2024.csv", &csv_for_year(2024, 1..=12, 100_000, 5_000))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rising_series_projects_the_trend() {
    logging::init_test();
    let (_tmp, state) = setup_state();
    import_rising_year(&state).await;

    let run = state
        .projection_api
        .run_projection(1, Some("presupuesto 2025"))
        .await
        .unwrap();

    assert_eq!(run.company_id, 1);
    assert_eq!(run.base_period, Period::new(2024, 12).unwrap());
    assert_eq!(run.history_points, 12);
    assert_eq!(run.forecasts.len(), 3);

    for forecast in &run.forecasts {
        assert_eq!(forecast.points.len(), 12);
        assert_eq!(forecast.points[0].period, Period::new(2025, 1).unwrap());
        assert_eq!(forecast.points[11].period, Period::new(2025, 12).unwrap());
        for pair in forecast.points.windows(2) {
            assert!(pair[1].amount > pair[0].amount, "{:?} not rising", forecast.method);
        }
    }

    let by_method = |method: ProjectionMethod| {
        run.forecasts
            .iter()
            .find(|f| f.method == method)
            .unwrap()
            .points
            .clone()
    };

    let least_squares = by_method(ProjectionMethod::LeastSquares);
    assert_eq!(least_squares[0].amount, Decimal::new(160_000, 0));
    assert_eq!(least_squares[11].amount, Decimal::new(215_000, 0));

    // average delta is exactly 5000, so the additive method matches the fit
    let absolute = by_method(ProjectionMethod::AbsoluteGrowth);
    assert_eq!(absolute, least_squares);

    // compounding the average monthly rate grows faster than the straight line
    let percent = by_method(ProjectionMethod::PercentGrowth);
    assert!(percent[0].amount > Decimal::new(155_000, 0));
    assert!(percent[11].amount > least_squares[11].amount);
}

#[tokio::test]
async fn test_run_can_be_reloaded_listed_and_deleted() {
    let (_tmp, state) = setup_state();
    import_rising_year(&state).await;

    let first = state.projection_api.run_projection(1, None).await.unwrap();
    let second = state
        .projection_api
        .run_projection(1, Some("  segunda  "))
        .await
        .unwrap();
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(second.description.as_deref(), Some("segunda"));

    let reloaded = state.projection_api.get_run(&first.run_id).await.unwrap();
    assert_eq!(reloaded.forecasts, first.forecasts);
    assert_eq!(reloaded.description, None);

    let runs = state.projection_api.list_runs(1).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, second.run_id);

    state.projection_api.delete_run(&first.run_id).await.unwrap();
    let err = state.projection_api.get_run(&first.run_id).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(state.projection_api.list_runs(1).await.unwrap().len(), 1);

    let err = state
        .projection_api
        .delete_run(&first.run_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_history_changes_do_not_touch_existing_runs() {
    let (_tmp, state) = setup_state();
    import_rising_year(&state).await;

    let run = state.projection_api.run_projection(1, None).await.unwrap();

    state
        .import_api
        .import_upload(1, "correccion.csv", &csv(&["2024;12;1", "2025;1;2"]))
        .await
        .unwrap();

    let reloaded = state.projection_api.get_run(&run.run_id).await.unwrap();
    assert_eq!(reloaded.forecasts, run.forecasts);
    assert_eq!(reloaded.base_period, Period::new(2024, 12).unwrap());
}

#[tokio::test]
async fn test_insufficient_history() {
    let (_tmp, state) = setup_state();

    let err = state.projection_api.run_projection(1, None).await.unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_DATA");

    state
        .import_api
        .import_upload(1, "uno.csv", &csv(&["2024;1;100"]))
        .await
        .unwrap();
    let err = state.projection_api.run_projection(1, None).await.unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_DATA");

    assert!(state.projection_api.list_runs(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_minimum_history_from_config_and_fixed_horizon() {
    let (_tmp, state) = setup_state();
    state
        .import_api
        .import_upload(1, "tres.csv", &csv(&["2024;1;100", "2024;2;110", "2024;3;120"]))
        .await
        .unwrap();

    // leftover key from older setups has no effect on the horizon
    state
        .config
        .set_config_value("projection.horizon_months", "1000000000")
        .unwrap();
    let run = state.projection_api.run_projection(1, None).await.unwrap();
    assert!(run
        .forecasts
        .iter()
        .all(|f| f.points.len() == FORECAST_HORIZON_MONTHS as usize));

    state
        .config
        .set_config_value(config_keys::PROJECTION_MIN_HISTORY_POINTS, "4")
        .unwrap();
    let err = state.projection_api.run_projection(1, None).await.unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_DATA");
}

#[tokio::test]
async fn test_unknown_company_and_cascade_delete() {
    let (_tmp, state) = setup_state();

    let err = state.projection_api.run_projection(7, None).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    import_rising_year(&state).await;
    let run = state.projection_api.run_projection(1, None).await.unwrap();

    state.history_api.delete_company(1).unwrap();
    let err = state.projection_api.get_run(&run.run_id).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert!(state.history_api.list_companies().unwrap().is_empty());
}

#[tokio::test]
async fn test_response_serializes_flat_points() {
    let (_tmp, state) = setup_state();
    import_rising_year(&state).await;

    let run = state.projection_api.run_projection(1, None).await.unwrap();
    let json = serde_json::to_value(&run).unwrap();

    assert!(json["runId"].is_string());
    assert_eq!(json["basePeriod"]["month"], 12);
    let point = &json["forecasts"][0]["points"][0];
    assert_eq!(point["year"], 2025);
    assert_eq!(point["month"], 1);
    assert!(point.get("amount").is_some());
    assert!(json.get("description").is_none());
}
