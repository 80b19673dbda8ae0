// ==========================================
// 保养计划导入集成测试
// ==========================================
// 覆盖: 纯管道场景 + 导入器落库/重新导入/失败不落库
// ==========================================

use fleet_maintenance::config::ImportConfig;
use fleet_maintenance::domain::{Plan, PlanIdentity};
use fleet_maintenance::importer::{
    CellGrid, ImportError, ImportWarning, ScheduleImporter, SchedulePipeline,
};
use fleet_maintenance::logging;
use fleet_maintenance::repository::PlanRepository;

use test_helpers::*;

fn pipeline() -> SchedulePipeline {
    SchedulePipeline::new(ImportConfig::default()).expect("默认配置应当有效")
}

fn identity() -> PlanIdentity {
    PlanIdentity::new("CAMION", "Plan base")
}

fn interval_id(plan: &Plan, order: u32) -> String {
    plan.interval_by_order(order)
        .unwrap_or_else(|| panic!("缺少第 {} 个区间", order))
        .interval_id
        .clone()
}

// ==========================================
// 纯管道
// ==========================================

#[test]
fn test_scenario_a_three_intervals_one_activity() {
    logging::init_test();

    let outcome = pipeline().run(&scenario_a_grid(), &identity()).unwrap();
    let plan = &outcome.plan;

    assert_eq!(plan.intervals.len(), 3);
    let hours: Vec<f64> = plan.intervals.iter().map(|i| i.hours).collect();
    let kms: Vec<f64> = plan.intervals.iter().map(|i| i.kilometers).collect();
    assert_eq!(hours, vec![100.0, 200.0, 300.0]);
    assert_eq!(kms, vec![1000.0, 2000.0, 3000.0]);

    assert_eq!(plan.activities.len(), 1);
    let activity = &plan.activities[0];
    assert_eq!(activity.code, "A.1");
    assert_eq!(activity.category, "A");
    assert_eq!(activity.description, "Check oil");

    assert!(plan.applies(&activity.activity_id, &interval_id(plan, 1)));
    assert!(!plan.applies(&activity.activity_id, &interval_id(plan, 2)));
    assert!(plan.applies(&activity.activity_id, &interval_id(plan, 3)));
    // 稀疏: 只保存 true
    assert_eq!(plan.matrix.len(), 2);

    assert!(outcome.warnings.is_empty(), "意外提示: {:?}", outcome.warnings);
}

#[test]
fn test_scenario_b_unparsable_column_discarded_and_marks_reindexed() {
    let outcome = pipeline().run(&scenario_b_grid(), &identity()).unwrap();
    let plan = &outcome.plan;

    assert_eq!(plan.intervals.len(), 2);
    assert_eq!(plan.intervals[0].hours, 200.0);
    assert_eq!(plan.intervals[0].sequence_order, 1);
    assert_eq!(plan.intervals[1].hours, 300.0);
    assert_eq!(plan.intervals[1].sequence_order, 2);

    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        ImportWarning::DiscardedInvalidIntervalColumn { column: 3, .. }
    )));

    let activity = &plan.activities[0];
    assert!(!plan.applies(&activity.activity_id, &interval_id(plan, 1)));
    assert!(plan.applies(&activity.activity_id, &interval_id(plan, 2)));
    assert_eq!(plan.matrix.len(), 1);
}

#[test]
fn test_scenario_c_duplicate_code_is_fatal_with_row() {
    let err = pipeline().run(&scenario_c_grid(), &identity()).unwrap_err();

    assert_eq!(err.code(), "DuplicateActivityCodeError");
    match err {
        ImportError::DuplicateActivityCode {
            code,
            first_row,
            row,
            column,
        } => {
            assert_eq!(code, "B.1");
            assert_eq!(first_row, 4);
            assert_eq!(row, 5);
            assert_eq!(column, 1);
        }
        other => panic!("意外错误: {:?}", other),
    }
}

#[test]
fn test_multi_category_sheet_with_title_row_and_gap() {
    let outcome = pipeline().run(&multi_category_grid(), &identity()).unwrap();
    let plan = &outcome.plan;

    // 千分位按 DECIMAL_COMMA 解析
    let hours: Vec<f64> = plan.intervals.iter().map(|i| i.hours).collect();
    assert_eq!(hours, vec![250.0, 500.0, 1000.0]);
    assert_eq!(plan.intervals[2].kilometers, 20000.0);

    let codes: Vec<&str> = plan.activities.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["A.1", "A.2", "B.1", "B.2"]);
    let categories: Vec<&str> = plan.activities.iter().map(|a| a.category.as_str()).collect();
    assert_eq!(categories, vec!["A", "A", "B", "B"]);

    // B.2 没有任何标记
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, ImportWarning::UnusedActivity { code, row: 10 } if code == "B.2")));
    let b2 = plan.activity_by_code("B.2").unwrap();
    assert_eq!(plan.matrix.count_for_activity(&b2.activity_id), 0);
}

#[test]
fn test_sequence_order_follows_column_order() {
    let outcome = pipeline().run(&multi_category_grid(), &identity()).unwrap();
    let orders: Vec<u32> = outcome
        .plan
        .intervals
        .iter()
        .map(|i| i.sequence_order)
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[test]
fn test_zero_surviving_intervals_is_empty_schedule() {
    let grid = CellGrid::from_text_rows(&[
        vec!["", "", "1.5h", "abc"],
        vec!["", "", "1000km", "2000km"],
        vec!["A", "", "", ""],
        vec!["A.1", "Check oil", "√", "√"],
    ]);
    let err = pipeline().run(&grid, &identity()).unwrap_err();
    assert_eq!(err.code(), "EmptyScheduleError");
}

#[test]
fn test_ambiguous_mark_counts_as_applies() {
    let mut rows = scenario_a_rows();
    rows[3][3] = "OK?";
    let outcome = pipeline()
        .run(&CellGrid::from_text_rows(&rows), &identity())
        .unwrap();
    let plan = &outcome.plan;
    let activity = &plan.activities[0];

    assert!(plan.applies(&activity.activity_id, &interval_id(plan, 2)));
    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        ImportWarning::AmbiguousMarkNormalizedToApplies { row: 4, column: 4, .. }
    )));
}

#[test]
fn test_non_monotonic_hours_rejected_with_cell() {
    let grid = CellGrid::from_text_rows(&[
        vec!["", "", "100h", "300h", "200h"],
        vec!["", "", "1000km", "2000km", "3000km"],
        vec!["A", "", "", "", ""],
        vec!["A.1", "Check oil", "√", "", "√"],
    ]);
    let err = pipeline().run(&grid, &identity()).unwrap_err();
    assert_eq!(err.code(), "NonMonotonicIntervalsError");
    let location = err.location().unwrap();
    assert_eq!(location.row, Some(1));
    assert_eq!(location.column, Some(5));
}

// ==========================================
// 导入器（含落库）
// ==========================================

#[tokio::test]
async fn test_import_grid_persists_plan() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    let result = importer
        .import_grid(&scenario_a_grid(), &identity())
        .await
        .unwrap();
    assert_eq!(result.intervals_count, 3);
    assert_eq!(result.activities_count, 1);

    let stored = importer
        .plan_repo()
        .find_by_id(&result.plan_id)
        .unwrap()
        .expect("计划应当已落库");
    assert_eq!(stored.revision, 1);
    assert!(stored.is_active);
    assert_eq!(stored.vehicle_type, "CAMION");
    assert_eq!(stored.matrix.len(), 2);
}

#[tokio::test]
async fn test_reimport_keeps_identity_and_replaces_structure() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    let first = importer
        .import_grid(&scenario_a_grid(), &identity())
        .await
        .unwrap();
    let second = importer
        .import_grid(&multi_category_grid(), &identity())
        .await
        .unwrap();

    assert_eq!(first.plan_id, second.plan_id);

    let stored = importer
        .plan_repo()
        .find_by_identity(&identity())
        .unwrap()
        .unwrap();
    assert_eq!(stored.revision, 2);
    assert_eq!(stored.intervals.len(), 3);
    assert_eq!(stored.activities.len(), 4);
    assert!(stored.activity_by_code("B.1").is_some());
}

#[tokio::test]
async fn test_failed_import_leaves_prior_revision_untouched() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    importer
        .import_grid(&scenario_a_grid(), &identity())
        .await
        .unwrap();
    let before = importer
        .plan_repo()
        .find_by_identity(&identity())
        .unwrap()
        .unwrap();

    let err = importer
        .import_grid(&scenario_c_grid(), &identity())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DuplicateActivityCodeError");

    let after = importer
        .plan_repo()
        .find_by_identity(&identity())
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_import_csv_file() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);
    let csv = write_csv(&multi_category_rows());

    let result = importer
        .import_from_file(csv.path(), &identity())
        .await
        .unwrap();
    assert_eq!(result.intervals_count, 3);
    assert_eq!(result.activities_count, 4);
    assert_eq!(result.warnings.len(), 1);
}

#[tokio::test]
async fn test_unsupported_extension_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);
    let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();

    let err = importer
        .import_from_file(file.path(), &identity())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_csv_empty_lines_end_table_before_footer() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);
    let csv = write_csv(&[
        vec!["", "", "100h", "200h"],
        vec!["", "", "1000km", "2000km"],
        vec!["A", "Motor"],
        vec!["A.1", "Oil", "x"],
        vec![],
        vec![],
        vec![],
        vec!["A.9", "Footer note", "", "x"],
    ]);

    let result = importer
        .import_from_file(csv.path(), &identity())
        .await
        .unwrap();
    assert_eq!(result.activities_count, 1);

    let stored = importer.plan_repo().find_by_id(&result.plan_id).unwrap().unwrap();
    assert!(stored.activity_by_code("A.9").is_none());
}

#[tokio::test]
async fn test_oversized_csv_rejected_before_persisting() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    fleet_maintenance::config::ConfigManager::new(&db_path)
        .unwrap()
        .set_config_value(fleet_maintenance::config::config_keys::MAX_ROWS, "3")
        .unwrap();
    let importer = create_importer(&db_path);
    let csv = write_csv(&scenario_a_rows());

    let err = importer
        .import_from_file(csv.path(), &identity())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::ScheduleTooLarge { rows: 4, .. }));
    assert!(importer.plan_repo().list_summaries().unwrap().is_empty());
}
