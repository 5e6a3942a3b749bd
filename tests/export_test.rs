// ==========================================
// CSV 导出集成测试
// ==========================================

mod test_helpers;

use container_flow_gen::engine::ContainerFlowGenerationService;
use container_flow_gen::export::export_container_flow;
use container_flow_gen::storage::PipelineMode;
use test_helpers::*;

#[test]
fn test_export_writes_one_row_per_entity() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let repos = seed_schedules(&conn);

    let mut service = ContainerFlowGenerationService::with_mode(test_config(42), conn, PipelineMode::Direct);
    service.generate().unwrap();

    let folder = tempfile::tempdir().unwrap();
    let files = export_container_flow(&repos, &folder.path().join("flow")).unwrap();
    assert_eq!(files.len(), 3);

    let expected = [
        repos.container_repo.count_all().unwrap(),
        repos.vehicle_repo.count_all().unwrap(),
        repos.truck_repo.count_all().unwrap(),
    ];
    for (file, expected_rows) in files.iter().zip(expected) {
        assert!(file.exists(), "{} 未生成", file.display());
        let mut reader = csv::Reader::from_path(file).unwrap();
        assert_eq!(reader.records().count() as u64, expected_rows, "{}", file.display());
    }

    let mut reader = csv::Reader::from_path(&files[0]).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "delivered_by"));
    assert!(headers.iter().any(|h| h == "picked_up_by_initial"));
}
