// ==========================================
// 清理历史流量集成测试
// ==========================================

mod test_helpers;

use container_flow_gen::domain::container::Container;
use container_flow_gen::domain::types::{ContainerLength, ModeOfTransport, StorageRequirement};
use container_flow_gen::domain::vehicle::{ScheduledVehicle, Truck};
use container_flow_gen::engine::ContainerFlowGenerationService;
use container_flow_gen::storage::PipelineMode;
use test_helpers::*;

fn prior_container(vehicle_id: i64, truck_id: i64) -> Container {
    Container {
        id: 0,
        length: ContainerLength::TwentyFeet,
        weight_t: 12.0,
        storage_requirement: StorageRequirement::Standard,
        delivered_by: ModeOfTransport::Feeder,
        delivered_by_vehicle: Some(vehicle_id),
        delivered_by_truck: None,
        picked_up_by: ModeOfTransport::Truck,
        picked_up_by_initial: ModeOfTransport::Truck,
        picked_up_by_vehicle: None,
        picked_up_by_truck: Some(truck_id),
        destination: None,
    }
}

#[test]
fn test_clear_previous_state_removes_generated_flow() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let repos = seed_schedules(&conn);
    let schedule = repos.schedule_repo.find_by_vehicle_type(ModeOfTransport::Feeder).unwrap()[0].clone();

    // 10 个实例，每个 50 只箱，每只箱一辆进口集卡
    for i in 0..10 {
        let vehicle_id = repos
            .vehicle_repo
            .insert(&ScheduledVehicle {
                id: 0,
                vehicle_name: format!("{}-{:03}", schedule.service_name, i),
                schedule_id: schedule.id,
                vehicle_type: ModeOfTransport::Feeder,
                capacity_in_teu: 120.0,
                moved_capacity: 80.0,
                realized_arrival: at(2 + i, 14),
            })
            .unwrap();

        let mut containers = Vec::new();
        for _ in 0..50 {
            let truck_id = repos
                .truck_repo
                .insert(&Truck {
                    id: 0,
                    delivers_container: false,
                    picks_up_container: true,
                    planned_arrival: at(4 + i, 8),
                })
                .unwrap();
            containers.push(prior_container(vehicle_id, truck_id));
        }
        repos.container_repo.insert_batch(&containers).unwrap();
    }

    assert_eq!(repos.container_repo.count_all().unwrap(), 500);
    assert_eq!(repos.vehicle_repo.count_all().unwrap(), 10);
    assert_eq!(repos.truck_repo.count_all().unwrap(), 500);

    let service = ContainerFlowGenerationService::with_mode(test_config(42), conn.clone(), PipelineMode::Direct);
    assert!(service.container_flow_data_exists().unwrap());

    let summary = service.clear_previous_state().unwrap();
    assert_eq!(summary.containers_deleted, 500);
    assert_eq!(summary.vehicles_deleted, 10);
    assert_eq!(summary.trucks_deleted, 500);

    assert!(!service.container_flow_data_exists().unwrap());
    assert_eq!(repos.container_repo.count_all().unwrap(), 0);
    assert_eq!(repos.vehicle_repo.count_all().unwrap(), 0);
    assert_eq!(repos.vehicle_repo.count_particulars().unwrap(), 0);
    assert_eq!(repos.truck_repo.count_all().unwrap(), 0);

    // 船期保留
    assert_eq!(repos.schedule_repo.find_all().unwrap().len(), test_schedules().len());
}

#[test]
fn test_clear_on_empty_store_is_noop() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    seed_schedules(&conn);

    let service = ContainerFlowGenerationService::with_mode(test_config(42), conn, PipelineMode::Direct);
    let summary = service.clear_previous_state().unwrap();
    assert_eq!(summary.containers_deleted, 0);
    assert_eq!(summary.vehicles_deleted, 0);
    assert_eq!(summary.trucks_deleted, 0);
}

#[test]
fn test_generation_after_clear_starts_from_scratch() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let repos = seed_schedules(&conn);

    let mut service = ContainerFlowGenerationService::with_mode(test_config(5), conn, PipelineMode::Direct);
    let first = service.generate().unwrap();
    assert_eq!(first.cleared.containers_deleted, 0);
    let generated = repos.container_repo.count_all().unwrap();
    assert!(generated > 0);

    // 第二次运行先清理上一次的结果
    let second = service.generate().unwrap();
    assert_eq!(second.cleared.containers_deleted as u64, generated);
    assert_eq!(repos.container_repo.count_all().unwrap(), generated);
    assert_ne!(first.run_id, second.run_id);
}
