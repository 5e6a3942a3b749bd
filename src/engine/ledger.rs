// ==========================================
// 集装箱码头流量合成系统 - 运输工具运力账本
// ==========================================
// 红线: 任何运输工具不得超载（进港 / 出港两段分别约束）
// ==========================================
// 职责: 跟踪定班运输工具进港/出港剩余运力
// 输入: 运输工具记录 + 已分配集装箱计数
// 输出: 剩余运力查询、运力预留（返回是否已耗尽）
// ==========================================
// 说明:
// - 剩余运力首次查询时由持久化记录重建，之后只在内存中递减
// - 每次生成运行开始时 reset_cache()
// - 预留前必须先查询（CapacityNotLoaded）
// ==========================================

use crate::domain::capacity::{default_exhaustion_threshold, units_of};
use crate::domain::types::ContainerLength;
use crate::domain::vehicle::ScheduledVehicle;
use crate::repository::{ContainerRepository, RepositoryError, RepositoryResult};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// 浮点误差容限
const CAPACITY_EPSILON: f64 = 1e-9;

// ==========================================
// LedgerError - 账本错误
// ==========================================
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(
        "运力超限: vehicle_id={vehicle_id}, vehicle_name={vehicle_name}, \
         free_before={free_before}, requested={requested}, free_after={free_after}"
    )]
    CapacityExceeded {
        vehicle_id: i64,
        vehicle_name: String,
        free_before: f64,
        requested: f64,
        free_after: f64,
    },

    #[error("数据不一致: vehicle_id={vehicle_id}, vehicle_name={vehicle_name}, free_capacity={free_capacity}")]
    DataConsistency {
        vehicle_id: i64,
        vehicle_name: String,
        free_capacity: f64,
    },

    #[error("运力未加载即预留: vehicle_id={vehicle_id}, direction={direction}")]
    CapacityNotLoaded { vehicle_id: i64, direction: &'static str },

    #[error("出港运力缓冲未设置")]
    TransportationBufferNotSet,

    #[error("账本配置非法: {0}")]
    InvalidConfiguration(String),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ==========================================
// ContainerCounter Trait - 已分配箱量计数
// ==========================================
pub trait ContainerCounter {
    /// 由该运输工具送达的指定箱型数量
    fn count_delivered_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64>;

    /// 由该运输工具提走的指定箱型数量
    fn count_picked_up_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64>;
}

impl ContainerCounter for ContainerRepository {
    fn count_delivered_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        self.count_delivered_by_vehicle(vehicle_id, length)
    }

    fn count_picked_up_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        self.count_picked_up_by_vehicle(vehicle_id, length)
    }
}

impl<T: ContainerCounter + ?Sized> ContainerCounter for Arc<T> {
    fn count_delivered_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        (**self).count_delivered_by(vehicle_id, length)
    }

    fn count_picked_up_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
        (**self).count_picked_up_by(vehicle_id, length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "INBOUND",
            Direction::Outbound => "OUTBOUND",
        }
    }
}

// ==========================================
// VehicleCapacityLedger - 运力账本
// ==========================================
pub struct VehicleCapacityLedger<C: ContainerCounter> {
    counter: C,
    transportation_buffer: Option<f64>,
    exhaustion_threshold: f64,
    free_inbound: HashMap<i64, f64>,
    free_outbound: HashMap<i64, f64>,
}

impl<C: ContainerCounter> VehicleCapacityLedger<C> {
    /// 创建空账本（阈值取默认值，缓冲未设置）
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            transportation_buffer: None,
            exhaustion_threshold: default_exhaustion_threshold(),
            free_inbound: HashMap::new(),
            free_outbound: HashMap::new(),
        }
    }

    /// 设置出港运力缓冲（必须 > -1）
    pub fn set_transportation_buffer(&mut self, transportation_buffer: f64) -> LedgerResult<()> {
        if !transportation_buffer.is_finite() || transportation_buffer <= -1.0 {
            return Err(LedgerError::InvalidConfiguration(format!(
                "transportation_buffer 必须大于 -1, 实际 {}",
                transportation_buffer
            )));
        }
        self.transportation_buffer = Some(transportation_buffer);
        Ok(())
    }

    /// 设置运力耗尽阈值
    pub fn set_exhaustion_threshold(&mut self, exhaustion_threshold: f64) -> LedgerResult<()> {
        if !exhaustion_threshold.is_finite() || exhaustion_threshold < 0.0 {
            return Err(LedgerError::InvalidConfiguration(format!(
                "exhaustion_threshold 必须为非负数, 实际 {}",
                exhaustion_threshold
            )));
        }
        self.exhaustion_threshold = exhaustion_threshold;
        Ok(())
    }

    pub fn transportation_buffer(&self) -> Option<f64> {
        self.transportation_buffer
    }

    pub fn exhaustion_threshold(&self) -> f64 {
        self.exhaustion_threshold
    }

    /// 清空全部缓存的剩余运力
    pub fn reset_cache(&mut self) {
        self.free_inbound.clear();
        self.free_outbound.clear();
    }

    /// 已缓存的运输工具数量（两段去重）
    pub fn cached_vehicle_count(&self) -> usize {
        self.free_inbound
            .keys()
            .chain(self.free_outbound.keys())
            .collect::<std::collections::HashSet<_>>()
            .len()
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 进港剩余运力 = 进港装载量 − 已送达箱量（运力单位）
    pub fn get_free_inbound_capacity(&mut self, vehicle: &ScheduledVehicle) -> LedgerResult<f64> {
        if let Some(free) = self.free_inbound.get(&vehicle.id) {
            return Ok(*free);
        }

        let mut loaded = 0.0;
        for length in ContainerLength::ALL {
            let count = self.counter.count_delivered_by(vehicle.id, length)?;
            loaded += units_of(length) * count as f64;
        }

        let free = check_loaded(vehicle, vehicle.moved_capacity - loaded)?;
        self.free_inbound.insert(vehicle.id, free);
        Ok(free)
    }

    /// 出港剩余运力 = min(进港装载量 × (1 + buffer), 物理运力) − 已提走箱量
    pub fn get_free_outbound_capacity(&mut self, vehicle: &ScheduledVehicle) -> LedgerResult<f64> {
        if let Some(free) = self.free_outbound.get(&vehicle.id) {
            return Ok(*free);
        }

        let buffer = self
            .transportation_buffer
            .ok_or(LedgerError::TransportationBufferNotSet)?;

        let mut loaded = 0.0;
        for length in ContainerLength::ALL {
            let count = self.counter.count_picked_up_by(vehicle.id, length)?;
            loaded += units_of(length) * count as f64;
        }

        let free = check_loaded(vehicle, vehicle.outbound_usable_capacity(buffer) - loaded)?;
        self.free_outbound.insert(vehicle.id, free);
        Ok(free)
    }

    /// 出港段能否再装载一只指定箱型
    pub fn fits_outbound(&mut self, vehicle: &ScheduledVehicle, length: ContainerLength) -> LedgerResult<bool> {
        let free = self.get_free_outbound_capacity(vehicle)?;
        Ok(free + CAPACITY_EPSILON >= units_of(length))
    }

    /// 进港段能否再装载一只指定箱型
    pub fn fits_inbound(&mut self, vehicle: &ScheduledVehicle, length: ContainerLength) -> LedgerResult<bool> {
        let free = self.get_free_inbound_capacity(vehicle)?;
        Ok(free + CAPACITY_EPSILON >= units_of(length))
    }

    // ==========================================
    // 预留
    // ==========================================

    /// 预留进港运力
    ///
    /// # 返回
    /// - Ok(true): 预留后剩余运力 <= 耗尽阈值
    /// - Err(CapacityExceeded): 预留将导致剩余运力为负
    pub fn reserve_inbound_capacity(
        &mut self,
        vehicle: &ScheduledVehicle,
        length: ContainerLength,
    ) -> LedgerResult<bool> {
        let threshold = self.exhaustion_threshold;
        reserve(&mut self.free_inbound, Direction::Inbound, vehicle, length, threshold)
    }

    /// 预留出港运力（语义同进港）
    pub fn reserve_outbound_capacity(
        &mut self,
        vehicle: &ScheduledVehicle,
        length: ContainerLength,
    ) -> LedgerResult<bool> {
        let threshold = self.exhaustion_threshold;
        reserve(&mut self.free_outbound, Direction::Outbound, vehicle, length, threshold)
    }
}

fn check_loaded(vehicle: &ScheduledVehicle, free: f64) -> LedgerResult<f64> {
    if free < -CAPACITY_EPSILON {
        warn!(
            vehicle_id = vehicle.id,
            vehicle_name = %vehicle.vehicle_name,
            free_capacity = free,
            "持久化记录已超载"
        );
        return Err(LedgerError::DataConsistency {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.vehicle_name.clone(),
            free_capacity: free,
        });
    }
    Ok(free.max(0.0))
}

fn reserve(
    cache: &mut HashMap<i64, f64>,
    direction: Direction,
    vehicle: &ScheduledVehicle,
    length: ContainerLength,
    exhaustion_threshold: f64,
) -> LedgerResult<bool> {
    let free_before = *cache.get(&vehicle.id).ok_or(LedgerError::CapacityNotLoaded {
        vehicle_id: vehicle.id,
        direction: direction.as_str(),
    })?;

    let requested = units_of(length);
    let free_after = free_before - requested;
    if free_after < -CAPACITY_EPSILON {
        return Err(LedgerError::CapacityExceeded {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.vehicle_name.clone(),
            free_before,
            requested,
            free_after,
        });
    }

    let free_after = free_after.max(0.0);
    cache.insert(vehicle.id, free_after);

    let exhausted = free_after <= exhaustion_threshold;
    if exhausted {
        debug!(
            vehicle_id = vehicle.id,
            direction = direction.as_str(),
            free_after,
            "运输工具运力已耗尽"
        );
    }
    Ok(exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ModeOfTransport;
    use chrono::NaiveDate;
    use std::cell::Cell;

    /// 内存计数器：(vehicle_id, length) → count
    #[derive(Default)]
    struct FakeCounter {
        delivered: HashMap<(i64, ContainerLength), u64>,
        picked_up: HashMap<(i64, ContainerLength), u64>,
        queries: Cell<usize>,
    }

    impl ContainerCounter for FakeCounter {
        fn count_delivered_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.delivered.get(&(vehicle_id, length)).copied().unwrap_or(0))
        }

        fn count_picked_up_by(&self, vehicle_id: i64, length: ContainerLength) -> RepositoryResult<u64> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.picked_up.get(&(vehicle_id, length)).copied().unwrap_or(0))
        }
    }

    fn vehicle(moved: f64, physical: f64) -> ScheduledVehicle {
        ScheduledVehicle {
            id: 7,
            vehicle_name: "NORDIC-EXPRESS-003".to_string(),
            schedule_id: 1,
            vehicle_type: ModeOfTransport::Feeder,
            capacity_in_teu: physical,
            moved_capacity: moved,
            realized_arrival: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_outbound_capacity_with_buffer_and_reservations() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        ledger.set_transportation_buffer(0.1).unwrap();
        let v = vehicle(100.0, 120.0);

        assert!((ledger.get_free_outbound_capacity(&v).unwrap() - 110.0).abs() < 1e-9);

        for _ in 0..3 {
            let exhausted = ledger.reserve_outbound_capacity(&v, ContainerLength::FortyFeet).unwrap();
            assert!(!exhausted);
        }
        assert!((ledger.get_free_outbound_capacity(&v).unwrap() - 104.0).abs() < 1e-9);
    }

    #[test]
    fn test_outbound_capacity_capped_by_physical() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        ledger.set_transportation_buffer(0.5).unwrap();
        let v = vehicle(100.0, 120.0);
        assert_eq!(ledger.get_free_outbound_capacity(&v).unwrap(), 120.0);
    }

    #[test]
    fn test_reserve_beyond_free_capacity_is_fatal() {
        let mut counter = FakeCounter::default();
        // 进港装载量 2.3，已送达 2 只 20ft → 剩余 0.3
        counter.delivered.insert((7, ContainerLength::TwentyFeet), 2);
        let mut ledger = VehicleCapacityLedger::new(counter);
        let v = vehicle(2.3, 10.0);

        assert!((ledger.get_free_inbound_capacity(&v).unwrap() - 0.3).abs() < 1e-9);

        let err = ledger.reserve_inbound_capacity(&v, ContainerLength::Other).unwrap_err();
        match err {
            LedgerError::CapacityExceeded {
                vehicle_id,
                free_before,
                requested,
                free_after,
                ..
            } => {
                assert_eq!(vehicle_id, 7);
                assert!((free_before - 0.3).abs() < 1e-9);
                assert_eq!(requested, 0.5);
                assert!((free_after + 0.2).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // 失败的预留不改变剩余运力
        assert!((ledger.get_free_inbound_capacity(&v).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_reserve_outbound_beyond_free_capacity_is_fatal() {
        let mut counter = FakeCounter::default();
        // 出港可用 110，已提走 53 只 40ft、1 只 45ft、1 只 20ft、1 只其他 → 剩余 0.25
        counter.picked_up.insert((7, ContainerLength::FortyFeet), 53);
        counter.picked_up.insert((7, ContainerLength::FortyFiveFeet), 1);
        counter.picked_up.insert((7, ContainerLength::TwentyFeet), 1);
        counter.picked_up.insert((7, ContainerLength::Other), 1);
        let mut ledger = VehicleCapacityLedger::new(counter);
        ledger.set_transportation_buffer(0.1).unwrap();
        let v = vehicle(100.0, 120.0);

        assert!((ledger.get_free_outbound_capacity(&v).unwrap() - 0.25).abs() < 1e-9);

        let err = ledger.reserve_outbound_capacity(&v, ContainerLength::Other).unwrap_err();
        match err {
            LedgerError::CapacityExceeded {
                vehicle_id,
                vehicle_name,
                free_before,
                requested,
                free_after,
            } => {
                assert_eq!(vehicle_id, 7);
                assert_eq!(vehicle_name, "NORDIC-EXPRESS-003");
                assert!((free_before - 0.25).abs() < 1e-9);
                assert_eq!(requested, 0.5);
                assert!((free_after + 0.25).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!((ledger.get_free_outbound_capacity(&v).unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_exhausted_when_free_reaches_threshold() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        let v = vehicle(2.5, 10.0);
        ledger.get_free_inbound_capacity(&v).unwrap();

        assert!(!ledger.reserve_inbound_capacity(&v, ContainerLength::TwentyFeet).unwrap());
        assert!(ledger.reserve_inbound_capacity(&v, ContainerLength::TwentyFeet).unwrap());
    }

    #[test]
    fn test_reserve_without_query_is_contract_violation() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        ledger.set_transportation_buffer(0.2).unwrap();
        let v = vehicle(100.0, 120.0);

        assert!(matches!(
            ledger.reserve_outbound_capacity(&v, ContainerLength::TwentyFeet),
            Err(LedgerError::CapacityNotLoaded { vehicle_id: 7, .. })
        ));
    }

    #[test]
    fn test_outbound_requires_buffer() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        let v = vehicle(100.0, 120.0);
        assert!(matches!(
            ledger.get_free_outbound_capacity(&v),
            Err(LedgerError::TransportationBufferNotSet)
        ));
    }

    #[test]
    fn test_invalid_buffer_rejected() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        assert!(matches!(
            ledger.set_transportation_buffer(-1.0),
            Err(LedgerError::InvalidConfiguration(_))
        ));
        assert!(ledger.set_transportation_buffer(-0.99).is_ok());
    }

    #[test]
    fn test_overloaded_records_report_data_consistency() {
        let mut counter = FakeCounter::default();
        counter.delivered.insert((7, ContainerLength::FortyFeet), 60);
        let mut ledger = VehicleCapacityLedger::new(counter);
        let v = vehicle(100.0, 120.0);

        assert!(matches!(
            ledger.get_free_inbound_capacity(&v),
            Err(LedgerError::DataConsistency { vehicle_id: 7, .. })
        ));
    }

    #[test]
    fn test_cache_and_reset() {
        let mut counter = FakeCounter::default();
        counter.picked_up.insert((7, ContainerLength::TwentyFeet), 10);
        let mut ledger = VehicleCapacityLedger::new(counter);
        ledger.set_transportation_buffer(0.0).unwrap();
        let v = vehicle(100.0, 120.0);

        let first = ledger.get_free_outbound_capacity(&v).unwrap();
        let queries = ledger.counter.queries.get();
        let second = ledger.get_free_outbound_capacity(&v).unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.counter.queries.get(), queries);
        assert_eq!(ledger.cached_vehicle_count(), 1);

        ledger.reset_cache();
        ledger.reset_cache();
        assert_eq!(ledger.cached_vehicle_count(), 0);
        assert_eq!(ledger.get_free_outbound_capacity(&v).unwrap(), 90.0);
        assert!(ledger.counter.queries.get() > queries);
    }

    #[test]
    fn test_reservations_are_monotonic() {
        let mut ledger = VehicleCapacityLedger::new(FakeCounter::default());
        ledger.set_transportation_buffer(0.2).unwrap();
        let v = vehicle(20.0, 30.0);

        let mut previous = ledger.get_free_outbound_capacity(&v).unwrap();
        let lengths = [
            ContainerLength::FortyFiveFeet,
            ContainerLength::TwentyFeet,
            ContainerLength::Other,
            ContainerLength::FortyFeet,
        ];
        for length in lengths.iter().cycle().take(8) {
            ledger.reserve_outbound_capacity(&v, *length).unwrap();
            let current = ledger.get_free_outbound_capacity(&v).unwrap();
            assert!(current < previous);
            assert!(current >= 0.0);
            previous = current;
        }
    }
}
