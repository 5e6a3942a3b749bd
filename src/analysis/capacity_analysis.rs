// ==========================================
// 集装箱码头流量合成系统 - 进出港运力利用分析
// ==========================================
// 职责: 读取已生成的流量，按运输方式汇总进港箱量、出港已用/最大运力
// 红线: 集卡运力无上限，最大运力恒为“不适用”(None)
// ==========================================
// 缓存:
// - 按分析实例缓存，键 = (时间窗, 集装箱集合指纹, 实例集合指纹)
// - 指纹覆盖箱型、运输方式、承运关联与到/离港时间，清理后重新生成同样数量的箱也不会误命中
// - use_cache = false 时强制重算
// ==========================================

use crate::domain::capacity::{ContainerVolumeByVehicleType, OutboundUsedAndMaximumCapacity};
use crate::domain::types::ModeOfTransport;
use crate::engine::repositories::FlowRepositories;
use crate::repository::{
    ContainerSelection, ContainerSetFingerprint, ContainerWithTimes, RepositoryResult,
    VehicleSetFingerprint,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::debug;

type CacheKey = (
    Option<NaiveDateTime>,
    Option<NaiveDateTime>,
    ContainerSetFingerprint,
    VehicleSetFingerprint,
);

pub struct InboundAndOutboundVehicleCapacityAnalysis {
    repos: FlowRepositories,
    transportation_buffer: f64,
    inbound_cache: HashMap<CacheKey, ContainerVolumeByVehicleType>,
    outbound_cache: HashMap<CacheKey, OutboundUsedAndMaximumCapacity>,
}

impl InboundAndOutboundVehicleCapacityAnalysis {
    pub fn new(repos: FlowRepositories, transportation_buffer: f64) -> Self {
        Self {
            repos,
            transportation_buffer,
            inbound_cache: HashMap::new(),
            outbound_cache: HashMap::new(),
        }
    }

    /// 清空缓存
    pub fn invalidate(&mut self) {
        self.inbound_cache.clear();
        self.outbound_cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.inbound_cache.len() + self.outbound_cache.len()
    }

    /// 进港箱量（按进港运输方式）
    ///
    /// # 参数
    /// - start / end: 可选时间窗 [start, end)，按集装箱到港 >= start、离港 < end 筛选
    /// - use_cache: false 时强制重算
    pub fn get_inbound_container_volumes_by_vehicle_type(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        use_cache: bool,
    ) -> RepositoryResult<ContainerVolumeByVehicleType> {
        let key = self.cache_key(start, end)?;
        if use_cache {
            if let Some(cached) = self.inbound_cache.get(&key) {
                debug!("命中进港分析缓存");
                return Ok(cached.clone());
            }
        }

        let mut volume = ContainerVolumeByVehicleType::zeroed(true);
        for item in self.select_containers(start, end)? {
            volume.add_container(item.container.delivered_by, item.container.length);
        }

        self.inbound_cache.insert(key, volume.clone());
        Ok(volume)
    }

    /// 出港已用运力（按出港运输方式）与最大运力（按实例运输方式）
    pub fn get_outbound_container_volume_by_vehicle_type(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        use_cache: bool,
    ) -> RepositoryResult<OutboundUsedAndMaximumCapacity> {
        let key = self.cache_key(start, end)?;
        if use_cache {
            if let Some(cached) = self.outbound_cache.get(&key) {
                debug!("命中出港分析缓存");
                return Ok(cached.clone());
            }
        }

        let mut used = ContainerVolumeByVehicleType::zeroed(true);
        for item in self.select_containers(start, end)? {
            used.add_container(item.container.picked_up_by, item.container.length);
        }

        let mut maximum = ContainerVolumeByVehicleType::zeroed(false);
        for vehicle in self.repos.vehicle_repo.find_all()? {
            if !within(vehicle.realized_arrival, start, end) {
                continue;
            }
            maximum.add_teu(
                vehicle.vehicle_type,
                vehicle.outbound_usable_capacity(self.transportation_buffer),
            );
        }
        maximum.mark_not_applicable(ModeOfTransport::Truck);

        let result = OutboundUsedAndMaximumCapacity { used, maximum };
        self.outbound_cache.insert(key, result.clone());
        Ok(result)
    }

    fn cache_key(&self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> RepositoryResult<CacheKey> {
        Ok((
            start,
            end,
            self.repos.container_repo.fingerprint()?,
            self.repos.vehicle_repo.fingerprint()?,
        ))
    }

    fn select_containers(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> RepositoryResult<Vec<ContainerWithTimes>> {
        let containers = self.repos.container_repo.find_with_times(ContainerSelection::All)?;
        Ok(containers
            .into_iter()
            .filter(|item| {
                let after_start = match (start, item.arrival) {
                    (Some(start), Some(arrival)) => arrival >= start,
                    _ => true,
                };
                let before_end = match (end, item.departure) {
                    (Some(end), Some(departure)) => departure < end,
                    _ => true,
                };
                after_start && before_end
            })
            .collect())
    }
}

fn within(at: NaiveDateTime, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> bool {
    start.map_or(true, |s| at >= s) && end.map_or(true, |e| at < e)
}
