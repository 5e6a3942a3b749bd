// ==========================================
// 集装箱码头流量合成系统 - 分布抽样器
// ==========================================
// 职责: 按运输方式键抽样箱型、出港方式、堆存要求、箱重、停留时间、目的港
// 约束: 同一种子 + 同一调用顺序 → 同一结果（ChaCha8Rng）
// ==========================================

use crate::config::distribution::{DistributionSet, DwellTime};
use crate::domain::types::{ContainerLength, ModeOfTransport, StorageRequirement};
use crate::domain::vehicle::Destination;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

// ==========================================
// DistributionSampler Trait
// ==========================================
pub trait DistributionSampler {
    fn distributions(&self) -> &DistributionSet;

    /// 按运输工具类型抽样箱型
    fn sample_length(&mut self, vehicle_type: ModeOfTransport) -> ContainerLength;

    /// 按进港方式抽样出港方式
    fn sample_pickup_mode(&mut self, delivered_by: ModeOfTransport) -> ModeOfTransport;

    fn sample_storage_requirement(&mut self) -> StorageRequirement;

    /// 箱重（吨）
    fn sample_weight(&mut self, length: ContainerLength) -> f64;

    /// 停留时间（小时）
    fn sample_dwell_hours(&mut self, delivered_by: ModeOfTransport, picked_up_by: ModeOfTransport) -> f64;

    /// 按权重抽样目的港下标；列表为空或权重全为 0 时返回 None
    fn sample_destination(&mut self, destinations: &[Destination]) -> Option<usize>;
}

// ==========================================
// SeededDistributionSampler - 种子抽样器
// ==========================================
pub struct SeededDistributionSampler {
    distributions: DistributionSet,
    rng: ChaCha8Rng,
}

impl SeededDistributionSampler {
    pub fn new(distributions: DistributionSet, random_seed: u64) -> Self {
        Self {
            distributions,
            rng: ChaCha8Rng::seed_from_u64(random_seed),
        }
    }

    fn pick<K: Copy>(&mut self, row: Option<&BTreeMap<K, f64>>, fallback: K) -> K {
        let Some(row) = row else {
            return fallback;
        };
        let keys: Vec<K> = row.keys().copied().collect();
        match WeightedIndex::new(row.values().copied()) {
            Ok(index) => keys[index.sample(&mut self.rng)],
            Err(_) => fallback,
        }
    }
}

impl DistributionSampler for SeededDistributionSampler {
    fn distributions(&self) -> &DistributionSet {
        &self.distributions
    }

    fn sample_length(&mut self, vehicle_type: ModeOfTransport) -> ContainerLength {
        let row = self.distributions.container_length.get(&vehicle_type).cloned();
        self.pick(row.as_ref(), ContainerLength::TwentyFeet)
    }

    fn sample_pickup_mode(&mut self, delivered_by: ModeOfTransport) -> ModeOfTransport {
        let row = self.distributions.mode_of_transport.get(&delivered_by).cloned();
        self.pick(row.as_ref(), ModeOfTransport::Truck)
    }

    fn sample_storage_requirement(&mut self) -> StorageRequirement {
        let row = self.distributions.storage_requirement.clone();
        self.pick(Some(&row), StorageRequirement::Standard)
    }

    fn sample_weight(&mut self, length: ContainerLength) -> f64 {
        match self.distributions.container_weight.get(&length) {
            Some(range) if range.maximum_t > range.minimum_t => {
                self.rng.gen_range(range.minimum_t..=range.maximum_t)
            }
            Some(range) => range.minimum_t,
            None => 0.0,
        }
    }

    fn sample_dwell_hours(&mut self, delivered_by: ModeOfTransport, picked_up_by: ModeOfTransport) -> f64 {
        let dwell = self.distributions.dwell_time_for(delivered_by, picked_up_by);
        let u: f64 = self.rng.gen();
        triangular(&dwell, u)
    }

    fn sample_destination(&mut self, destinations: &[Destination]) -> Option<usize> {
        let index = WeightedIndex::new(destinations.iter().map(|d| d.weight.max(0.0))).ok()?;
        Some(index.sample(&mut self.rng))
    }
}

/// 三角分布逆变换（众数由均值反推：mode = 3·avg − min − max）
fn triangular(dwell: &DwellTime, u: f64) -> f64 {
    let (a, b) = (dwell.minimum_hours, dwell.maximum_hours);
    if b <= a {
        return a;
    }
    let c = (3.0 * dwell.average_hours - a - b).clamp(a, b);
    let fc = (c - a) / (b - a);
    if u < fc {
        a + (u * (b - a) * (c - a)).sqrt()
    } else {
        b - ((1.0 - u) * (b - a) * (b - c)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededDistributionSampler::new(DistributionSet::default(), 7);
        let mut b = SeededDistributionSampler::new(DistributionSet::default(), 7);
        for _ in 0..50 {
            assert_eq!(
                a.sample_length(ModeOfTransport::Feeder),
                b.sample_length(ModeOfTransport::Feeder)
            );
            assert_eq!(
                a.sample_pickup_mode(ModeOfTransport::DeepSeaVessel),
                b.sample_pickup_mode(ModeOfTransport::DeepSeaVessel)
            );
        }
    }

    #[test]
    fn test_dwell_within_bounds() {
        let mut sampler = SeededDistributionSampler::new(DistributionSet::default(), 1);
        let dwell = sampler
            .distributions()
            .dwell_time_for(ModeOfTransport::Feeder, ModeOfTransport::Truck);
        for _ in 0..200 {
            let hours = sampler.sample_dwell_hours(ModeOfTransport::Feeder, ModeOfTransport::Truck);
            assert!(hours >= dwell.minimum_hours && hours <= dwell.maximum_hours);
        }
    }

    #[test]
    fn test_triangular_endpoints() {
        let dwell = DwellTime::new(12.0, 120.0, 336.0);
        assert_eq!(triangular(&dwell, 0.0), 12.0);
        assert!((triangular(&dwell, 1.0) - 336.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_probability_mode_never_sampled() {
        let mut distributions = DistributionSet::default();
        let row = distributions
            .mode_of_transport
            .get_mut(&ModeOfTransport::Feeder)
            .unwrap();
        for (mode, weight) in row.iter_mut() {
            *weight = if *mode == ModeOfTransport::Barge { 1.0 } else { 0.0 };
        }
        let mut sampler = SeededDistributionSampler::new(distributions, 3);
        for _ in 0..100 {
            assert_eq!(sampler.sample_pickup_mode(ModeOfTransport::Feeder), ModeOfTransport::Barge);
        }
    }

    #[test]
    fn test_destination_sampling() {
        let mut sampler = SeededDistributionSampler::new(DistributionSet::default(), 11);
        assert_eq!(sampler.sample_destination(&[]), None);

        let destinations = vec![
            Destination { name: "ROTTERDAM".to_string(), weight: 0.0 },
            Destination { name: "GDANSK".to_string(), weight: 2.0 },
        ];
        for _ in 0..20 {
            assert_eq!(sampler.sample_destination(&destinations), Some(1));
        }
    }
}
