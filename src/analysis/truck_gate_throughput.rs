// ==========================================
// 集装箱码头流量合成系统 - 集卡闸口吞吐分析
// ==========================================
// 职责: 按周内小时 (周一 00:00 = 0 .. 周日 23:00 = 167) 统计集卡到闸量
// 口径:
// - 只统计已生成集卡的计划到达时刻
// - inbound = 送箱集卡，outbound = 提箱集卡，同一辆集卡两者都选时只计一次
// - 周内小时值 = 累计车次 / 覆盖周数（按 ISO 周去重）
// - 按日统计每小时的最小/最大/平均与全天合计
// ==========================================

use crate::domain::vehicle::Truck;
use crate::engine::repositories::FlowRepositories;
use crate::repository::RepositoryResult;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const HOURS_PER_WEEK: u32 = 168;

pub const DAYS_OF_THE_WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// 单日（或全周）的小时级吞吐统计，单位: 车次/小时，sum 为车次/天
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTruckThroughput {
    pub day: String,
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckGateThroughputReport {
    /// 周内小时 → 平均车次
    pub hourly: BTreeMap<u32, f64>,
    pub days: Vec<DailyTruckThroughput>,
    pub total: DailyTruckThroughput,
    pub fewest_trucks_day: String,
    pub most_trucks_day: String,
    pub average_trucks_per_day: f64,
    pub weeks_covered: usize,
}

pub struct TruckGateThroughputAnalysis {
    repos: FlowRepositories,
}

impl TruckGateThroughputAnalysis {
    pub fn new(repos: FlowRepositories) -> Self {
        Self { repos }
    }

    /// 周内小时到闸量，168 个小时全部给出（无车为 0）
    ///
    /// # 参数
    /// - inbound / outbound: 是否计入送箱 / 提箱集卡
    /// - start / end: 可选时间窗 [start, end)，按计划到达时刻筛选
    pub fn get_weekly_truck_arrivals(
        &self,
        inbound: bool,
        outbound: bool,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> RepositoryResult<(BTreeMap<u32, f64>, usize)> {
        let trucks: Vec<Truck> = self
            .repos
            .truck_repo
            .find_all()?
            .into_iter()
            .filter(|t| (inbound && t.delivers_container) || (outbound && t.picks_up_container))
            .filter(|t| start.map_or(true, |s| t.planned_arrival >= s))
            .filter(|t| end.map_or(true, |e| t.planned_arrival < e))
            .collect();

        let mut hourly: BTreeMap<u32, f64> = (0..HOURS_PER_WEEK).map(|h| (h, 0.0)).collect();
        let mut weeks = BTreeSet::new();
        for truck in &trucks {
            let arrival = truck.planned_arrival;
            let iso = arrival.iso_week();
            weeks.insert((iso.year(), iso.week()));
            *hourly.entry(hour_of_week(arrival)).or_insert(0.0) += 1.0;
        }

        let weeks_covered = weeks.len();
        if weeks_covered > 1 {
            for value in hourly.values_mut() {
                *value /= weeks_covered as f64;
            }
        }

        debug!(
            trucks = trucks.len(),
            weeks_covered,
            inbound,
            outbound,
            "集卡闸口吞吐统计完成"
        );
        Ok((hourly, weeks_covered))
    }

    /// 周内小时分布 + 按日汇总
    pub fn get_report(
        &self,
        inbound: bool,
        outbound: bool,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> RepositoryResult<TruckGateThroughputReport> {
        let (hourly, weeks_covered) = self.get_weekly_truck_arrivals(inbound, outbound, start, end)?;
        Ok(summarize(hourly, weeks_covered))
    }
}

fn hour_of_week(at: NaiveDateTime) -> u32 {
    at.weekday().num_days_from_monday() * 24 + at.hour()
}

fn summarize(hourly: BTreeMap<u32, f64>, weeks_covered: usize) -> TruckGateThroughputReport {
    let mut days = Vec::with_capacity(DAYS_OF_THE_WEEK.len());
    for (index, name) in DAYS_OF_THE_WEEK.iter().enumerate() {
        let from = index as u32 * 24;
        let values: Vec<f64> = hourly.range(from..from + 24).map(|(_, v)| *v).collect();
        let sum: f64 = values.iter().sum();
        days.push(DailyTruckThroughput {
            day: name.to_string(),
            minimum: values.iter().copied().fold(f64::INFINITY, f64::min),
            maximum: values.iter().copied().fold(0.0, f64::max),
            average: sum / 24.0,
            sum,
        });
    }

    let week_sum: f64 = days.iter().map(|d| d.sum).sum();
    let total = DailyTruckThroughput {
        day: "Total".to_string(),
        minimum: days.iter().map(|d| d.minimum).fold(f64::INFINITY, f64::min),
        maximum: days.iter().map(|d| d.maximum).fold(0.0, f64::max),
        average: week_sum / f64::from(HOURS_PER_WEEK),
        sum: week_sum,
    };

    // 并列时取一周中靠前的一天
    let mut fewest = &days[0];
    let mut most = &days[0];
    for day in &days[1..] {
        if day.sum < fewest.sum {
            fewest = day;
        }
        if day.sum > most.sum {
            most = day;
        }
    }

    TruckGateThroughputReport {
        fewest_trucks_day: fewest.day.clone(),
        most_trucks_day: most.day.clone(),
        average_trucks_per_day: week_sum / DAYS_OF_THE_WEEK.len() as f64,
        hourly,
        days,
        total,
        weeks_covered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_in_memory_connection};
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    // 2026-03-02 为周一
    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap().and_hms_opt(hour, 30, 0).unwrap()
    }

    fn setup(trucks: &[(bool, bool, NaiveDateTime)]) -> TruckGateThroughputAnalysis {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        let repos = FlowRepositories::from_connection(Arc::new(Mutex::new(conn)));
        for (delivers, picks_up, planned_arrival) in trucks {
            repos
                .truck_repo
                .insert(&Truck {
                    id: 0,
                    delivers_container: *delivers,
                    picks_up_container: *picks_up,
                    planned_arrival: *planned_arrival,
                })
                .unwrap();
        }
        TruckGateThroughputAnalysis::new(repos)
    }

    #[test]
    fn test_hour_of_week() {
        assert_eq!(hour_of_week(at(2, 0)), 0);
        assert_eq!(hour_of_week(at(3, 10)), 34);
        assert_eq!(hour_of_week(at(8, 23)), 167);
    }

    #[test]
    fn test_empty_store_gives_zero_week() {
        let analysis = setup(&[]);
        let report = analysis.get_report(true, true, None, None).unwrap();

        assert_eq!(report.hourly.len(), 168);
        assert!(report.hourly.values().all(|v| *v == 0.0));
        assert_eq!(report.weeks_covered, 0);
        assert_eq!(report.total.sum, 0.0);
        assert_eq!(report.days[0].minimum, 0.0);
    }

    #[test]
    fn test_hourly_histogram_and_daily_statistics() {
        let analysis = setup(&[
            (true, false, at(2, 8)),
            (true, false, at(2, 8)),
            (false, true, at(2, 9)),
            (true, true, at(4, 14)),
            (false, true, at(7, 6)),
        ]);

        let report = analysis.get_report(true, true, None, None).unwrap();
        assert_eq!(report.weeks_covered, 1);
        assert_eq!(report.hourly[&8], 2.0);
        assert_eq!(report.hourly[&9], 1.0);
        assert_eq!(report.hourly[&(2 * 24 + 14)], 1.0);
        assert_eq!(report.hourly[&(5 * 24 + 6)], 1.0);

        let monday = &report.days[0];
        assert_eq!(monday.day, "Monday");
        assert_eq!(monday.minimum, 0.0);
        assert_eq!(monday.maximum, 2.0);
        assert_eq!(monday.sum, 3.0);
        assert!((monday.average - 3.0 / 24.0).abs() < 1e-9);

        assert_eq!(report.total.sum, 5.0);
        assert_eq!(report.total.maximum, 2.0);
        assert!((report.total.average - 5.0 / 168.0).abs() < 1e-9);
        assert_eq!(report.most_trucks_day, "Monday");
        assert_eq!(report.fewest_trucks_day, "Tuesday");
        assert!((report.average_trucks_per_day - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_filter_counts_dual_trucks_once() {
        let analysis = setup(&[
            (true, false, at(2, 8)),
            (false, true, at(2, 8)),
            (true, true, at(2, 8)),
        ]);

        let (inbound, _) = analysis.get_weekly_truck_arrivals(true, false, None, None).unwrap();
        let (outbound, _) = analysis.get_weekly_truck_arrivals(false, true, None, None).unwrap();
        let (both, _) = analysis.get_weekly_truck_arrivals(true, true, None, None).unwrap();
        assert_eq!(inbound[&8], 2.0);
        assert_eq!(outbound[&8], 2.0);
        assert_eq!(both[&8], 3.0);
    }

    #[test]
    fn test_averaged_over_covered_weeks_and_window() {
        // 连续两周的周一 08 时各一辆，第二周周三另有一辆
        let analysis = setup(&[
            (true, false, at(2, 8)),
            (true, false, at(9, 8)),
            (false, true, at(11, 12)),
        ]);

        let (hourly, weeks) = analysis.get_weekly_truck_arrivals(true, true, None, None).unwrap();
        assert_eq!(weeks, 2);
        assert_eq!(hourly[&8], 1.0);
        assert_eq!(hourly[&(2 * 24 + 12)], 0.5);

        // 时间窗只取第二周
        let (hourly, weeks) = analysis
            .get_weekly_truck_arrivals(true, true, Some(at(9, 0)), Some(at(16, 0)))
            .unwrap();
        assert_eq!(weeks, 1);
        assert_eq!(hourly[&8], 1.0);
        assert_eq!(hourly[&(2 * 24 + 12)], 1.0);
    }
}
