// ==========================================
// 车队维保系统 - 到期区间判定
// ==========================================
// 职责: 按车辆当前 小时/公里 读数找出下一个保养区间及其作业
// 规则: 任一阈值先到即视为到达（小时或公里）
// ==========================================

use crate::domain::{Activity, Interval, Plan};
use serde::Serialize;

/// 下一次保养
#[derive(Debug, Clone, Serialize)]
pub struct DueInterval<'a> {
    pub interval: &'a Interval,
    pub activities: Vec<&'a Activity>,
    /// 距小时阈值的剩余量
    pub hours_remaining: f64,
    /// 距公里阈值的剩余量
    pub kilometers_remaining: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DueIntervalResolver;

impl DueIntervalResolver {
    pub fn new() -> Self {
        Self
    }

    /// 已到达的区间（按 sequence_order）
    pub fn reached<'a>(&self, plan: &'a Plan, hours: f64, kilometers: f64) -> Vec<&'a Interval> {
        let mut intervals: Vec<&Interval> = plan
            .intervals
            .iter()
            .filter(|i| hours >= i.hours || kilometers >= i.kilometers)
            .collect();
        intervals.sort_by_key(|i| i.sequence_order);
        intervals
    }

    /// 下一个尚未到达的区间
    ///
    /// 区间在两个维度上严格递增，第一个两项阈值都未到达的区间即为下一次保养；
    /// 全部到达时返回 None
    pub fn next_due<'a>(
        &self,
        plan: &'a Plan,
        hours: f64,
        kilometers: f64,
    ) -> Option<DueInterval<'a>> {
        let mut intervals: Vec<&Interval> = plan.intervals.iter().collect();
        intervals.sort_by_key(|i| i.sequence_order);

        intervals
            .into_iter()
            .find(|i| hours < i.hours && kilometers < i.kilometers)
            .map(|interval| DueInterval {
                interval,
                activities: plan.activities_at(&interval.interval_id),
                hours_remaining: interval.hours - hours,
                kilometers_remaining: interval.kilometers - kilometers,
            })
    }
}
