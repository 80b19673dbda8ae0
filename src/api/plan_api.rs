// ==========================================
// 车队维保系统 - 保养计划 API
// ==========================================
// 职责: 计划列表、详情、启停、下一次保养查询
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Activity, Interval, Plan, PlanIdentity, PlanSummary};
use crate::engine::DueIntervalResolver;
use crate::repository::PlanRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 下一次保养响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextMaintenanceResponse {
    pub interval: Interval,
    pub activities: Vec<Activity>,
    pub hours_remaining: f64,
    pub kilometers_remaining: f64,
}

/// 保养计划API
pub struct PlanApi<R: PlanRepository> {
    plan_repo: Arc<R>,
    due_resolver: DueIntervalResolver,
}

impl<R: PlanRepository> PlanApi<R> {
    pub fn new(plan_repo: Arc<R>) -> Self {
        Self {
            plan_repo,
            due_resolver: DueIntervalResolver::new(),
        }
    }

    pub fn list_plans(&self) -> ApiResult<Vec<PlanSummary>> {
        Ok(self.plan_repo.list_summaries()?)
    }

    pub fn get_plan_detail(&self, plan_id: &str) -> ApiResult<Option<Plan>> {
        Ok(self.plan_repo.find_by_id(plan_id)?)
    }

    pub fn find_plan(&self, vehicle_type: &str, name: &str) -> ApiResult<Option<Plan>> {
        Ok(self
            .plan_repo
            .find_by_identity(&PlanIdentity::new(vehicle_type, name))?)
    }

    /// 启用/停用计划
    pub fn set_plan_active(&self, plan_id: &str, is_active: bool) -> ApiResult<()> {
        self.plan_repo.set_active(plan_id, is_active)?;
        info!(plan_id, is_active, "计划启停状态已更新");
        Ok(())
    }

    /// 按当前读数查询下一次保养
    ///
    /// # 返回
    /// - Ok(None): 所有区间都已到达
    pub fn next_maintenance(
        &self,
        plan_id: &str,
        hours: f64,
        kilometers: f64,
    ) -> ApiResult<Option<NextMaintenanceResponse>> {
        if !hours.is_finite() || !kilometers.is_finite() || hours < 0.0 || kilometers < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "读数必须为非负数: hours={}, kilometers={}",
                hours, kilometers
            )));
        }

        let plan = self
            .plan_repo
            .find_by_id(plan_id)?
            .ok_or_else(|| ApiError::NotFound(format!("保养计划(id={})不存在", plan_id)))?;

        Ok(self
            .due_resolver
            .next_due(&plan, hours, kilometers)
            .map(|due| NextMaintenanceResponse {
                interval: due.interval.clone(),
                activities: due.activities.into_iter().cloned().collect(),
                hours_remaining: due.hours_remaining,
                kilometers_remaining: due.kilometers_remaining,
            }))
    }
}
