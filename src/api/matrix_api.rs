// ==========================================
// 车队维保系统 - 适用矩阵编辑 API
// ==========================================
// 职责: 稠密网格读取 / 单元格编辑 / 整表保存
// 并发: 不同单元格的编辑互不影响；同一单元格按到达顺序后写覆盖
// 红线: 编辑从不改动区间与作业结构
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{ActivityApplicability, Plan};
use crate::engine::{CellDiff, DenseGrid, MatrixView};
use crate::repository::{PlanRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 单元格编辑请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub plan_id: String,
    pub activity_id: String,
    pub interval_id: String,
    pub applies: bool,
}

/// 适用矩阵API
pub struct MatrixApi<R: PlanRepository> {
    plan_repo: Arc<R>,
    view: MatrixView,
}

impl<R: PlanRepository> MatrixApi<R> {
    pub fn new(plan_repo: Arc<R>) -> Self {
        Self {
            plan_repo,
            view: MatrixView::new(),
        }
    }

    /// 单元格写入阶段的 NotFound 指向作业/区间，不是计划本身
    fn cell_write_error(err: RepositoryError) -> ApiError {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::UnknownReference { entity, id },
            other => ApiError::from(other),
        }
    }

    fn load_plan(&self, plan_id: &str) -> ApiResult<Plan> {
        self.plan_repo
            .find_by_id(plan_id)?
            .ok_or_else(|| ApiError::NotFound(format!("保养计划(id={})不存在", plan_id)))
    }

    /// 读取稠密网格
    pub fn get_matrix(&self, plan_id: &str) -> ApiResult<DenseGrid> {
        let plan = self.load_plan(plan_id)?;
        Ok(self.view.to_dense_grid(&plan))
    }

    /// 单元格编辑
    ///
    /// # 返回
    /// - Ok(CellDiff): old_value 为落库前的实际值（重复提交时 old == new）
    /// - Err(NotFound): 计划不存在
    /// - Err(UnknownReference): 作业/区间不属于该计划
    pub fn apply_edit(&self, request: &EditRequest) -> ApiResult<CellDiff> {
        let mut plan = self.load_plan(&request.plan_id)?;

        // 先在内存副本上校验引用
        self.view.apply_edit(
            &mut plan,
            &request.activity_id,
            &request.interval_id,
            request.applies,
        )?;

        let old_value = self
            .plan_repo
            .set_applicability(
                &request.plan_id,
                &request.activity_id,
                &request.interval_id,
                request.applies,
            )
            .map_err(Self::cell_write_error)?;

        let diff = CellDiff {
            activity_id: request.activity_id.clone(),
            interval_id: request.interval_id.clone(),
            old_value,
            new_value: request.applies,
        };
        info!(
            plan_id = %request.plan_id,
            activity_id = %diff.activity_id,
            interval_id = %diff.interval_id,
            old_value = diff.old_value,
            new_value = diff.new_value,
            "矩阵单元格编辑完成"
        );
        Ok(diff)
    }

    /// 保存编辑后的整张网格，只写入发生变化的单元格
    ///
    /// 所有变化在同一事务中写入，失败时不留下部分写入
    pub fn save_matrix(&self, plan_id: &str, grid: &DenseGrid) -> ApiResult<Vec<CellDiff>> {
        if grid.plan_id != plan_id {
            return Err(ApiError::InvalidInput(format!(
                "网格属于计划 {}，不能保存到 {}",
                grid.plan_id, plan_id
            )));
        }
        let plan = self.load_plan(plan_id)?;
        let diffs = self.view.diff(&plan, grid)?;

        let cells: Vec<ActivityApplicability> = diffs
            .iter()
            .map(|diff| ActivityApplicability {
                activity_id: diff.activity_id.clone(),
                interval_id: diff.interval_id.clone(),
                applies: diff.new_value,
            })
            .collect();
        self.plan_repo
            .set_applicabilities(plan_id, &cells)
            .map_err(Self::cell_write_error)?;

        info!(plan_id, changed = diffs.len(), "矩阵保存完成");
        Ok(diffs)
    }
}
