// ==========================================
// 车队维保系统 - 适用矩阵视图引擎
// ==========================================
// 职责: 稀疏矩阵 ⇄ 稠密网格（按类别分组、按区间排序）
// 职责: 单元格编辑 → 差异 (old/new)
// 红线: 编辑只改单个矩阵条目，不改区间/作业结构
// ==========================================

use crate::domain::{ApplicabilityMatrix, Plan};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, instrument};

/// 矩阵操作错误（只影响当次调用）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("引用不存在: {entity} id={id}")]
    UnknownReference { entity: String, id: String },

    #[error("网格形状不匹配: {message}")]
    GridShapeMismatch { message: String },
}

impl MatrixError {
    pub fn code(&self) -> &'static str {
        match self {
            MatrixError::UnknownReference { .. } => "UnknownReferenceError",
            MatrixError::GridShapeMismatch { .. } => "GridShapeMismatch",
        }
    }

    fn unknown(entity: &str, id: &str) -> Self {
        MatrixError::UnknownReference {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// ==========================================
// 稠密网格结构
// ==========================================

/// 网格列（对应一个区间）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub interval_id: String,
    pub sequence_order: u32,
    pub hours: f64,
    pub kilometers: f64,
}

/// 网格行（对应一个作业）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub activity_id: String,
    pub code: String,
    pub description: String,
    /// 与 columns 一一对应
    pub cells: Vec<bool>,
}

/// 类别分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseGrid {
    pub plan_id: String,
    pub columns: Vec<GridColumn>,
    pub groups: Vec<CategoryGroup>,
}

impl DenseGrid {
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// 按 (activity_id, interval_id) 读取单元格
    pub fn cell(&self, activity_id: &str, interval_id: &str) -> Option<bool> {
        let col = self
            .columns
            .iter()
            .position(|c| c.interval_id == interval_id)?;
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .find(|r| r.activity_id == activity_id)
            .and_then(|r| r.cells.get(col).copied())
    }
}

/// 单元格差异
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDiff {
    pub activity_id: String,
    pub interval_id: String,
    pub old_value: bool,
    pub new_value: bool,
}

impl CellDiff {
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

// ==========================================
// MatrixView - 矩阵视图引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MatrixView;

impl MatrixView {
    pub fn new() -> Self {
        Self
    }

    /// 稀疏 → 稠密
    ///
    /// - 行: 作业按类别首次出现顺序分组，组内按作业顺序
    /// - 列: 区间按 sequence_order
    /// - 矩阵中不存在的条目渲染为 false
    #[instrument(skip(self, plan), fields(plan_id = %plan.plan_id))]
    pub fn to_dense_grid(&self, plan: &Plan) -> DenseGrid {
        let mut intervals: Vec<_> = plan.intervals.iter().collect();
        intervals.sort_by_key(|i| i.sequence_order);

        let columns: Vec<GridColumn> = intervals
            .iter()
            .map(|i| GridColumn {
                interval_id: i.interval_id.clone(),
                sequence_order: i.sequence_order,
                hours: i.hours,
                kilometers: i.kilometers,
            })
            .collect();

        let mut activities: Vec<_> = plan.activities.iter().collect();
        activities.sort_by_key(|a| a.sequence_order);

        let mut groups: Vec<CategoryGroup> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();
        for activity in activities {
            let row = GridRow {
                activity_id: activity.activity_id.clone(),
                code: activity.code.clone(),
                description: activity.description.clone(),
                cells: columns
                    .iter()
                    .map(|c| plan.matrix.applies(&activity.activity_id, &c.interval_id))
                    .collect(),
            };
            let idx = *group_index
                .entry(activity.category.as_str())
                .or_insert_with(|| {
                    groups.push(CategoryGroup {
                        category: activity.category.clone(),
                        rows: Vec::new(),
                    });
                    groups.len() - 1
                });
            groups[idx].rows.push(row);
        }

        debug!(columns = columns.len(), groups = groups.len(), "稠密网格生成完成");
        DenseGrid {
            plan_id: plan.plan_id.clone(),
            columns,
            groups,
        }
    }

    /// 稠密 → 稀疏
    ///
    /// 网格的列与行必须全部引用本计划，单元格数必须等于列数
    pub fn to_sparse(
        &self,
        plan: &Plan,
        grid: &DenseGrid,
    ) -> Result<ApplicabilityMatrix, MatrixError> {
        for column in &grid.columns {
            if plan.interval(&column.interval_id).is_none() {
                return Err(MatrixError::unknown("Interval", &column.interval_id));
            }
        }

        let mut matrix = ApplicabilityMatrix::new();
        for row in grid.groups.iter().flat_map(|g| g.rows.iter()) {
            if plan.activity(&row.activity_id).is_none() {
                return Err(MatrixError::unknown("Activity", &row.activity_id));
            }
            if row.cells.len() != grid.columns.len() {
                return Err(MatrixError::GridShapeMismatch {
                    message: format!(
                        "作业 {} 有 {} 个单元格，网格有 {} 列",
                        row.code,
                        row.cells.len(),
                        grid.columns.len()
                    ),
                });
            }
            for (column, applies) in grid.columns.iter().zip(&row.cells) {
                if *applies {
                    matrix.set(&row.activity_id, &column.interval_id, true);
                }
            }
        }
        Ok(matrix)
    }

    /// 稠密网格相对计划的变更（仅含实际变化的单元格）
    pub fn diff(&self, plan: &Plan, grid: &DenseGrid) -> Result<Vec<CellDiff>, MatrixError> {
        let target = self.to_sparse(plan, grid)?;
        let mut diffs = Vec::new();
        for row in grid.groups.iter().flat_map(|g| g.rows.iter()) {
            for column in &grid.columns {
                let old_value = plan.applies(&row.activity_id, &column.interval_id);
                let new_value = target.applies(&row.activity_id, &column.interval_id);
                if old_value != new_value {
                    diffs.push(CellDiff {
                        activity_id: row.activity_id.clone(),
                        interval_id: column.interval_id.clone(),
                        old_value,
                        new_value,
                    });
                }
            }
        }
        Ok(diffs)
    }

    /// 单元格编辑
    ///
    /// # 错误
    /// - activity_id / interval_id 不属于本计划 → UnknownReference（计划不变）
    pub fn apply_edit(
        &self,
        plan: &mut Plan,
        activity_id: &str,
        interval_id: &str,
        new_value: bool,
    ) -> Result<CellDiff, MatrixError> {
        if plan.activity(activity_id).is_none() {
            return Err(MatrixError::unknown("Activity", activity_id));
        }
        if plan.interval(interval_id).is_none() {
            return Err(MatrixError::unknown("Interval", interval_id));
        }

        let old_value = plan.matrix.set(activity_id, interval_id, new_value);
        Ok(CellDiff {
            activity_id: activity_id.to_string(),
            interval_id: interval_id.to_string(),
            old_value,
            new_value,
        })
    }
}
