// ==========================================
// 车队维保系统 - 计划归一化器
// ==========================================
// 职责: 区间 + 已分类作业 → 校验后的 Plan 聚合
// 校验顺序: 区间非空 → 作业非空 → 作业编码唯一
// 提示: 所有区间均不适用的作业保留，并给出 WarnUnusedActivity
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{Activity, ApplicabilityMatrix, Interval, Plan, PlanIdentity};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::interval_parser::ParsedInterval;
use crate::importer::row_classifier::ClassifiedActivity;
use crate::importer::warning::ImportWarning;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// 归一化结果
#[derive(Debug, Clone)]
pub struct NormalizedPlan {
    pub plan: Plan,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Clone)]
pub struct PlanNormalizer {
    // 编码所在列，用于错误定位
    code_column: usize,
}

impl Default for PlanNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanNormalizer {
    pub fn new() -> Self {
        Self { code_column: 1 }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            code_column: config.code_column,
        }
    }

    /// 组装 Plan
    ///
    /// # 参数
    /// - intervals: 存活区间（已按列序编号）
    /// - activities: 已分类作业，marks 与 intervals 对齐
    ///
    /// # 错误
    /// - 无存活区间 / 无作业 → EmptySchedule
    /// - 编码重复 → DuplicateActivityCode（报告第二次出现的行与编码列）
    pub fn normalize(
        &self,
        identity: &PlanIdentity,
        intervals: &[ParsedInterval],
        activities: &[ClassifiedActivity],
    ) -> ImportResult<NormalizedPlan> {
        if intervals.is_empty() {
            return Err(ImportError::EmptySchedule {
                reason: "没有可解析的保养区间".to_string(),
            });
        }
        if activities.is_empty() {
            return Err(ImportError::EmptySchedule {
                reason: "表头下方没有识别到任何作业行".to_string(),
            });
        }

        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(activities.len());
        for activity in activities {
            if let Some(first_row) = seen.insert(activity.code.as_str(), activity.row) {
                return Err(ImportError::DuplicateActivityCode {
                    code: activity.code.clone(),
                    first_row,
                    row: activity.row,
                    column: self.code_column,
                });
            }
        }

        let domain_intervals: Vec<Interval> = intervals
            .iter()
            .enumerate()
            .map(|(idx, parsed)| Interval {
                interval_id: Uuid::new_v4().to_string(),
                hours: parsed.hours,
                kilometers: parsed.kilometers,
                sequence_order: idx as u32 + 1,
            })
            .collect();

        let mut matrix = ApplicabilityMatrix::new();
        let mut warnings = Vec::new();
        let mut domain_activities = Vec::with_capacity(activities.len());

        for (idx, classified) in activities.iter().enumerate() {
            let activity_id = Uuid::new_v4().to_string();

            let mut any_applies = false;
            for (interval, applies) in domain_intervals.iter().zip(&classified.marks) {
                if *applies {
                    matrix.set(&activity_id, &interval.interval_id, true);
                    any_applies = true;
                }
            }
            if !any_applies {
                warnings.push(ImportWarning::UnusedActivity {
                    row: classified.row,
                    code: classified.code.clone(),
                });
            }

            domain_activities.push(Activity {
                activity_id,
                code: classified.code.clone(),
                description: classified.description.clone(),
                category: classified.category.clone(),
                sequence_order: idx as u32 + 1,
            });
        }

        let plan = Plan {
            plan_id: Uuid::new_v4().to_string(),
            vehicle_type: identity.vehicle_type.clone(),
            name: identity.name.clone(),
            is_active: true,
            revision: 1,
            intervals: domain_intervals,
            activities: domain_activities,
            matrix,
        };

        info!(
            identity = %identity,
            intervals = plan.intervals.len(),
            activities = plan.activities.len(),
            entries = plan.matrix.len(),
            "计划归一化完成"
        );

        Ok(NormalizedPlan { plan, warnings })
    }
}
