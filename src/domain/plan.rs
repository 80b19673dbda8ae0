// ==========================================
// 车队维保系统 - 保养计划领域模型
// ==========================================
// 聚合根: Plan = 区间集合 + 作业集合 + 稀疏适用矩阵
// 红线: 矩阵只保存 true，缺省即"不适用"
// 红线: 矩阵条目引用的区间/作业必须属于同一计划修订
// ==========================================

use crate::domain::types::PlanIdentity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ==========================================
// Interval - 保养区间
// ==========================================
// 仅在导入时创建，修订内不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub interval_id: String, // 区间ID
    pub hours: f64,          // 小时阈值 (>= 0)
    pub kilometers: f64,     // 公里阈值 (>= 0)
    pub sequence_order: u32, // 顺序号 (1 起始，按列位置分配)
}

// ==========================================
// Activity - 保养作业
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: String, // 作业ID
    pub code: String,        // 作业编码 (如 A.1)
    pub description: String, // 作业描述
    pub category: String,    // 所属类别 (编码字母前缀 / 类别行)
    pub sequence_order: u32, // 表内顺序号 (1 起始)
}

impl Activity {
    /// 编码的字母前缀 ("A.1" → "A")
    pub fn code_prefix(&self) -> &str {
        code_prefix(&self.code)
    }
}

/// 取编码开头的连续字母
pub fn code_prefix(code: &str) -> &str {
    let end = code
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(idx, _)| idx)
        .unwrap_or(code.len());
    &code[..end]
}

// ==========================================
// ActivityApplicability - 矩阵单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityApplicability {
    pub activity_id: String,
    pub interval_id: String,
    pub applies: bool,
}

// ==========================================
// ApplicabilityMatrix - 稀疏适用矩阵
// ==========================================
// 每个 (activity_id, interval_id) 至多一条；不存在 = false
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicabilityMatrix {
    cells: BTreeSet<(String, String)>,
}

impl ApplicabilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applies(&self, activity_id: &str, interval_id: &str) -> bool {
        self.cells
            .contains(&(activity_id.to_string(), interval_id.to_string()))
    }

    /// 设置单元格，返回修改前的值
    ///
    /// false 会移除条目，保持矩阵稀疏
    pub fn set(&mut self, activity_id: &str, interval_id: &str, applies: bool) -> bool {
        let key = (activity_id.to_string(), interval_id.to_string());
        if applies {
            !self.cells.insert(key)
        } else {
            self.cells.remove(&key)
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 遍历所有已存条目（均为 applies = true）
    pub fn entries(&self) -> impl Iterator<Item = ActivityApplicability> + '_ {
        self.cells
            .iter()
            .map(|(activity_id, interval_id)| ActivityApplicability {
                activity_id: activity_id.clone(),
                interval_id: interval_id.clone(),
                applies: true,
            })
    }

    /// 某作业适用的区间数
    pub fn count_for_activity(&self, activity_id: &str) -> usize {
        self.cells
            .iter()
            .filter(|(a, _)| a == activity_id)
            .count()
    }
}

// ==========================================
// Plan - 保养计划（聚合根）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,                // 计划ID
    pub vehicle_type: String,           // 车型
    pub name: String,                   // 计划名称
    pub is_active: bool,                // 是否启用
    pub revision: i32,                  // 修订号 (每次整体导入 +1)
    pub intervals: Vec<Interval>,       // 区间 (按 sequence_order)
    pub activities: Vec<Activity>,      // 作业 (按 sequence_order)
    pub matrix: ApplicabilityMatrix,    // 稀疏适用矩阵
}

impl Plan {
    pub fn identity(&self) -> PlanIdentity {
        PlanIdentity::new(&self.vehicle_type, &self.name)
    }

    pub fn interval(&self, interval_id: &str) -> Option<&Interval> {
        self.intervals.iter().find(|i| i.interval_id == interval_id)
    }

    pub fn activity(&self, activity_id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.activity_id == activity_id)
    }

    pub fn interval_by_order(&self, sequence_order: u32) -> Option<&Interval> {
        self.intervals
            .iter()
            .find(|i| i.sequence_order == sequence_order)
    }

    pub fn activity_by_code(&self, code: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.code == code)
    }

    pub fn applies(&self, activity_id: &str, interval_id: &str) -> bool {
        self.matrix.applies(activity_id, interval_id)
    }

    /// 在指定区间适用的作业（按作业顺序）
    pub fn activities_at(&self, interval_id: &str) -> Vec<&Activity> {
        let mut activities: Vec<&Activity> = self
            .activities
            .iter()
            .filter(|a| self.matrix.applies(&a.activity_id, interval_id))
            .collect();
        activities.sort_by_key(|a| a.sequence_order);
        activities
    }

    /// 校验矩阵引用完整性
    ///
    /// # 返回
    /// - Ok(()): 所有条目都引用本计划内的区间与作业
    /// - Err(String): 第一个越界条目的描述
    pub fn validate_references(&self) -> Result<(), String> {
        let interval_ids: HashSet<&str> = self
            .intervals
            .iter()
            .map(|i| i.interval_id.as_str())
            .collect();
        let activity_ids: HashSet<&str> = self
            .activities
            .iter()
            .map(|a| a.activity_id.as_str())
            .collect();

        for entry in self.matrix.entries() {
            if !activity_ids.contains(entry.activity_id.as_str()) {
                return Err(format!(
                    "矩阵条目引用了计划外的作业: activity_id={}",
                    entry.activity_id
                ));
            }
            if !interval_ids.contains(entry.interval_id.as_str()) {
                return Err(format!(
                    "矩阵条目引用了计划外的区间: interval_id={}",
                    entry.interval_id
                ));
            }
        }
        Ok(())
    }
}

// ==========================================
// PlanSummary - 计划列表摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub vehicle_type: String,
    pub name: String,
    pub is_active: bool,
    pub revision: i32,
    pub intervals_count: usize,
    pub activities_count: usize,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        let mut matrix = ApplicabilityMatrix::new();
        matrix.set("a1", "i1", true);
        matrix.set("a2", "i2", true);
        Plan {
            plan_id: "P001".to_string(),
            vehicle_type: "CAMION".to_string(),
            name: "Base".to_string(),
            is_active: true,
            revision: 1,
            intervals: vec![
                Interval {
                    interval_id: "i1".to_string(),
                    hours: 100.0,
                    kilometers: 1000.0,
                    sequence_order: 1,
                },
                Interval {
                    interval_id: "i2".to_string(),
                    hours: 200.0,
                    kilometers: 2000.0,
                    sequence_order: 2,
                },
            ],
            activities: vec![
                Activity {
                    activity_id: "a2".to_string(),
                    code: "A.2".to_string(),
                    description: "Filtro".to_string(),
                    category: "A".to_string(),
                    sequence_order: 2,
                },
                Activity {
                    activity_id: "a1".to_string(),
                    code: "A.1".to_string(),
                    description: "Aceite".to_string(),
                    category: "A".to_string(),
                    sequence_order: 1,
                },
            ],
            matrix,
        }
    }

    #[test]
    fn test_code_prefix() {
        assert_eq!(code_prefix("A.1"), "A");
        assert_eq!(code_prefix("MT.12"), "MT");
        assert_eq!(code_prefix("B"), "B");
        assert_eq!(code_prefix("1.2"), "");
    }

    #[test]
    fn test_matrix_set_returns_previous_value() {
        let mut matrix = ApplicabilityMatrix::new();
        assert!(!matrix.set("a", "i", true));
        assert!(matrix.set("a", "i", true));
        assert_eq!(matrix.len(), 1);

        assert!(matrix.set("a", "i", false));
        assert!(!matrix.set("a", "i", false));
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_false_is_never_stored() {
        let mut matrix = ApplicabilityMatrix::new();
        matrix.set("a", "i1", false);
        matrix.set("a", "i2", true);
        assert_eq!(matrix.len(), 1);
        assert!(matrix.entries().all(|e| e.applies));
        assert_eq!(matrix.count_for_activity("a"), 1);
    }

    #[test]
    fn test_plan_lookups() {
        let plan = sample_plan();
        assert_eq!(plan.interval_by_order(2).unwrap().interval_id, "i2");
        assert_eq!(plan.activity_by_code("A.1").unwrap().activity_id, "a1");
        assert!(plan.applies("a1", "i1"));
        assert!(!plan.applies("a1", "i2"));
        let at_i1 = plan.activities_at("i1");
        assert_eq!(at_i1.len(), 1);
        assert_eq!(at_i1[0].code, "A.1");
    }

    #[test]
    fn test_validate_references() {
        let mut plan = sample_plan();
        assert!(plan.validate_references().is_ok());

        plan.matrix.set("ghost", "i1", true);
        let err = plan.validate_references().unwrap_err();
        assert!(err.contains("ghost"));
    }
}
