// ==========================================
// 车队维保系统 - 保养计划导入管道（纯变换）
// ==========================================
// 流程: 尺寸检查 → 表头定位 → 区间解析 → 行分类 → 归一化
// 红线: 无 I/O，无落库；同一输入总是得到同一结构
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{Plan, PlanIdentity};
use crate::importer::error::ImportResult;
use crate::importer::grid::{CellGrid, GridLimits};
use crate::importer::header_locator::HeaderLocator;
use crate::importer::interval_parser::IntervalParser;
use crate::importer::plan_normalizer::PlanNormalizer;
use crate::importer::row_classifier::ActivityRowClassifier;
use crate::importer::warning::ImportWarning;
use tracing::{info, instrument};

/// 管道输出：计划 + 全部提示（按阶段顺序）
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub plan: Plan,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Clone)]
pub struct SchedulePipeline {
    config: ImportConfig,
    locator: HeaderLocator,
    parser: IntervalParser,
    classifier: ActivityRowClassifier,
    normalizer: PlanNormalizer,
}

impl SchedulePipeline {
    /// 校验配置并装配各阶段组件
    pub fn new(config: ImportConfig) -> ImportResult<Self> {
        config.validate()?;
        Ok(Self {
            locator: HeaderLocator::from_config(&config),
            parser: IntervalParser::from_config(&config),
            classifier: ActivityRowClassifier::from_config(&config)?,
            normalizer: PlanNormalizer::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 读取器使用的尺寸上限
    pub fn limits(&self) -> GridLimits {
        GridLimits::from_config(&self.config)
    }

    pub fn interval_parser(&self) -> &IntervalParser {
        &self.parser
    }

    /// 执行纯变换
    #[instrument(skip(self, grid, identity), fields(
        identity = %identity,
        rows = grid.row_count(),
        cols = grid.col_count()
    ))]
    pub fn run(&self, grid: &CellGrid, identity: &PlanIdentity) -> ImportResult<ImportOutcome> {
        // 阶段 0: 尺寸上限
        self.limits().check(grid.row_count(), grid.col_count())?;

        // 阶段 1: 表头
        let header = self.locator.locate(
            grid,
            self.config.header_scan_rows,
            self.config.header_scan_cols,
        )?;

        // 阶段 2: 区间
        let (intervals, mut warnings) = self.parser.build_intervals(&header)?;

        // 阶段 3: 作业行
        let (activities, row_warnings) =
            self.classifier
                .classify(grid, header.first_body_row(), &intervals)?;
        warnings.extend(row_warnings);

        // 阶段 4: 归一化
        let normalized = self.normalizer.normalize(identity, &intervals, &activities)?;
        warnings.extend(normalized.warnings);

        info!(
            intervals = normalized.plan.intervals.len(),
            activities = normalized.plan.activities.len(),
            warnings = warnings.len(),
            "导入管道完成"
        );

        Ok(ImportOutcome {
            plan: normalized.plan,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;

    fn pipeline() -> SchedulePipeline {
        SchedulePipeline::new(ImportConfig::default()).unwrap()
    }

    fn identity() -> PlanIdentity {
        PlanIdentity::new("CAMION", "Base")
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = ImportConfig {
            max_rows: 0,
            ..ImportConfig::default()
        };
        assert!(matches!(
            SchedulePipeline::new(config),
            Err(ImportError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_too_large_fails_fast() {
        let config = ImportConfig {
            max_rows: 3,
            ..ImportConfig::default()
        };
        let pipeline = SchedulePipeline::new(config).unwrap();
        let grid = CellGrid::with_size(4, 3);
        let err = pipeline.run(&grid, &identity()).unwrap_err();
        assert_eq!(err.code(), "ScheduleTooLargeError");
    }

    #[test]
    fn test_header_not_found_on_blank_grid() {
        let grid = CellGrid::with_size(5, 5);
        let err = pipeline().run(&grid, &identity()).unwrap_err();
        assert!(matches!(err, ImportError::ScheduleHeaderNotFound { .. }));
    }

    #[test]
    fn test_all_columns_discarded_is_empty_schedule() {
        let grid = CellGrid::from_text_rows(&[
            vec!["", "", "1.5h", "abc"],
            vec!["", "", "1000km", "2000km"],
            vec!["A", "Motor", "", ""],
            vec!["A.1", "Oil", "√", "√"],
        ]);
        let err = pipeline().run(&grid, &identity()).unwrap_err();
        assert!(matches!(err, ImportError::EmptySchedule { .. }));
    }

    #[test]
    fn test_warnings_collected_across_stages() {
        let grid = CellGrid::from_text_rows(&[
            vec!["", "", "abc", "200h"],
            vec!["", "", "1000km", "2000km"],
            vec!["A", "Motor", "", ""],
            vec!["A.1", "Oil", "", "?"],
            vec!["A.2", "Filter", "", ""],
        ]);
        let outcome = pipeline().run(&grid, &identity()).unwrap();
        let codes: Vec<&str> = outcome.warnings.iter().map(|w| w.code()).collect();
        assert_eq!(
            codes,
            vec![
                "DiscardedInvalidIntervalColumn",
                "AmbiguousMarkNormalizedToApplies",
                "WarnUnusedActivity"
            ]
        );
        assert_eq!(outcome.plan.intervals.len(), 1);
    }
}
