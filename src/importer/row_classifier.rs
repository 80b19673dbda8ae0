// ==========================================
// 车队维保系统 - 作业行分类器
// ==========================================
// 职责: 逐行判定 类别行 / 作业行 / 跳过
// 状态: "当前类别" 作为显式折叠累加器 (RowFold) 在行间传递
// 终止: 连续 N 个整行空白视为表格结束
// ==========================================

use crate::config::{ImportConfig, OrphanActivityPolicy};
use crate::domain::code_prefix;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::CellGrid;
use crate::importer::interval_parser::ParsedInterval;
use crate::importer::mark_interpreter::{MarkInterpreter, MarkReading};
use crate::importer::warning::ImportWarning;
use regex::Regex;
use tracing::{debug, info, warn};

const CATEGORY_PATTERN: &str = r"^[A-Z]+$";
const ACTIVITY_PATTERN: &str = r"^[A-Z]+\.[0-9]+$";

// ==========================================
// RowClass - 单行分类结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    CategoryHeader { category: String, label: String },
    ActivityRow { code: String, description: String },
    Skip,
}

// ==========================================
// ClassifiedActivity - 已分类作业行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedActivity {
    pub row: usize,
    pub code: String,
    pub description: String,
    pub category: String,
    /// 与存活区间一一对应的适用标记
    pub marks: Vec<bool>,
}

// ==========================================
// RowFold - 行折叠累加器
// ==========================================
#[derive(Debug, Default)]
struct RowFold {
    current_category: Option<String>,
    activities: Vec<ClassifiedActivity>,
    warnings: Vec<ImportWarning>,
}

// ==========================================
// ActivityRowClassifier
// ==========================================
#[derive(Debug, Clone)]
pub struct ActivityRowClassifier {
    code_column: usize,
    description_column: usize,
    blank_rows_end_of_table: usize,
    orphan_policy: OrphanActivityPolicy,
    marks: MarkInterpreter,
    category_re: Regex,
    activity_re: Regex,
}

impl ActivityRowClassifier {
    pub fn from_config(config: &ImportConfig) -> ImportResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ImportError::InternalError(format!("编码正则编译失败: {}", e)))
        };
        Ok(Self {
            code_column: config.code_column,
            description_column: config.description_column,
            blank_rows_end_of_table: config.blank_rows_end_of_table.max(1),
            orphan_policy: config.orphan_activity_policy,
            marks: MarkInterpreter::new(&config.mark_vocabulary),
            category_re: compile(CATEGORY_PATTERN)?,
            activity_re: compile(ACTIVITY_PATTERN)?,
        })
    }

    /// 判定单行类别（不依赖上下文）
    pub fn classify_row(&self, grid: &CellGrid, row: usize) -> RowClass {
        let code = grid.get(row, self.code_column).as_token().to_uppercase();
        let description = grid.get(row, self.description_column).as_token();

        if self.activity_re.is_match(&code) && !description.is_empty() {
            RowClass::ActivityRow { code, description }
        } else if self.category_re.is_match(&code) {
            RowClass::CategoryHeader {
                category: code,
                label: description,
            }
        } else {
            RowClass::Skip
        }
    }

    /// 表格结束行（不含）：从 first_row 起遇到连续 N 个空行即截止
    pub fn table_end(&self, grid: &CellGrid, first_row: usize) -> usize {
        let mut blank_run = 0;
        for row in first_row..=grid.row_count() {
            if grid.is_row_blank(row) {
                blank_run += 1;
                if blank_run >= self.blank_rows_end_of_table {
                    return row + 1 - blank_run;
                }
            } else {
                blank_run = 0;
            }
        }
        grid.row_count() + 1
    }

    /// 分类表体并读取适用标记
    ///
    /// # 参数
    /// - first_row: 表体起始行（公里行的下一行）
    /// - intervals: 存活区间（决定读取哪些列）
    ///
    /// # 错误
    /// - 孤儿作业行且策略为 Reject → OrphanActivityRow
    pub fn classify(
        &self,
        grid: &CellGrid,
        first_row: usize,
        intervals: &[ParsedInterval],
    ) -> ImportResult<(Vec<ClassifiedActivity>, Vec<ImportWarning>)> {
        let end = self.table_end(grid, first_row);

        let fold = (first_row..end).try_fold(RowFold::default(), |fold, row| {
            self.fold_row(fold, grid, row, intervals)
        })?;

        info!(
            rows = end.saturating_sub(first_row),
            activities = fold.activities.len(),
            warnings = fold.warnings.len(),
            "作业行分类完成"
        );
        Ok((fold.activities, fold.warnings))
    }

    fn fold_row(
        &self,
        mut fold: RowFold,
        grid: &CellGrid,
        row: usize,
        intervals: &[ParsedInterval],
    ) -> ImportResult<RowFold> {
        match self.classify_row(grid, row) {
            RowClass::CategoryHeader { category, label } => {
                debug!(row, category = %category, label = %label, "类别行");
                fold.current_category = Some(category);
            }
            RowClass::ActivityRow { code, description } => {
                let prefix = code_prefix(&code).to_string();
                let category = match &fold.current_category {
                    Some(current) => {
                        if *current != prefix {
                            warn!(
                                row,
                                code = %code,
                                category = %current,
                                "作业编码前缀与当前类别不一致"
                            );
                            fold.warnings.push(ImportWarning::CategoryMismatch {
                                row,
                                code: code.clone(),
                                code_prefix: prefix,
                                category: current.clone(),
                            });
                        }
                        current.clone()
                    }
                    None => match self.orphan_policy {
                        OrphanActivityPolicy::Reject => {
                            return Err(ImportError::OrphanActivityRow {
                                row,
                                column: self.code_column,
                                code,
                            });
                        }
                        OrphanActivityPolicy::Tolerate => {
                            fold.warnings
                                .push(ImportWarning::ActivityBeforeCategoryHeader {
                                    row,
                                    code: code.clone(),
                                });
                            prefix
                        }
                    },
                };

                let marks = intervals
                    .iter()
                    .map(|interval| {
                        let cell = grid.get(row, interval.column);
                        let reading = self.marks.read(cell);
                        if reading == MarkReading::AmbiguousApplies {
                            fold.warnings
                                .push(ImportWarning::AmbiguousMarkNormalizedToApplies {
                                    row,
                                    column: interval.column,
                                    token: cell.as_token(),
                                });
                        }
                        reading.applies()
                    })
                    .collect();

                fold.activities.push(ClassifiedActivity {
                    row,
                    code,
                    description,
                    category,
                    marks,
                });
            }
            RowClass::Skip => {}
        }
        Ok(fold)
    }
}
