// ==========================================
// 车队维保系统 - 导入层
// ==========================================
// 职责: 表格 → 校验后的保养计划
// 支持: Excel, CSV
// 流程: 表头定位 → 区间解析 → 行分类 + 标记解释 → 归一化 → 落库
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod grid;
pub mod header_locator;
pub mod interval_parser;
pub mod mark_interpreter;
pub mod plan_normalizer;
pub mod row_classifier;
pub mod schedule_importer_impl;
pub mod schedule_importer_trait;
pub mod schedule_pipeline;
pub mod warning;

// 重导出核心类型
pub use error::{ImportError, ImportErrorKind, ImportResult};
pub use file_parser::{CsvGridReader, ExcelGridReader, UniversalGridReader};
pub use grid::{CellGrid, CellValue, GridLimits};
pub use header_locator::{HeaderBlock, HeaderLocator, IntervalCandidate};
pub use interval_parser::{IntervalParser, ParsedInterval};
pub use mark_interpreter::{MarkInterpreter, MarkReading};
pub use plan_normalizer::{NormalizedPlan, PlanNormalizer};
pub use row_classifier::{ActivityRowClassifier, ClassifiedActivity, RowClass};
pub use schedule_importer_impl::ScheduleImporterImpl;
pub use schedule_pipeline::{ImportOutcome, SchedulePipeline};
pub use warning::ImportWarning;

// 重导出 Trait 接口
pub use schedule_importer_trait::{GridReader, ScheduleImportResult, ScheduleImporter};
