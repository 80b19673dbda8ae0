// ==========================================
// 车队维保系统 - 单元格网格
// ==========================================
// 职责: 表格读取器输出的矩形网格（1 起始坐标）
// 说明: 越界读取返回空单元格，调用方无需做边界判断
// ==========================================

use crate::config::ImportConfig;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 原始单元格值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// 空字符串视为空单元格
    pub fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }

    /// 统一转为去空白的文本记号
    ///
    /// 整数值的数字单元格不带小数部分（1.0 → "1"），布尔值转为 "1"/"0"
    pub fn as_token(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(true) => "1".to_string(),
            CellValue::Bool(false) => "0".to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

impl From<&str> for CellValue {
    fn from(raw: &str) -> Self {
        CellValue::from_text(raw)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// ==========================================
// GridLimits - 网格尺寸上限
// ==========================================
// 读取器在分配网格之前检查，超出即 ScheduleTooLarge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLimits {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl GridLimits {
    pub fn new(max_rows: usize, max_cols: usize) -> Self {
        Self { max_rows, max_cols }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.max_rows, config.max_cols)
    }

    /// 检查 rows × cols 是否在上限之内
    pub fn check(&self, rows: usize, cols: usize) -> ImportResult<()> {
        if rows > self.max_rows || cols > self.max_cols {
            return Err(ImportError::ScheduleTooLarge {
                rows,
                cols,
                max_rows: self.max_rows,
                max_cols: self.max_cols,
            });
        }
        Ok(())
    }
}

// ==========================================
// CellGrid - 矩形网格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGrid {
    row_count: usize,
    col_count: usize,
    cells: Vec<CellValue>,
}

impl CellGrid {
    /// 创建指定大小的空网格
    pub fn with_size(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
            cells: vec![CellValue::Empty; row_count * col_count],
        }
    }

    /// 从 A1 开始的行数据构建（行长度不一致时补空）
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self::from_rows_at(1, 1, rows)
    }

    /// 从指定起点 (first_row, first_col) 开始的行数据构建
    ///
    /// 起点之前的行列填充为空，保证坐标与原表格一致
    pub fn from_rows_at(first_row: usize, first_col: usize, rows: Vec<Vec<CellValue>>) -> Self {
        let first_row = first_row.max(1);
        let first_col = first_col.max(1);
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return Self::default();
        }

        let mut grid = Self::with_size(first_row - 1 + rows.len(), first_col - 1 + width);
        for (r_idx, row) in rows.into_iter().enumerate() {
            for (c_idx, value) in row.into_iter().enumerate() {
                grid.set(first_row + r_idx, first_col + c_idx, value);
            }
        }
        grid
    }

    /// 测试/脚本便捷构建：纯文本行
    pub fn from_text_rows<R, S>(rows: &[R]) -> Self
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self::from_rows(
            rows.iter()
                .map(|row| {
                    row.as_ref()
                        .iter()
                        .map(|cell| CellValue::from_text(cell.as_ref()))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row == 0 || col == 0 || row > self.row_count || col > self.col_count {
            None
        } else {
            Some((row - 1) * self.col_count + (col - 1))
        }
    }

    /// 读取单元格（1 起始；越界返回空）
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.index(row, col)
            .map(|idx| &self.cells[idx])
            .unwrap_or(&EMPTY_CELL)
    }

    /// 写入单元格（越界写入被忽略）
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(idx) = self.index(row, col) {
            self.cells[idx] = value;
        }
    }

    /// 整行是否全空
    pub fn is_row_blank(&self, row: usize) -> bool {
        (1..=self.col_count).all(|col| self.get(row, col).is_blank())
    }
}
