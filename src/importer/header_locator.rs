// ==========================================
// 车队维保系统 - 表头定位器
// ==========================================
// 职责: 在有界窗口内找到相邻的 "小时行" 与 "公里行"
// 输出: 候选区间列 (列号, 小时记号, 公里记号)，按列升序
// 说明: 候选列是否有效由 IntervalParser 判定，这里只看形态
// ==========================================

use crate::config::ImportConfig;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::{CellGrid, CellValue};
use crate::importer::interval_parser::{normalize_suffixes, normalize_token, strip_unit_suffix};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ==========================================
// IntervalCandidate - 候选区间列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalCandidate {
    pub column: usize,
    pub hours_token: CellValue,
    pub km_token: CellValue,
}

// ==========================================
// HeaderBlock - 表头块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub hours_row: usize,
    pub km_row: usize,
    pub candidates: Vec<IntervalCandidate>,
}

impl HeaderBlock {
    /// 作业行从公里行之后开始
    pub fn first_body_row(&self) -> usize {
        self.km_row + 1
    }
}

// ==========================================
// HeaderLocator
// ==========================================
#[derive(Debug, Clone)]
pub struct HeaderLocator {
    hours_suffixes: Vec<String>,
    km_suffixes: Vec<String>,
    first_interval_column: usize,
}

impl HeaderLocator {
    pub fn new(
        hours_suffixes: &[String],
        km_suffixes: &[String],
        first_interval_column: usize,
    ) -> Self {
        Self {
            hours_suffixes: normalize_suffixes(hours_suffixes),
            km_suffixes: normalize_suffixes(km_suffixes),
            first_interval_column: first_interval_column.max(1),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(
            &config.hours_suffixes,
            &config.km_suffixes,
            config.first_interval_column(),
        )
    }

    /// 在窗口内定位表头块
    ///
    /// # 规则
    /// - 扫描前 max_scan_rows 行、前 max_scan_cols 列
    /// - 第 r 行某列为小时记号，且第 r+1 行同列为公里记号 → 命中
    /// - 命中后返回两行中任一行非空的所有列
    ///
    /// # 错误
    /// - 窗口内无命中 → ScheduleHeaderNotFound
    pub fn locate(
        &self,
        grid: &CellGrid,
        max_scan_rows: usize,
        max_scan_cols: usize,
    ) -> ImportResult<HeaderBlock> {
        let last_row = grid.row_count().min(max_scan_rows);
        let last_col = grid.col_count().min(max_scan_cols);

        let hours_row = (1..last_row).find(|&row| {
            (self.first_interval_column..=last_col).any(|col| {
                self.is_hours_like(grid.get(row, col)) && self.is_km_like(grid.get(row + 1, col))
            })
        });

        let hours_row = match hours_row {
            Some(row) => row,
            None => {
                debug!(last_row, last_col, "扫描窗口内未命中表头");
                return Err(ImportError::ScheduleHeaderNotFound {
                    scanned_rows: last_row,
                    scanned_cols: last_col,
                });
            }
        };
        let km_row = hours_row + 1;

        let candidates: Vec<IntervalCandidate> = (self.first_interval_column..=last_col)
            .filter_map(|column| {
                let hours_token = grid.get(hours_row, column);
                let km_token = grid.get(km_row, column);
                if hours_token.is_blank() && km_token.is_blank() {
                    None
                } else {
                    Some(IntervalCandidate {
                        column,
                        hours_token: hours_token.clone(),
                        km_token: km_token.clone(),
                    })
                }
            })
            .collect();

        info!(
            hours_row,
            km_row,
            candidates = candidates.len(),
            "表头定位成功"
        );

        Ok(HeaderBlock {
            hours_row,
            km_row,
            candidates,
        })
    }

    fn is_hours_like(&self, cell: &CellValue) -> bool {
        is_unit_token(cell, &self.hours_suffixes)
    }

    fn is_km_like(&self, cell: &CellValue) -> bool {
        is_unit_token(cell, &self.km_suffixes)
    }
}

/// 文本记号带单位后缀，且后缀前紧邻数字
fn is_unit_token(cell: &CellValue, suffixes: &[String]) -> bool {
    let text = match cell {
        CellValue::Text(s) => normalize_token(s),
        _ => return false,
    };
    strip_unit_suffix(&text, suffixes)
        .and_then(|rest| rest.chars().last())
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> HeaderLocator {
        HeaderLocator::from_config(&ImportConfig::default())
    }

    fn grid(rows: &[&[&str]]) -> CellGrid {
        CellGrid::from_text_rows(rows)
    }

    #[test]
    fn test_locate_returns_candidates_in_column_order() {
        let g = grid(&[
            &["Plan de mantenimiento", "", "", "", ""],
            &["", "", "100h", "200h", "300h"],
            &["", "", "1000km", "2000km", "3000km"],
            &["A", "Motor", "", "", ""],
        ]);
        let block = locator().locate(&g, 30, 200).unwrap();

        assert_eq!(block.hours_row, 2);
        assert_eq!(block.km_row, 3);
        assert_eq!(block.first_body_row(), 4);
        let columns: Vec<usize> = block.candidates.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![3, 4, 5]);
        assert_eq!(block.candidates[0].hours_token.as_token(), "100h");
    }

    #[test]
    fn test_locate_keeps_half_filled_columns() {
        // 只要任一行非空即为候选
        let g = grid(&[
            &["", "", "100h", "", "300h", ""],
            &["", "", "1000km", "2000km", "3000km", ""],
        ]);
        let block = locator().locate(&g, 30, 200).unwrap();
        let columns: Vec<usize> = block.candidates.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![3, 4, 5]);
        assert!(block.candidates[1].hours_token.is_blank());
    }

    #[test]
    fn test_locate_accepts_suffix_variants() {
        let g = grid(&[&["", "", "250 HRS."], &["", "", "5.000 Kms:"]]);
        let block = locator().locate(&g, 30, 200).unwrap();
        assert_eq!(block.hours_row, 1);
    }

    #[test]
    fn test_header_outside_window_not_found() {
        let g = grid(&[
            &["", "", ""],
            &["", "", ""],
            &["", "", "100h"],
            &["", "", "1000km"],
        ]);
        match locator().locate(&g, 3, 200) {
            Err(ImportError::ScheduleHeaderNotFound { scanned_rows, .. }) => {
                assert_eq!(scanned_rows, 3)
            }
            other => panic!("Expected ScheduleHeaderNotFound, got {:?}", other),
        }
        assert!(locator().locate(&g, 4, 200).is_ok());
    }

    #[test]
    fn test_code_and_description_columns_ignored() {
        let g = grid(&[&["100h", "", ""], &["1000km", "", ""]]);
        assert!(locator().locate(&g, 30, 200).is_err());
    }

    #[test]
    fn test_bare_suffix_is_not_a_header() {
        let g = grid(&[&["", "", "h"], &["", "", "km"]]);
        assert!(locator().locate(&g, 30, 200).is_err());
    }
}
