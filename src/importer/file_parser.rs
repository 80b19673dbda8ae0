// ==========================================
// 车队维保系统 - 表格读取器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.ods) / CSV (.csv)
// 输出: CellGrid（1 起始坐标，与原表格一致）
// 说明: 只读取第一个工作表；不做任何内容判断
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::{CellGrid, CellValue, GridLimits};
use crate::importer::schedule_importer_trait::GridReader;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvGridReader;

impl CsvGridReader {
    /// 按物理行切分（引号内的换行属于同一行），空行原样保留
    fn split_rows(content: &str) -> Vec<&str> {
        let mut rows = Vec::new();
        let mut start = 0;
        let mut in_quotes = false;
        for (idx, ch) in content.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '\n' if !in_quotes => {
                    rows.push(content[start..idx].trim_end_matches('\r'));
                    start = idx + 1;
                }
                _ => {}
            }
        }
        if start < content.len() {
            rows.push(content[start..].trim_end_matches('\r'));
        }
        rows
    }

    /// 单行解析；空行得到空记录
    fn parse_row(line: &str) -> ImportResult<Vec<CellValue>> {
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let cells = match reader.records().next().transpose()? {
            Some(record) => record.iter().map(CellValue::from_text).collect(),
            None => Vec::new(),
        };
        Ok(cells)
    }

    /// CSV 文本 → 网格；行号与文件行号一致
    pub fn parse_content(content: &str, limits: GridLimits) -> ImportResult<CellGrid> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let lines = Self::split_rows(content);
        limits.check(lines.len(), 0)?;

        let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(lines.len());
        for line in lines {
            let cells = Self::parse_row(line)?;
            limits.check(rows.len() + 1, cells.len())?;
            rows.push(cells);
        }
        Ok(CellGrid::from_rows(rows))
    }
}

impl GridReader for CsvGridReader {
    fn read_grid(&self, file_path: &Path, limits: GridLimits) -> ImportResult<CellGrid> {
        ensure_exists(file_path)?;

        // 检查扩展名
        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let content = std::fs::read_to_string(file_path)?;
        let grid = Self::parse_content(&content, limits)?;

        debug!(
            path = %file_path.display(),
            rows = grid.row_count(),
            cols = grid.col_count(),
            "CSV 读取完成"
        );
        Ok(grid)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelGridReader;

impl ExcelGridReader {
    fn convert(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::from_text(s),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            // 日期/错误等按显示文本处理
            other => CellValue::from_text(&other.to_string()),
        }
    }

    /// 已用区域 → 网格
    ///
    /// range 可能不从 A1 开始，保留绝对坐标；
    /// 先按区域右下角检查上限，再分配网格
    fn grid_from_range(range: &Range<Data>, limits: GridLimits) -> ImportResult<CellGrid> {
        let (start, end) = match (range.start(), range.end()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(CellGrid::default()),
        };
        limits.check(end.0 as usize + 1, end.1 as usize + 1)?;

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(Self::convert).collect())
            .collect();
        Ok(CellGrid::from_rows_at(
            start.0 as usize + 1,
            start.1 as usize + 1,
            rows,
        ))
    }
}

impl GridReader for ExcelGridReader {
    fn read_grid(&self, file_path: &Path, limits: GridLimits) -> ImportResult<CellGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let grid = Self::grid_from_range(&range, limits)?;

        debug!(
            path = %file_path.display(),
            sheet = %sheet_name,
            rows = grid.row_count(),
            cols = grid.col_count(),
            "Excel 读取完成"
        );
        Ok(grid)
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalGridReader;

impl GridReader for UniversalGridReader {
    fn read_grid(&self, file_path: &Path, limits: GridLimits) -> ImportResult<CellGrid> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => CsvGridReader.read_grid(file_path, limits),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelGridReader.read_grid(file_path, limits),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::domain::PlanIdentity;
    use crate::importer::schedule_pipeline::SchedulePipeline;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn limits() -> GridLimits {
        GridLimits::from_config(&ImportConfig::default())
    }

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_reader_keeps_coordinates() {
        let file = csv_file(&[",,100h,200h", ",,1000km,2000km", "A,Motor", "A.1,Oil,√,"]);
        let grid = CsvGridReader.read_grid(file.path(), limits()).unwrap();

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.col_count(), 4);
        assert_eq!(grid.get(1, 3).as_token(), "100h");
        assert_eq!(grid.get(4, 3).as_token(), "√");
        assert!(grid.get(4, 4).is_blank());
    }

    #[test]
    fn test_csv_reader_preserves_empty_lines() {
        let file = csv_file(&["A,Motor", "", "", "", "", "A.1,Oil"]);
        let grid = CsvGridReader.read_grid(file.path(), limits()).unwrap();

        assert_eq!(grid.row_count(), 6);
        assert!(grid.is_row_blank(2));
        assert!(grid.is_row_blank(5));
        assert_eq!(grid.get(6, 1).as_token(), "A.1");
    }

    #[test]
    fn test_csv_quoted_newline_stays_in_one_row() {
        let grid =
            CsvGridReader::parse_content("A,\"Motor\ny filtros\"\r\nA.1,Oil\r\n", limits())
                .unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.get(1, 2).as_token(), "Motor\ny filtros");
        assert_eq!(grid.get(2, 1).as_token(), "A.1");
    }

    #[test]
    fn test_csv_empty_lines_end_the_table() {
        // 三个真正的空行之后是页脚
        let file = csv_file(&[
            ",,100h,200h",
            ",,1000km,2000km",
            "A,Motor",
            "A.1,Oil,x",
            "",
            "",
            "",
            "A.9,Footer note,,x",
        ]);
        let grid = CsvGridReader.read_grid(file.path(), limits()).unwrap();
        let pipeline = SchedulePipeline::new(ImportConfig::default()).unwrap();
        let outcome = pipeline
            .run(&grid, &PlanIdentity::new("CAMION", "Base"))
            .unwrap();

        let codes: Vec<&str> = outcome
            .plan
            .activities
            .iter()
            .map(|a| a.code.as_str())
            .collect();
        assert_eq!(codes, vec!["A.1"]);
    }

    #[test]
    fn test_csv_too_many_rows_fails_before_building() {
        let small = GridLimits::new(3, 10);
        let err = CsvGridReader::parse_content("a\nb\nc\nd\n", small).unwrap_err();
        assert!(matches!(err, ImportError::ScheduleTooLarge { rows: 4, .. }));
    }

    #[test]
    fn test_csv_too_many_columns_fails() {
        let small = GridLimits::new(10, 3);
        let err = CsvGridReader::parse_content("a,b\na,b,c,d\n", small).unwrap_err();
        assert!(matches!(
            err,
            ImportError::ScheduleTooLarge { rows: 2, cols: 4, .. }
        ));
    }

    #[test]
    fn test_csv_reader_file_not_found() {
        let result = CsvGridReader.read_grid(Path::new("non_existent.csv"), limits());
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_reader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalGridReader.read_grid(file.path(), limits());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_excel_range_keeps_absolute_coordinates() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("100h".to_string()));
        range.set_value((2, 3), Data::Float(2000.0));

        let grid = ExcelGridReader::grid_from_range(&range, limits()).unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 4);
        assert_eq!(grid.get(2, 3).as_token(), "100h");
        assert_eq!(grid.get(3, 4), &CellValue::Number(2000.0));
    }

    #[test]
    fn test_excel_far_offset_cell_fails_fast() {
        // 只有 XFD1048576 一个单元格
        let mut range: Range<Data> = Range::new((1_048_575, 16_383), (1_048_575, 16_383));
        range.set_value((1_048_575, 16_383), Data::String("x".to_string()));

        let err = ExcelGridReader::grid_from_range(&range, limits()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::ScheduleTooLarge {
                rows: 1_048_576,
                cols: 16_384,
                ..
            }
        ));
    }

    #[test]
    fn test_excel_cell_conversion() {
        assert_eq!(ExcelGridReader::convert(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(
            ExcelGridReader::convert(&Data::String(String::new())),
            CellValue::Empty
        );
        assert_eq!(ExcelGridReader::convert(&Data::Bool(true)), CellValue::Bool(true));
    }
}
