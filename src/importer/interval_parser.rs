// ==========================================
// 车队维保系统 - 区间数值解析器
// ==========================================
// 职责: 将表头记号解析为小时/公里阈值
// 约定: 单位后缀 (h / km 等，大小写不敏感，可带尾部标点)
// 约定: 千分位与小数分隔符由 NumberConvention 固定，不逐格推断
// 红线: parse 为全函数，任何输入只返回 Some(数值) 或 None
// ==========================================

use crate::config::{ImportConfig, NumberConvention};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::CellValue;
use crate::importer::header_locator::HeaderBlock;
use crate::importer::warning::ImportWarning;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 尾部可忽略的标点
const TRAILING_PUNCTUATION: &[char] = &['.', ':', ';', ')', '*'];

/// 小写、去空白、去尾部标点
pub(crate) fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end()
        .to_string()
}

/// 去掉单位后缀；suffixes 需按长度降序排列
///
/// 返回剥离后的数值部分（仅当确实匹配到后缀）
pub(crate) fn strip_unit_suffix<'a>(token: &'a str, suffixes: &[String]) -> Option<&'a str> {
    suffixes
        .iter()
        .filter(|s| !s.is_empty())
        .find_map(|suffix| token.strip_suffix(suffix.as_str()))
        .map(str::trim_end)
}

/// 单位后缀规范化：去空白、小写、去重、按长度降序
pub(crate) fn normalize_suffixes(suffixes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = suffixes
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    out.dedup();
    out
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// ==========================================
// ParsedInterval - 解析后的区间列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInterval {
    pub column: usize,       // 来源列
    pub hours: f64,          // 小时阈值
    pub kilometers: f64,     // 公里阈值
    pub sequence_order: u32, // 存活区间内的顺序 (1 起始)
}

// ==========================================
// IntervalParser
// ==========================================
#[derive(Debug, Clone)]
pub struct IntervalParser {
    convention: NumberConvention,
    unit_suffixes: Vec<String>,
}

impl IntervalParser {
    pub fn new(
        convention: NumberConvention,
        hours_suffixes: &[String],
        km_suffixes: &[String],
    ) -> Self {
        let mut all = hours_suffixes.to_vec();
        all.extend_from_slice(km_suffixes);
        Self {
            convention,
            unit_suffixes: normalize_suffixes(&all),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(
            config.number_convention,
            &config.hours_suffixes,
            &config.km_suffixes,
        )
    }

    pub fn convention(&self) -> NumberConvention {
        self.convention
    }

    /// 解析文本记号
    ///
    /// # 示例（DECIMAL_COMMA）
    /// - "100h" → 100
    /// - "1.500 km." → 1500
    /// - "250,5 H" → 250.5
    /// - "abc" / "" / "1.5" → None（"1.5" 的千分位分组不合法）
    pub fn parse(&self, token: &str) -> Option<f64> {
        let normalized = normalize_token(token);
        let number = strip_unit_suffix(&normalized, &self.unit_suffixes).unwrap_or(&normalized);
        self.parse_number(number.trim())
    }

    /// 解析单元格：数字单元格直接取值，文本按约定解析
    pub fn parse_cell(&self, cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n),
            CellValue::Text(s) => self.parse(s),
            _ => None,
        }
    }

    fn parse_number(&self, s: &str) -> Option<f64> {
        let (thousands, decimal) = self.convention.separators();

        let (int_part, frac_part) = match s.split_once(decimal) {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };

        let mut digits = String::with_capacity(int_part.len());
        if int_part.contains(thousands) {
            // 千分位: 首组 1~3 位，其余每组恰好 3 位
            let mut groups = int_part.split(thousands);
            let first = groups.next()?;
            if first.len() > 3 || !all_digits(first) {
                return None;
            }
            digits.push_str(first);
            for group in groups {
                if group.len() != 3 || !all_digits(group) {
                    return None;
                }
                digits.push_str(group);
            }
        } else {
            if !all_digits(int_part) {
                return None;
            }
            digits.push_str(int_part);
        }

        if let Some(frac) = frac_part {
            if !all_digits(frac) {
                return None;
            }
            digits.push('.');
            digits.push_str(frac);
        }

        digits.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// 按固定约定格式化数值（parse 的逆操作）
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() || value < 0.0 {
            return String::new();
        }
        let (thousands, decimal) = self.convention.separators();
        let raw = value.to_string();
        let (int_part, frac_part) = match raw.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (raw.as_str(), None),
        };

        let mut out = String::with_capacity(raw.len() + int_part.len() / 3 + 1);
        let len = int_part.len();
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (len - idx) % 3 == 0 {
                out.push(thousands);
            }
            out.push(ch);
        }
        if let Some(frac) = frac_part {
            out.push(decimal);
            out.push_str(frac);
        }
        out
    }

    /// 将表头候选列解析为存活区间
    ///
    /// # 规则
    /// 1. 小时或公里无法解析的列 → 丢弃 + DiscardedInvalidIntervalColumn 提示
    /// 2. 存活列按列位置重新编号 1..n
    /// 3. 存活序列必须在小时与公里上都严格递增，否则 NonMonotonicIntervals
    pub fn build_intervals(
        &self,
        header: &HeaderBlock,
    ) -> ImportResult<(Vec<ParsedInterval>, Vec<ImportWarning>)> {
        let mut survivors: Vec<ParsedInterval> = Vec::new();
        let mut warnings = Vec::new();

        for candidate in &header.candidates {
            match (
                self.parse_cell(&candidate.hours_token),
                self.parse_cell(&candidate.km_token),
            ) {
                (Some(hours), Some(kilometers)) => survivors.push(ParsedInterval {
                    column: candidate.column,
                    hours,
                    kilometers,
                    sequence_order: 0,
                }),
                _ => {
                    warn!(
                        column = candidate.column,
                        hours_token = %candidate.hours_token,
                        km_token = %candidate.km_token,
                        "区间列无法解析，已丢弃"
                    );
                    warnings.push(ImportWarning::DiscardedInvalidIntervalColumn {
                        column: candidate.column,
                        hours_token: candidate.hours_token.as_token(),
                        km_token: candidate.km_token.as_token(),
                    });
                }
            }
        }

        for pair in survivors.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.hours <= prev.hours {
                return Err(ImportError::NonMonotonicIntervals {
                    field: "小时".to_string(),
                    row: header.hours_row,
                    column: cur.column,
                    previous_column: prev.column,
                    previous: prev.hours,
                    current: cur.hours,
                });
            }
            if cur.kilometers <= prev.kilometers {
                return Err(ImportError::NonMonotonicIntervals {
                    field: "公里".to_string(),
                    row: header.km_row,
                    column: cur.column,
                    previous_column: prev.column,
                    previous: prev.kilometers,
                    current: cur.kilometers,
                });
            }
        }

        for (idx, interval) in survivors.iter_mut().enumerate() {
            interval.sequence_order = idx as u32 + 1;
            debug!(
                column = interval.column,
                hours = interval.hours,
                kilometers = interval.kilometers,
                sequence_order = interval.sequence_order,
                "区间解析成功"
            );
        }

        info!(
            surviving = survivors.len(),
            discarded = warnings.len(),
            "区间解析完成"
        );
        Ok((survivors, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::header_locator::IntervalCandidate;

    fn comma_parser() -> IntervalParser {
        IntervalParser::from_config(&ImportConfig::default())
    }

    fn point_parser() -> IntervalParser {
        let config = ImportConfig {
            number_convention: NumberConvention::DecimalPoint,
            ..ImportConfig::default()
        };
        IntervalParser::from_config(&config)
    }

    fn header(cols: &[(usize, &str, &str)]) -> HeaderBlock {
        HeaderBlock {
            hours_row: 1,
            km_row: 2,
            candidates: cols
                .iter()
                .map(|(column, h, k)| IntervalCandidate {
                    column: *column,
                    hours_token: CellValue::from(*h),
                    km_token: CellValue::from(*k),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_unit_suffixes() {
        let parser = comma_parser();
        assert_eq!(parser.parse("100h"), Some(100.0));
        assert_eq!(parser.parse("100 H."), Some(100.0));
        assert_eq!(parser.parse("1000km"), Some(1000.0));
        assert_eq!(parser.parse("1000 KMS:"), Some(1000.0));
        assert_eq!(parser.parse("250 horas"), Some(250.0));
        assert_eq!(parser.parse("  42  "), Some(42.0));
    }

    #[test]
    fn test_parse_decimal_comma_convention() {
        let parser = comma_parser();
        assert_eq!(parser.parse("1.500km"), Some(1500.0));
        assert_eq!(parser.parse("1.500,5h"), Some(1500.5));
        assert_eq!(parser.parse("250,25"), Some(250.25));
        assert_eq!(parser.parse("12.345.678"), Some(12_345_678.0));
        // 非法分组
        assert_eq!(parser.parse("1.5"), None);
        assert_eq!(parser.parse("1.50.000"), None);
    }

    #[test]
    fn test_parse_decimal_point_convention() {
        let parser = point_parser();
        assert_eq!(parser.parse("1,500km"), Some(1500.0));
        assert_eq!(parser.parse("2.5h"), Some(2.5));
        assert_eq!(parser.parse("1,500.75"), Some(1500.75));
        assert_eq!(parser.parse("1,5"), None);
    }

    #[test]
    fn test_parse_is_total() {
        let parser = comma_parser();
        let tokens = [
            "", "abc", "h", "km", "-100h", "1e5", ",5", "5,", "½h", "١٢٣", "100 200",
        ];
        for token in tokens {
            assert_eq!(parser.parse(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_parse_cell_variants() {
        let parser = comma_parser();
        assert_eq!(parser.parse_cell(&CellValue::Number(250.5)), Some(250.5));
        assert_eq!(parser.parse_cell(&CellValue::Number(-1.0)), None);
        assert_eq!(parser.parse_cell(&CellValue::Empty), None);
        assert_eq!(parser.parse_cell(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_format_round_trip() {
        for parser in [comma_parser(), point_parser()] {
            for value in [0.0, 7.0, 100.0, 1500.5, 12_345_678.25, 0.1 + 0.2, 1e20] {
                let text = parser.format(value);
                assert_eq!(parser.parse(&text), Some(value), "text {:?}", text);
            }
        }
        assert_eq!(comma_parser().format(1500.5), "1.500,5");
        assert_eq!(point_parser().format(1234567.0), "1,234,567");
    }

    #[test]
    fn test_build_intervals_discards_invalid_column() {
        let parser = comma_parser();
        let block = header(&[
            (3, "abc", "1000km"),
            (4, "200h", "2000km"),
            (5, "300h", "3000km"),
        ]);
        let (intervals, warnings) = parser.build_intervals(&block).unwrap();

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].column, 4);
        assert_eq!(intervals[0].sequence_order, 1);
        assert_eq!(intervals[1].column, 5);
        assert_eq!(intervals[1].sequence_order, 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            ImportWarning::DiscardedInvalidIntervalColumn { column: 3, .. }
        ));
    }

    #[test]
    fn test_build_intervals_rejects_non_monotonic_hours() {
        let parser = comma_parser();
        let block = header(&[(3, "300h", "1000km"), (4, "200h", "2000km")]);
        match parser.build_intervals(&block) {
            Err(ImportError::NonMonotonicIntervals {
                row,
                column,
                previous_column,
                ..
            }) => {
                assert_eq!(row, 1);
                assert_eq!(column, 4);
                assert_eq!(previous_column, 3);
            }
            other => panic!("Expected NonMonotonicIntervals, got {:?}", other),
        }
    }

    #[test]
    fn test_build_intervals_rejects_equal_kilometers() {
        let parser = comma_parser();
        let block = header(&[(3, "100h", "1000km"), (4, "200h", "1000km")]);
        match parser.build_intervals(&block) {
            Err(ImportError::NonMonotonicIntervals { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "公里");
            }
            other => panic!("Expected NonMonotonicIntervals, got {:?}", other),
        }
    }
}
