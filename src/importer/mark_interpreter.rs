// ==========================================
// 车队维保系统 - 适用标记解释器
// ==========================================
// 规则: 去空白 + 小写后查词表
// - 适用词表命中 → 适用
// - 空白 / 不适用词表命中 → 不适用
// - 其余非空记号 → 适用（并给出提示）
// ==========================================

use crate::config::MarkVocabulary;
use crate::importer::grid::CellValue;
use std::collections::HashSet;

/// 单个标记的解读结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReading {
    Applies,
    NotApplicable,
    /// 无法识别的记号，按适用处理
    AmbiguousApplies,
}

impl MarkReading {
    pub fn applies(self) -> bool {
        !matches!(self, MarkReading::NotApplicable)
    }
}

#[derive(Debug, Clone)]
pub struct MarkInterpreter {
    true_tokens: HashSet<String>,
    false_tokens: HashSet<String>,
}

impl MarkInterpreter {
    pub fn new(vocabulary: &MarkVocabulary) -> Self {
        let normalize = |tokens: &[String]| -> HashSet<String> {
            tokens.iter().map(|t| t.trim().to_lowercase()).collect()
        };
        Self {
            true_tokens: normalize(&vocabulary.true_tokens),
            false_tokens: normalize(&vocabulary.false_tokens),
        }
    }

    /// 解读原始记号
    pub fn read_token(&self, raw: &str) -> MarkReading {
        let token = raw.trim().to_lowercase();
        if token.is_empty() || self.false_tokens.contains(&token) {
            MarkReading::NotApplicable
        } else if self.true_tokens.contains(&token) {
            MarkReading::Applies
        } else {
            MarkReading::AmbiguousApplies
        }
    }

    /// 解读单元格（数字/布尔先转为文本记号）
    pub fn read(&self, cell: &CellValue) -> MarkReading {
        self.read_token(&cell.as_token())
    }

    pub fn interpret(&self, raw: &str) -> bool {
        self.read_token(raw).applies()
    }
}

impl Default for MarkInterpreter {
    fn default() -> Self {
        Self::new(&MarkVocabulary::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_tokens() {
        let interpreter = MarkInterpreter::default();
        for token in ["√", "v", "X", " 1 ", "Yes", "si", "SÍ"] {
            assert_eq!(interpreter.read_token(token), MarkReading::Applies, "{}", token);
        }
        for token in ["", "   ", "-", "0", "NO"] {
            assert_eq!(
                interpreter.read_token(token),
                MarkReading::NotApplicable,
                "{:?}",
                token
            );
        }
    }

    #[test]
    fn test_unknown_token_applies_with_ambiguity() {
        let interpreter = MarkInterpreter::default();
        assert_eq!(interpreter.read_token("●"), MarkReading::AmbiguousApplies);
        assert!(interpreter.interpret("ok"));
    }

    #[test]
    fn test_typed_cells() {
        let interpreter = MarkInterpreter::default();
        assert_eq!(interpreter.read(&CellValue::Number(1.0)), MarkReading::Applies);
        assert_eq!(interpreter.read(&CellValue::Number(0.0)), MarkReading::NotApplicable);
        assert_eq!(interpreter.read(&CellValue::Bool(true)), MarkReading::Applies);
        assert_eq!(interpreter.read(&CellValue::Empty), MarkReading::NotApplicable);
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = MarkVocabulary {
            true_tokens: vec!["OK".to_string()],
            false_tokens: vec!["n/a".to_string()],
        };
        let interpreter = MarkInterpreter::new(&vocabulary);
        assert_eq!(interpreter.read_token("ok"), MarkReading::Applies);
        assert_eq!(interpreter.read_token("N/A"), MarkReading::NotApplicable);
        assert_eq!(interpreter.read_token("√"), MarkReading::AmbiguousApplies);
    }
}
