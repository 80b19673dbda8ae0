// ==========================================
// 车队维保系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::{
    ImportConfig, MarkVocabulary, NumberConvention, OrphanActivityPolicy,
};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 扫描窗口 =====

    /// 表格最大行数
    ///
    /// # 默认值
    /// - 2000
    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error>>;

    /// 表格最大列数
    ///
    /// # 默认值
    /// - 200
    async fn get_max_cols(&self) -> Result<usize, Box<dyn Error>>;

    async fn get_header_scan_rows(&self) -> Result<usize, Box<dyn Error>>;

    async fn get_header_scan_cols(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 表格布局 =====

    /// 作业编码列（1 起始）
    async fn get_code_column(&self) -> Result<usize, Box<dyn Error>>;

    /// 作业描述列（1 起始）
    async fn get_description_column(&self) -> Result<usize, Box<dyn Error>>;

    /// 连续空行数达到该值视为表格结束
    ///
    /// # 默认值
    /// - 3
    async fn get_blank_rows_end_of_table(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 数值与标记 =====

    /// 数值约定
    ///
    /// # 返回
    /// - NumberConvention::DecimalComma: "1.500,5"
    /// - NumberConvention::DecimalPoint: "1,500.5"
    ///
    /// # 默认值
    /// - DECIMAL_COMMA
    async fn get_number_convention(&self) -> Result<NumberConvention, Box<dyn Error>>;

    async fn get_hours_suffixes(&self) -> Result<Vec<String>, Box<dyn Error>>;

    async fn get_km_suffixes(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 适用/不适用标记词表
    async fn get_mark_vocabulary(&self) -> Result<MarkVocabulary, Box<dyn Error>>;

    /// 作业行出现在类别行之前的处理策略
    ///
    /// # 默认值
    /// - TOLERATE
    async fn get_orphan_activity_policy(&self) -> Result<OrphanActivityPolicy, Box<dyn Error>>;

    /// 一次性读取完整导入配置
    async fn load_import_config(&self) -> Result<ImportConfig, Box<dyn Error>> {
        let max_rows = self.get_max_rows().await?;
        let max_cols = self.get_max_cols().await?;
        let header_scan_rows = self.get_header_scan_rows().await?;
        let header_scan_cols = self.get_header_scan_cols().await?;
        let code_column = self.get_code_column().await?;
        let description_column = self.get_description_column().await?;
        let blank_rows_end_of_table = self.get_blank_rows_end_of_table().await?;
        let number_convention = self.get_number_convention().await?;
        let hours_suffixes = self.get_hours_suffixes().await?;
        let km_suffixes = self.get_km_suffixes().await?;
        let mark_vocabulary = self.get_mark_vocabulary().await?;
        let orphan_activity_policy = self.get_orphan_activity_policy().await?;

        Ok(ImportConfig {
            max_rows,
            max_cols,
            header_scan_rows,
            header_scan_cols,
            code_column,
            description_column,
            blank_rows_end_of_table,
            number_convention,
            hours_suffixes,
            km_suffixes,
            mark_vocabulary,
            orphan_activity_policy,
        })
    }
}
