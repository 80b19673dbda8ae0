// ==========================================
// 车队维保系统 - 配置层
// ==========================================
// 职责: 导入配置定义 + 持久化覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{ImportConfig, MarkVocabulary, NumberConvention, OrphanActivityPolicy};
pub use import_config_trait::ImportConfigReader;
