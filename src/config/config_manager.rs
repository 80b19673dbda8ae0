// ==========================================
// 车队维保系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 缺失或格式错误的配置回落到默认值，并记录告警
// ==========================================

use crate::config::import_config::{
    ImportConfig, MarkVocabulary, NumberConvention, OrphanActivityPolicy,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    defaults: ImportConfig,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            defaults: ImportConfig::default(),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self {
            conn,
            defaults: ImportConfig::default(),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 解析数值配置，缺失或非法时回落默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        default = %default,
                        "配置值格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 读取逗号分隔列表，缺失或为空时回落默认值
    fn get_list_or_default(
        &self,
        key: &str,
        default: &[String],
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(raw) => raw,
            None => return Ok(default.to_vec()),
        };

        let items: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() {
            tracing::warn!(config_key = key, raw_value = %raw, "列表配置为空，使用默认值");
            Ok(default.to_vec())
        } else {
            Ok(items)
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 导入排查时记录当时生效的覆写项
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== 扫描窗口 =====

    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::MAX_ROWS, self.defaults.max_rows)
    }

    async fn get_max_cols(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::MAX_COLS, self.defaults.max_cols)
    }

    async fn get_header_scan_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::HEADER_SCAN_ROWS, self.defaults.header_scan_rows)
    }

    async fn get_header_scan_cols(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::HEADER_SCAN_COLS, self.defaults.header_scan_cols)
    }

    // ===== 表格布局 =====

    async fn get_code_column(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::CODE_COLUMN, self.defaults.code_column)
    }

    async fn get_description_column(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::DESCRIPTION_COLUMN,
            self.defaults.description_column,
        )
    }

    async fn get_blank_rows_end_of_table(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::BLANK_ROWS_END_OF_TABLE,
            self.defaults.blank_rows_end_of_table,
        )
    }

    // ===== 数值与标记 =====

    async fn get_number_convention(&self) -> Result<NumberConvention, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::NUMBER_CONVENTION)?;
        Ok(match value {
            None => self.defaults.number_convention,
            Some(raw) => NumberConvention::from_config_value(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::NUMBER_CONVENTION,
                    raw_value = %raw,
                    "数值约定配置无法识别，使用 DECIMAL_COMMA"
                );
                self.defaults.number_convention
            }),
        })
    }

    async fn get_hours_suffixes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        self.get_list_or_default(config_keys::HOURS_SUFFIXES, &self.defaults.hours_suffixes)
    }

    async fn get_km_suffixes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        self.get_list_or_default(config_keys::KM_SUFFIXES, &self.defaults.km_suffixes)
    }

    async fn get_mark_vocabulary(&self) -> Result<MarkVocabulary, Box<dyn Error>> {
        let defaults = &self.defaults.mark_vocabulary;
        Ok(MarkVocabulary {
            true_tokens: self
                .get_list_or_default(config_keys::MARK_TRUE_TOKENS, &defaults.true_tokens)?,
            false_tokens: self
                .get_list_or_default(config_keys::MARK_FALSE_TOKENS, &defaults.false_tokens)?,
        })
    }

    async fn get_orphan_activity_policy(&self) -> Result<OrphanActivityPolicy, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::ORPHAN_ACTIVITY_POLICY)?;
        Ok(match value {
            None => self.defaults.orphan_activity_policy,
            Some(raw) => OrphanActivityPolicy::from_config_value(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::ORPHAN_ACTIVITY_POLICY,
                    raw_value = %raw,
                    "孤儿作业策略无法识别，使用 TOLERATE"
                );
                self.defaults.orphan_activity_policy
            }),
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 扫描窗口
    pub const MAX_ROWS: &str = "schedule_import.max_rows";
    pub const MAX_COLS: &str = "schedule_import.max_cols";
    pub const HEADER_SCAN_ROWS: &str = "schedule_import.header_scan_rows";
    pub const HEADER_SCAN_COLS: &str = "schedule_import.header_scan_cols";

    // 表格布局
    pub const CODE_COLUMN: &str = "schedule_import.code_column";
    pub const DESCRIPTION_COLUMN: &str = "schedule_import.description_column";
    pub const BLANK_ROWS_END_OF_TABLE: &str = "schedule_import.blank_rows_end_of_table";

    // 数值约定: DECIMAL_COMMA | DECIMAL_POINT
    pub const NUMBER_CONVENTION: &str = "schedule_import.number_convention";

    // 单位后缀（逗号分隔）
    pub const HOURS_SUFFIXES: &str = "schedule_import.hours_suffixes";
    pub const KM_SUFFIXES: &str = "schedule_import.km_suffixes";

    // 标记词表（逗号分隔）
    pub const MARK_TRUE_TOKENS: &str = "schedule_import.mark_true_tokens";
    pub const MARK_FALSE_TOKENS: &str = "schedule_import.mark_false_tokens";

    // 孤儿作业策略: TOLERATE | REJECT
    pub const ORPHAN_ACTIVITY_POLICY: &str = "schedule_import.orphan_activity_policy";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let config = manager().load_import_config().await.unwrap();
        assert_eq!(config, ImportConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_are_applied() {
        let m = manager();
        m.set_config_value(config_keys::NUMBER_CONVENTION, "decimal_point")
            .unwrap();
        m.set_config_value(config_keys::MAX_ROWS, "50").unwrap();
        m.set_config_value(config_keys::MARK_TRUE_TOKENS, "ok, Y").unwrap();
        m.set_config_value(config_keys::ORPHAN_ACTIVITY_POLICY, "REJECT")
            .unwrap();

        let config = m.load_import_config().await.unwrap();
        assert_eq!(config.number_convention, NumberConvention::DecimalPoint);
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.mark_vocabulary.true_tokens, vec!["ok", "Y"]);
        assert_eq!(config.orphan_activity_policy, OrphanActivityPolicy::Reject);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let m = manager();
        m.set_config_value(config_keys::MAX_COLS, "many").unwrap();
        m.set_config_value(config_keys::NUMBER_CONVENTION, "ROMAN").unwrap();
        m.set_config_value(config_keys::KM_SUFFIXES, " , ").unwrap();

        assert_eq!(m.get_max_cols().await.unwrap(), 200);
        assert_eq!(
            m.get_number_convention().await.unwrap(),
            NumberConvention::DecimalComma
        );
        assert_eq!(m.get_km_suffixes().await.unwrap(), vec!["kms", "km"]);
    }

    #[test]
    fn test_snapshot_lists_overrides() {
        let m = manager();
        m.set_config_value(config_keys::MAX_ROWS, "10").unwrap();
        m.set_config_value(config_keys::MAX_ROWS, "20").unwrap();
        let snapshot: serde_json::Value =
            serde_json::from_str(&m.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot[config_keys::MAX_ROWS], "20");
    }
}
