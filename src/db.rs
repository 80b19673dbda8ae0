// ==========================================
// 车队维保系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键必须逐连接开启）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等，首次打开即可用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 存储时间格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id    TEXT PRIMARY KEY,
    scope_type  TEXT NOT NULL,
    scope_key   TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL REFERENCES config_scope(scope_id),
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS maintenance_plan (
    plan_id       TEXT PRIMARY KEY,
    vehicle_type  TEXT NOT NULL,
    plan_name     TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    revision      INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (vehicle_type, plan_name)
);

CREATE TABLE IF NOT EXISTS maintenance_interval (
    interval_id     TEXT PRIMARY KEY,
    plan_id         TEXT NOT NULL REFERENCES maintenance_plan(plan_id) ON DELETE CASCADE,
    hours           REAL NOT NULL CHECK (hours >= 0),
    kilometers      REAL NOT NULL CHECK (kilometers >= 0),
    sequence_order  INTEGER NOT NULL,
    UNIQUE (plan_id, sequence_order)
);

CREATE TABLE IF NOT EXISTS maintenance_activity (
    activity_id     TEXT PRIMARY KEY,
    plan_id         TEXT NOT NULL REFERENCES maintenance_plan(plan_id) ON DELETE CASCADE,
    code            TEXT NOT NULL,
    description     TEXT NOT NULL,
    category        TEXT NOT NULL,
    sequence_order  INTEGER NOT NULL,
    UNIQUE (plan_id, code)
);

CREATE TABLE IF NOT EXISTS activity_applicability (
    activity_id  TEXT NOT NULL REFERENCES maintenance_activity(activity_id) ON DELETE CASCADE,
    interval_id  TEXT NOT NULL REFERENCES maintenance_interval(interval_id) ON DELETE CASCADE,
    PRIMARY KEY (activity_id, interval_id)
);

CREATE INDEX IF NOT EXISTS idx_interval_plan ON maintenance_interval(plan_id);
CREATE INDEX IF NOT EXISTS idx_activity_plan ON maintenance_activity(plan_id);
CREATE INDEX IF NOT EXISTS idx_applicability_interval ON activity_applicability(interval_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let scopes: i64 = conn
            .query_row("SELECT COUNT(*) FROM config_scope", [], |row| row.get(0))
            .unwrap();
        assert_eq!(scopes, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        let on: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(on, 1);
    }
}
