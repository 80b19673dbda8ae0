// ==========================================
// 车队维保系统 - 保养计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: upsert 整体替换 区间 + 作业 + 矩阵，失败时旧修订完整保留
// 说明: 同一 (车型, 计划名称) 重新导入沿用原 plan_id，修订号 +1
// ==========================================

use crate::db::{
    configure_sqlite_connection, ensure_schema, open_sqlite_connection, DATETIME_FORMAT,
};
use crate::domain::{
    Activity, ActivityApplicability, ApplicabilityMatrix, Interval, Plan, PlanIdentity,
    PlanSummary,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ==========================================
// PlanRepository Trait
// ==========================================
// 实现者: SqlitePlanRepository
pub trait PlanRepository: Send + Sync {
    /// 原子整体替换
    ///
    /// # 参数
    /// - plan: 新修订的完整结构（区间/作业ID由调用方生成）
    /// - identity: 车型 + 计划名称
    ///
    /// # 返回
    /// - Ok(plan_id): 已存在同一身份时为原 plan_id，否则为 plan.plan_id
    fn upsert(&self, plan: &Plan, identity: &PlanIdentity) -> RepositoryResult<String>;

    fn find_by_id(&self, plan_id: &str) -> RepositoryResult<Option<Plan>>;

    fn find_by_identity(&self, identity: &PlanIdentity) -> RepositoryResult<Option<Plan>>;

    /// 计划摘要列表（按车型、名称排序）
    fn list_summaries(&self) -> RepositoryResult<Vec<PlanSummary>>;

    fn set_active(&self, plan_id: &str, is_active: bool) -> RepositoryResult<()>;

    /// 单元格写入（后写覆盖）
    ///
    /// # 返回
    /// - Ok(old_value): 写入前的值
    /// - Err(NotFound): 作业或区间不属于该计划
    fn set_applicability(
        &self,
        plan_id: &str,
        activity_id: &str,
        interval_id: &str,
        applies: bool,
    ) -> RepositoryResult<bool>;

    /// 批量单元格写入（同一事务，任一单元格失败则全部回滚）
    ///
    /// # 返回
    /// - Ok(old_values): 与 cells 一一对应的写入前的值
    /// - Err(NotFound): 某个作业或区间不属于该计划
    fn set_applicabilities(
        &self,
        plan_id: &str,
        cells: &[ActivityApplicability],
    ) -> RepositoryResult<Vec<bool>>;
}

// ==========================================
// SqlitePlanRepository - SQLite 实现
// ==========================================
pub struct SqlitePlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlanRepository {
    /// 打开数据库并建表
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA 并建表，均为幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

fn now_text() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(idx: usize, raw: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn find_plan_id(conn: &Connection, identity: &PlanIdentity) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT plan_id FROM maintenance_plan WHERE vehicle_type = ?1 AND plan_name = ?2",
        params![identity.vehicle_type, identity.name],
        |row| row.get(0),
    )
    .optional()
}

/// 加载完整计划（区间/作业按 sequence_order）
fn load_plan(conn: &Connection, plan_id: &str) -> RepositoryResult<Option<Plan>> {
    let header = conn
        .query_row(
            r#"SELECT plan_id, vehicle_type, plan_name, is_active, revision
               FROM maintenance_plan
               WHERE plan_id = ?1"#,
            params![plan_id],
            |row| {
                Ok(Plan {
                    plan_id: row.get(0)?,
                    vehicle_type: row.get(1)?,
                    name: row.get(2)?,
                    is_active: row.get(3)?,
                    revision: row.get(4)?,
                    intervals: Vec::new(),
                    activities: Vec::new(),
                    matrix: ApplicabilityMatrix::new(),
                })
            },
        )
        .optional()?;

    let mut plan = match header {
        Some(plan) => plan,
        None => return Ok(None),
    };

    let mut stmt = conn.prepare(
        r#"SELECT interval_id, hours, kilometers, sequence_order
           FROM maintenance_interval
           WHERE plan_id = ?1
           ORDER BY sequence_order"#,
    )?;
    plan.intervals = stmt
        .query_map(params![plan_id], |row| {
            Ok(Interval {
                interval_id: row.get(0)?,
                hours: row.get(1)?,
                kilometers: row.get(2)?,
                sequence_order: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        r#"SELECT activity_id, code, description, category, sequence_order
           FROM maintenance_activity
           WHERE plan_id = ?1
           ORDER BY sequence_order"#,
    )?;
    plan.activities = stmt
        .query_map(params![plan_id], |row| {
            Ok(Activity {
                activity_id: row.get(0)?,
                code: row.get(1)?,
                description: row.get(2)?,
                category: row.get(3)?,
                sequence_order: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        r#"SELECT aa.activity_id, aa.interval_id
           FROM activity_applicability aa
           JOIN maintenance_activity ma ON ma.activity_id = aa.activity_id
           WHERE ma.plan_id = ?1"#,
    )?;
    let entries = stmt
        .query_map(params![plan_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (activity_id, interval_id) in entries {
        plan.matrix.set(&activity_id, &interval_id, true);
    }

    Ok(Some(plan))
}

fn belongs_to_plan(
    conn: &Connection,
    table: &str,
    id_column: &str,
    id: &str,
    plan_id: &str,
) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1 AND plan_id = ?2",
        table, id_column
    );
    Ok(conn
        .query_row(&sql, params![id, plan_id], |_row| Ok(true))
        .optional()?
        .unwrap_or(false))
}

impl PlanRepository for SqlitePlanRepository {
    fn upsert(&self, plan: &Plan, identity: &PlanIdentity) -> RepositoryResult<String> {
        if !identity.is_complete() {
            return Err(RepositoryError::ValidationError(
                "车型与计划名称不能为空".to_string(),
            ));
        }
        plan.validate_references()
            .map_err(RepositoryError::ValidationError)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = now_text();

        // 沿用已存在的身份，否则新建
        let plan_id = match find_plan_id(&tx, identity)? {
            Some(existing_id) => {
                tx.execute(
                    r#"DELETE FROM activity_applicability
                       WHERE activity_id IN (
                           SELECT activity_id FROM maintenance_activity WHERE plan_id = ?1
                       )"#,
                    params![existing_id],
                )?;
                tx.execute(
                    "DELETE FROM maintenance_activity WHERE plan_id = ?1",
                    params![existing_id],
                )?;
                tx.execute(
                    "DELETE FROM maintenance_interval WHERE plan_id = ?1",
                    params![existing_id],
                )?;
                tx.execute(
                    r#"UPDATE maintenance_plan
                       SET revision = revision + 1, updated_at = ?2
                       WHERE plan_id = ?1"#,
                    params![existing_id, now],
                )?;
                debug!(plan_id = %existing_id, "替换已有计划修订");
                existing_id
            }
            None => {
                tx.execute(
                    r#"INSERT INTO maintenance_plan (
                        plan_id, vehicle_type, plan_name, is_active, revision,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)"#,
                    params![
                        plan.plan_id,
                        identity.vehicle_type,
                        identity.name,
                        plan.is_active,
                        now
                    ],
                )?;
                plan.plan_id.clone()
            }
        };

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO maintenance_interval (
                    interval_id, plan_id, hours, kilometers, sequence_order
                ) VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for interval in &plan.intervals {
                stmt.execute(params![
                    interval.interval_id,
                    plan_id,
                    interval.hours,
                    interval.kilometers,
                    interval.sequence_order
                ])?;
            }

            let mut stmt = tx.prepare(
                r#"INSERT INTO maintenance_activity (
                    activity_id, plan_id, code, description, category, sequence_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            )?;
            for activity in &plan.activities {
                stmt.execute(params![
                    activity.activity_id,
                    plan_id,
                    activity.code,
                    activity.description,
                    activity.category,
                    activity.sequence_order
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO activity_applicability (activity_id, interval_id) VALUES (?1, ?2)",
            )?;
            for entry in plan.matrix.entries() {
                stmt.execute(params![entry.activity_id, entry.interval_id])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            plan_id = %plan_id,
            identity = %identity,
            intervals = plan.intervals.len(),
            activities = plan.activities.len(),
            entries = plan.matrix.len(),
            "计划修订已落库"
        );
        Ok(plan_id)
    }

    fn find_by_id(&self, plan_id: &str) -> RepositoryResult<Option<Plan>> {
        let conn = self.get_conn()?;
        load_plan(&conn, plan_id)
    }

    fn find_by_identity(&self, identity: &PlanIdentity) -> RepositoryResult<Option<Plan>> {
        let conn = self.get_conn()?;
        match find_plan_id(&conn, identity)? {
            Some(plan_id) => load_plan(&conn, &plan_id),
            None => Ok(None),
        }
    }

    fn list_summaries(&self) -> RepositoryResult<Vec<PlanSummary>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT p.plan_id, p.vehicle_type, p.plan_name, p.is_active, p.revision,
                      (SELECT COUNT(*) FROM maintenance_interval i WHERE i.plan_id = p.plan_id),
                      (SELECT COUNT(*) FROM maintenance_activity a WHERE a.plan_id = p.plan_id),
                      p.updated_at
               FROM maintenance_plan p
               ORDER BY p.vehicle_type, p.plan_name"#,
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(PlanSummary {
                    plan_id: row.get(0)?,
                    vehicle_type: row.get(1)?,
                    name: row.get(2)?,
                    is_active: row.get(3)?,
                    revision: row.get(4)?,
                    intervals_count: row.get::<_, i64>(5)? as usize,
                    activities_count: row.get::<_, i64>(6)? as usize,
                    updated_at: parse_datetime(7, row.get(7)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    fn set_active(&self, plan_id: &str, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE maintenance_plan SET is_active = ?2, updated_at = ?3 WHERE plan_id = ?1",
            params![plan_id, is_active, now_text()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("MaintenancePlan", plan_id));
        }
        Ok(())
    }

    fn set_applicability(
        &self,
        plan_id: &str,
        activity_id: &str,
        interval_id: &str,
        applies: bool,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let old_value = write_cell(&tx, plan_id, activity_id, interval_id, applies)?;
        if old_value != applies {
            touch_plan(&tx, plan_id)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(plan_id, activity_id, interval_id, old_value, applies, "矩阵单元格已写入");
        Ok(old_value)
    }

    fn set_applicabilities(
        &self,
        plan_id: &str,
        cells: &[ActivityApplicability],
    ) -> RepositoryResult<Vec<bool>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut old_values = Vec::with_capacity(cells.len());
        for cell in cells {
            old_values.push(write_cell(
                &tx,
                plan_id,
                &cell.activity_id,
                &cell.interval_id,
                cell.applies,
            )?);
        }

        let changed = cells
            .iter()
            .zip(&old_values)
            .filter(|(cell, old)| cell.applies != **old)
            .count();
        if changed > 0 {
            touch_plan(&tx, plan_id)?;
        }

        // 提前返回时 tx 被丢弃，自动回滚
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(plan_id, cells = cells.len(), changed, "矩阵批量写入完成");
        Ok(old_values)
    }
}

/// 单元格写入（调用方负责事务）
///
/// # 返回
/// - Ok(old_value): 写入前的值
fn write_cell(
    conn: &Connection,
    plan_id: &str,
    activity_id: &str,
    interval_id: &str,
    applies: bool,
) -> RepositoryResult<bool> {
    if !belongs_to_plan(conn, "maintenance_activity", "activity_id", activity_id, plan_id)? {
        return Err(RepositoryError::not_found("Activity", activity_id));
    }
    if !belongs_to_plan(conn, "maintenance_interval", "interval_id", interval_id, plan_id)? {
        return Err(RepositoryError::not_found("Interval", interval_id));
    }

    let old_value = conn
        .query_row(
            "SELECT 1 FROM activity_applicability WHERE activity_id = ?1 AND interval_id = ?2",
            params![activity_id, interval_id],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if applies {
        conn.execute(
            "INSERT OR IGNORE INTO activity_applicability (activity_id, interval_id) \
             VALUES (?1, ?2)",
            params![activity_id, interval_id],
        )?;
    } else {
        conn.execute(
            "DELETE FROM activity_applicability WHERE activity_id = ?1 AND interval_id = ?2",
            params![activity_id, interval_id],
        )?;
    }
    Ok(old_value)
}

fn touch_plan(conn: &Connection, plan_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE maintenance_plan SET updated_at = ?2 WHERE plan_id = ?1",
        params![plan_id, now_text()],
    )
}
