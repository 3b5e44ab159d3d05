// ==========================================
// 特殊定尺钢筋采购优化系统 - 修订版本仓储
// ==========================================
// 职责: 修订头记录的创建/查询/取代标记
// 红线: 修订行只增不改 (status 标记 SUPERSEDED 除外),
//       重复 revision_id 写入视为审计违规
// ==========================================

use crate::domain::types::{Objective, RevisionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 修订头记录
#[derive(Debug, Clone)]
pub struct RevisionRecord {
    pub revision_id: String,
    pub project_id: String,
    pub revision_no: i32,
    pub objective: Objective,
    pub status: RevisionStatus,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

// ==========================================
// RevisionRepository - 修订版本仓储
// ==========================================
pub struct RevisionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevisionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建修订头 (同事务内分配 revision_no, 并发安全)
    pub fn create_with_next_revision_no(
        &self,
        record: &mut RevisionRecord,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM revision WHERE revision_id = ? LIMIT 1",
                params![&record.revision_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(RepositoryError::ImmutableRevisionViolation(
                record.revision_id.clone(),
            ));
        }

        let max_no: Option<i32> = tx.query_row(
            "SELECT MAX(revision_no) FROM revision WHERE project_id = ?",
            params![&record.project_id],
            |row| row.get(0),
        )?;
        record.revision_no = max_no.unwrap_or(0) + 1;

        tx.execute(
            r#"INSERT INTO revision (
                revision_id, project_id, revision_no, objective,
                status, created_at, elapsed_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &record.revision_id,
                &record.project_id,
                &record.revision_no,
                record.objective.as_str(),
                record.status.to_db_str(),
                record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                &record.elapsed_ms,
            ],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(record.revision_id.clone())
    }

    /// 结果全部落库后的收尾: 同一事务内取代旧修订并置本修订为完成。
    /// 中途失败的修订停留在 COMPUTING, 不影响既有生效修订
    pub fn mark_completed(&self, revision_id: &str, project_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE revision SET status = 'COMPLETED'
             WHERE revision_id = ? AND status = 'COMPUTING'",
            params![revision_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "计算中修订".to_string(),
                id: revision_id.to_string(),
            });
        }

        // 旧修订标记为已取代 (历史保留)
        tx.execute(
            "UPDATE revision SET status = 'SUPERSEDED'
             WHERE project_id = ? AND status = 'COMPLETED' AND revision_id != ?",
            params![project_id, revision_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    /// 按 revision_id 查询
    pub fn find_by_id(&self, revision_id: &str) -> RepositoryResult<Option<RevisionRecord>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT revision_id, project_id, revision_no, objective,
                      status, created_at, elapsed_ms
               FROM revision
               WHERE revision_id = ?"#,
            params![revision_id],
            map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// 某工程全部修订 (修订号降序, 时间线协作方消费)
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<RevisionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT revision_id, project_id, revision_no, objective,
                      status, created_at, elapsed_ms
               FROM revision
               WHERE project_id = ?
               ORDER BY revision_no DESC"#,
        )?;
        let records = stmt
            .query_map(params![project_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 某工程最新完成修订
    pub fn latest_completed(&self, project_id: &str) -> RepositoryResult<Option<RevisionRecord>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT revision_id, project_id, revision_no, objective,
                      status, created_at, elapsed_ms
               FROM revision
               WHERE project_id = ? AND status IN ('COMPLETED', 'SUPERSEDED')
               ORDER BY revision_no DESC
               LIMIT 1"#,
            params![project_id],
            map_row,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RevisionRecord> {
    let objective_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    let objective = Objective::from_str(&objective_str).map_err(field_err(3))?;
    let status = RevisionStatus::from_db_str(&status_str).map_err(field_err(4))?;
    let created_at = NaiveDateTime::parse_from_str(&created_str, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?
        .and_utc();

    Ok(RevisionRecord {
        revision_id: row.get(0)?,
        project_id: row.get(1)?,
        revision_no: row.get(2)?,
        objective,
        status,
        created_at,
        elapsed_ms: row.get(6)?,
    })
}

fn field_err(idx: usize) -> impl Fn(String) -> rusqlite::Error {
    move |e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    }
}
