// ==========================================
// 特殊定尺钢筋采购优化系统 - 配筋符号仓储
// ==========================================
// 职责: 设计层配筋符号的持久化与装载 (按工程)
// 说明: 设计修订整体替换符号集, 修订结果另行版本化
// ==========================================

use crate::domain::demand::BarMarkSpec;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_date, parse_date, parse_diameter};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// BarMarkRepository - 配筋符号仓储
// ==========================================
pub struct BarMarkRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BarMarkRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换某工程的配筋符号集 (设计修订入口)
    pub fn replace_all(&self, project_id: &str, marks: &[BarMarkSpec]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM bar_mark WHERE project_id = ?", params![project_id])?;
        for mark in marks {
            tx.execute(
                r#"INSERT INTO bar_mark (
                    project_id, bar_mark, diameter, unit_length_mm, count, required_date
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    project_id,
                    &mark.bar_mark,
                    mark.diameter.as_str(),
                    &mark.unit_length_mm,
                    &mark.count,
                    mark.required_date.map(format_date),
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 装载某工程的全部配筋符号 (符号升序, 确定性)
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<BarMarkSpec>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT bar_mark, diameter, unit_length_mm, count, required_date
               FROM bar_mark
               WHERE project_id = ?
               ORDER BY bar_mark"#,
        )?;
        let marks = stmt
            .query_map(params![project_id], |row| {
                let required_date: Option<String> = row.get(4)?;
                Ok(BarMarkSpec {
                    bar_mark: row.get(0)?,
                    diameter: parse_diameter(row, 1)?,
                    unit_length_mm: row.get(2)?,
                    count: row.get(3)?,
                    required_date: match required_date {
                        Some(_) => Some(parse_date(row, 4)?),
                        None => None,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(marks)
    }

    /// 单符号查询
    pub fn find(&self, project_id: &str, bar_mark: &str) -> RepositoryResult<Option<BarMarkSpec>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT bar_mark, diameter, unit_length_mm, count, required_date
               FROM bar_mark
               WHERE project_id = ? AND bar_mark = ?"#,
            params![project_id, bar_mark],
            |row| {
                let required_date: Option<String> = row.get(4)?;
                Ok(BarMarkSpec {
                    bar_mark: row.get(0)?,
                    diameter: parse_diameter(row, 1)?,
                    unit_length_mm: row.get(2)?,
                    count: row.get(3)?,
                    required_date: match required_date {
                        Some(_) => Some(parse_date(row, 4)?),
                        None => None,
                    },
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }
}
