// ==========================================
// 特殊定尺钢筋采购优化系统 - 字段映射工具
// ==========================================
// 职责: 原始行记录 -> 强类型字段 的共用转换
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use std::collections::HashMap;

/// 取必填文本列, 空值报错
pub fn required(row: &HashMap<String, String>, row_no: usize, column: &str) -> ImportResult<String> {
    match row.get(column) {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ImportError::MissingColumn {
            row: row_no,
            column: column.to_string(),
        }),
    }
}

/// 取可选文本列 (缺失或空白 -> None)
pub fn optional(row: &HashMap<String, String>, column: &str) -> Option<String> {
    row.get(column).filter(|v| !v.is_empty()).cloned()
}

pub fn parse_i64(row: &HashMap<String, String>, row_no: usize, column: &str) -> ImportResult<i64> {
    let raw = required(row, row_no, column)?;
    raw.parse::<i64>()
        .map_err(|e| ImportError::TypeConversionError {
            row: row_no,
            field: column.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

pub fn parse_u32(row: &HashMap<String, String>, row_no: usize, column: &str) -> ImportResult<u32> {
    let raw = required(row, row_no, column)?;
    raw.parse::<u32>()
        .map_err(|e| ImportError::TypeConversionError {
            row: row_no,
            field: column.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

pub fn parse_f64(row: &HashMap<String, String>, row_no: usize, column: &str) -> ImportResult<f64> {
    let raw = required(row, row_no, column)?;
    raw.parse::<f64>()
        .map_err(|e| ImportError::TypeConversionError {
            row: row_no,
            field: column.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

/// 解析可选日期列 (YYYY-MM-DD)
pub fn parse_optional_date(
    row: &HashMap<String, String>,
    row_no: usize,
    column: &str,
) -> ImportResult<Option<NaiveDate>> {
    match optional(row, column) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ImportError::DateFormatError {
                row: row_no,
                field: column.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_rejects_empty() {
        let r = row(&[("bar_mark", "")]);
        assert!(required(&r, 2, "bar_mark").is_err());
        assert!(required(&r, 2, "missing").is_err());
    }

    #[test]
    fn test_numeric_parsing_reports_row_and_field() {
        let r = row(&[("count", "abc")]);
        match parse_u32(&r, 5, "count") {
            Err(ImportError::TypeConversionError { row, field, .. }) => {
                assert_eq!(row, 5);
                assert_eq!(field, "count");
            }
            other => panic!("期望类型转换错误, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_optional_date() {
        let r = row(&[("required_date", "2025-03-18"), ("empty", "")]);
        assert_eq!(
            parse_optional_date(&r, 2, "required_date").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 18)
        );
        assert_eq!(parse_optional_date(&r, 2, "empty").unwrap(), None);

        let bad = row(&[("required_date", "2025/03/18")]);
        assert!(parse_optional_date(&bad, 2, "required_date").is_err());
    }
}
