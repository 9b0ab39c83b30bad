//! CSV 导出共享逻辑
//!
//! 报表导出统一走这里：带表头的 serde 行，或动态列（答卷导出）。

use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;

use crate::errors::{Result, SurveyhubError};

/// 序列化一组 serde 行为 CSV 文本（表头取字段名）
pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    finish(wtr)
}

/// 动态列导出：先写表头，再逐行写入
pub fn records_to_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| SurveyhubError::serialization(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| SurveyhubError::serialization(format!("CSV is not UTF-8: {}", e)))
}

/// 导出文件名：`{prefix}_{YYYY-MM-DD}.csv`（UTC 日期）
pub fn export_filename(prefix: &str) -> String {
    format!("{}_{}.csv", prefix, Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "User ID")]
        user_id: String,
        #[serde(rename = "Status")]
        status: String,
    }

    #[test]
    fn test_rows_to_csv_with_headers() {
        let rows = vec![
            Row {
                user_id: "u1".into(),
                status: "complete".into(),
            },
            Row {
                user_id: "u,2".into(),
                status: "terminate".into(),
            },
        ];
        let csv = rows_to_csv(&rows).unwrap();
        assert_eq!(csv, "User ID,Status\nu1,complete\n\"u,2\",terminate\n");
    }

    #[test]
    fn test_empty_rows_produce_empty_output() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(rows_to_csv(&rows).unwrap(), "");
    }

    #[test]
    fn test_records_to_csv() {
        let headers = vec!["Sr No.".to_string(), "Q1".to_string()];
        let rows = vec![vec!["1".to_string(), "-".to_string()]];
        assert_eq!(
            records_to_csv(&headers, &rows).unwrap(),
            "Sr No.,Q1\n1,-\n"
        );
    }

    #[test]
    fn test_export_filename() {
        let name = export_filename("clicks");
        assert!(name.starts_with("clicks_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "clicks_2025-01-01.csv".len());
    }
}
