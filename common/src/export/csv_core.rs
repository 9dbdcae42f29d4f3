//! CSV生成
//!
//! Excelと同じ列順でUTF-8のCSVを書き出す。

use crate::accumulator::UnmatchedTable;
use crate::error::{ReconcileError, Result};
use crate::types::VENDOR_COLUMNS;

/// ヘッダーは0行でも出力するため明示的に書き、各行は `VendorRecord` の列名でシリアライズする
pub fn generate_csv_buffer(table: &UnmatchedTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(VENDOR_COLUMNS)
        .map_err(|e| ReconcileError::Export(format!("CSVヘッダー書き込みエラー: {}", e)))?;
    for record in table.rows() {
        writer
            .serialize(record)
            .map_err(|e| ReconcileError::Export(format!("CSV書き込みエラー: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ReconcileError::Export(format!("CSV保存エラー: {}", e)))
}
