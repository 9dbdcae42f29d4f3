//! Excel生成
//!
//! 未一致行の表を単一シートのワークブックとしてバッファに書き出す。

use crate::accumulator::UnmatchedTable;
use crate::error::{ReconcileError, Result};
use crate::types::{OUTPUT_SHEET_NAME, VENDOR_COLUMNS};
use rust_xlsxwriter::*;

/// 列幅（ItemCode, ItemName, InvQty, ConvFact）
const COLUMN_WIDTHS: [f64; 4] = [18.0, 40.0, 12.0, 12.0];

/// 数量列の列番号（数値として書き込む候補）
const NUMERIC_COLUMNS: [usize; 2] = [2, 3];

/// 1シートに書けるデータ行数の上限（xlsx の 1,048,576 行からヘッダー1行を除く）
pub const MAX_DATA_ROWS: usize = 1_048_575;

/// データ行数がシートに収まるか確認する
pub fn check_row_limit(rows: usize) -> Result<()> {
    if rows > MAX_DATA_ROWS {
        return Err(ReconcileError::Export(format!(
            "未一致データが {}行あり、xlsx の上限（ヘッダー込み 1,048,576行）を超えています。`-f csv` で出力してください",
            rows
        )));
    }
    Ok(())
}

fn export_error(context: &str, e: XlsxError) -> ReconcileError {
    ReconcileError::Export(format!("{}: {}", context, e))
}

/// 数値として解釈できればその値を返す
fn as_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Excelをバッファに生成
///
/// 0行でもヘッダー行だけのシートを出力する。
pub fn generate_excel_buffer(table: &UnmatchedTable) -> Result<Vec<u8>> {
    check_row_limit(table.len())?;

    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(OUTPUT_SHEET_NAME)
        .map_err(|e| export_error("シート名設定エラー", e))?;

    for (col, (name, width)) in VENDOR_COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *name, &header_format)
            .map_err(|e| export_error("ヘッダー書き込みエラー", e))?;
        worksheet
            .set_column_width(col, width)
            .map_err(|e| export_error("列幅設定エラー", e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| export_error("ウィンドウ枠固定エラー", e))?;

    for (i, record) in table.rows().iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in record.values().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let number = if NUMERIC_COLUMNS.contains(&col) {
                as_number(value)
            } else {
                None
            };
            let written = match number {
                Some(n) => worksheet.write_number(row, col as u16, n),
                None => worksheet.write_string(row, col as u16, *value),
            };
            written.map_err(|e| export_error("値書き込みエラー", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| export_error("Excel保存エラー", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VendorRecord;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<Data>>) {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names();
        let range = workbook.worksheet_range(&names[0]).unwrap();
        let rows = range.rows().map(|r| r.to_vec()).collect();
        (names, rows)
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let bytes = generate_excel_buffer(&UnmatchedTable::new()).unwrap();
        let (names, rows) = read_back(bytes);

        assert_eq!(names, vec![OUTPUT_SHEET_NAME.to_string()]);
        assert_eq!(rows.len(), 1);
        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, VENDOR_COLUMNS.to_vec());
    }

    #[test]
    fn test_rows_and_numeric_columns() {
        let table: UnmatchedTable = vec![
            VendorRecord {
                item_code: "XYZ".into(),
                item_name: "Gadget".into(),
                inv_qty: "5".into(),
                conv_fact: "2.5".into(),
            },
            VendorRecord {
                item_code: "12".into(),
                item_name: "Numeric code".into(),
                inv_qty: "n/a".into(),
                conv_fact: "".into(),
            },
        ]
        .into_iter()
        .collect();

        let (_, rows) = read_back(generate_excel_buffer(&table).unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], Data::String("XYZ".into()));
        assert_eq!(rows[1][2], Data::Float(5.0));
        assert_eq!(rows[1][3], Data::Float(2.5));
        // ItemCode は数値に見えても文字列のまま
        assert_eq!(rows[2][0], Data::String("12".into()));
        assert_eq!(rows[2][2], Data::String("n/a".into()));
        assert_eq!(rows[2][3], Data::Empty);
    }

    #[test]
    fn test_check_row_limit() {
        assert!(check_row_limit(0).is_ok());
        assert!(check_row_limit(MAX_DATA_ROWS).is_ok());

        let err = check_row_limit(MAX_DATA_ROWS + 1).unwrap_err();
        assert!(matches!(err, ReconcileError::Export(_)));
        let message = err.to_string();
        assert!(message.contains("1,048,576"));
        assert!(message.contains("-f csv"));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(" 10 "), Some(10.0));
        assert_eq!(as_number("abc"), None);
        assert_eq!(as_number("NaN"), None);
        assert_eq!(as_number("inf"), None);
    }
}
