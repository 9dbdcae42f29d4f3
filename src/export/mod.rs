use crate::cli::ExportFormat;
use crate::error::Result;
use reconcile_common::types::{CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE};
use reconcile_common::{generate_csv_buffer, generate_excel_buffer, UnmatchedTable};
use std::path::{Path, PathBuf};

/// 書き出したファイル
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub size: usize,
}

fn is_directory_target(output: &Path) -> bool {
    output.is_dir() || output.extension().is_none()
}

fn output_path_for_format(output: &Path, stem: &str, extension: &str) -> PathBuf {
    if is_directory_target(output) {
        output.join(format!("{}.{}", stem, extension))
    } else {
        output.to_path_buf()
    }
}

fn output_paths_for_both(output: &Path, stem: &str) -> (PathBuf, PathBuf) {
    if is_directory_target(output) {
        let xlsx_path = output.join(format!("{}.xlsx", stem));
        let csv_path = output.join(format!("{}.csv", stem));
        (xlsx_path, csv_path)
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let file_stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(stem);
        let xlsx_path = parent.join(format!("{}.xlsx", file_stem));
        let csv_path = parent.join(format!("{}.csv", file_stem));
        (xlsx_path, csv_path)
    }
}

/// 既定の出力先（参照ファイルと同じフォルダ）
pub fn default_output_dir(reference: &Path) -> PathBuf {
    match reference.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_buffer(path: &Path, bytes: &[u8], content_type: &'static str) -> Result<WrittenFile> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(WrittenFile {
        path: path.to_path_buf(),
        content_type,
        size: bytes.len(),
    })
}

/// 未一致データを指定形式で書き出す
pub fn export_table(
    table: &UnmatchedTable,
    format: ExportFormat,
    output: &Path,
    stem: &str,
) -> Result<Vec<WrittenFile>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Xlsx => {
            let path = output_path_for_format(output, stem, "xlsx");
            let bytes = generate_excel_buffer(table)?;
            written.push(write_buffer(&path, &bytes, XLSX_CONTENT_TYPE)?);
        }
        ExportFormat::Csv => {
            let path = output_path_for_format(output, stem, "csv");
            let bytes = generate_csv_buffer(table)?;
            written.push(write_buffer(&path, &bytes, CSV_CONTENT_TYPE)?);
        }
        ExportFormat::Both => {
            // xlsx が行数上限で失敗しても CSV は残るよう先に書く
            let (xlsx_path, csv_path) = output_paths_for_both(output, stem);
            let bytes = generate_csv_buffer(table)?;
            written.push(write_buffer(&csv_path, &bytes, CSV_CONTENT_TYPE)?);
            let bytes = generate_excel_buffer(table)?;
            written.push(write_buffer(&xlsx_path, &bytes, XLSX_CONTENT_TYPE)?);
        }
    }

    Ok(written)
}
