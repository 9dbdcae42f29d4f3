//! 入力ファイル形式の判定
//!
//! 宣言されたファイル名の拡張子から一度だけ判定し、以降は列挙型で分岐する。

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFormat {
    /// カンマ区切りテキスト（ISO-8859-1）
    DelimitedText,
    /// スプレッドシート（xlsx など）
    Workbook,
    /// 未対応（拡張子を保持）
    Unsupported(String),
}

impl FileFormat {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => FileFormat::DelimitedText,
            "xlsx" | "xlsm" | "xls" | "ods" => FileFormat::Workbook,
            _ => FileFormat::Unsupported(ext),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FileFormat::Unsupported(_))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::DelimitedText => write!(f, "csv"),
            FileFormat::Workbook => write!(f, "workbook"),
            FileFormat::Unsupported(ext) if ext.is_empty() => write!(f, "(拡張子なし)"),
            FileFormat::Unsupported(ext) => write!(f, "{}", ext),
        }
    }
}
