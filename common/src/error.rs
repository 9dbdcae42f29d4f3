//! エラー型定義

use thiserror::Error;

/// 下位エラー（csv / calamine / io）をまとめて保持する型
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 照合処理の共通エラー型
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// 拡張子から形式を判定できない
    #[error("未対応のファイル形式です: {0}")]
    UnsupportedFormat(String),

    /// 必須列が存在しない
    #[error("{file}: 必須列 `{column}` が見つかりません")]
    Schema { file: String, column: String },

    /// 読み込み・デコード・パースの失敗
    #[error("{file}: 読み込みエラー: {source}")]
    Read {
        file: String,
        #[source]
        source: BoxError,
    },

    #[error("出力エラー: {0}")]
    Export(String),

    #[error("設定エラー: {0}")]
    Config(String),
}

impl ReconcileError {
    pub fn schema(file: &str, column: &str) -> Self {
        Self::Schema {
            file: file.to_string(),
            column: column.to_string(),
        }
    }

    pub fn read<E>(file: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Read {
            file: file.to_string(),
            source: source.into(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, ReconcileError>;
