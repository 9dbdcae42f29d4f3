use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stock-reconcile")]
#[command(about = "品目マスタとベンダー在庫CSVを照合し、未一致の品目を抽出する", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 参照ファイルとベンダーCSVを照合して未一致データを出力
    Run {
        /// 参照ファイル（csv / xlsx、VENDITEMID列が必須）
        #[arg(long, required = true)]
        reference: PathBuf,

        /// ベンダーCSV（ファイルまたはフォルダ、複数指定可）
        vendors: Vec<PathBuf>,

        /// 出力先（省略時は参照ファイルと同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (xlsx/csv/both)
        #[arg(short, long, default_value = "xlsx")]
        format: ExportFormat,

        /// チャンク行数（省略時は設定値）
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// ベンダーファイルを並列に処理
        #[arg(long)]
        parallel: bool,

        /// フォルダを再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 参照ファイルを読み込んでキー数を表示
    Check {
        /// 参照ファイル
        #[arg(required = true)]
        reference: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// チャンク行数を設定
        #[arg(long)]
        set_chunk_size: Option<usize>,

        /// 並列処理の既定値を設定
        #[arg(long)]
        set_parallel: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use xlsx, csv, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Xlsx => write!(f, "xlsx"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}
