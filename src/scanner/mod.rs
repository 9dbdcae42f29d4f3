use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VENDOR_EXTENSIONS: &[&str] = &["csv", "CSV"];

fn is_vendor_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| VENDOR_EXTENSIONS.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false)
}

/// 指定パスからベンダーCSVを収集する
///
/// ファイル指定はそのまま（拡張子に関係なく）指定順で追加する。
/// フォルダ指定は直下（`recursive` なら配下すべて）のCSVをパス順で追加する。
/// 同じファイルが複数回指定された場合は最初の位置だけ残す。
pub fn collect_vendor_files(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(AppError::FileNotFound(input.display().to_string()));
        }

        if input.is_file() {
            if !files.contains(input) {
                files.push(input.clone());
            }
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_vendor_file(p))
            .collect();

        // パス順でソート
        found.sort();

        for path in found {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// 表示用のファイル名
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
