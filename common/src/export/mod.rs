//! 出力モジュール（Excel / CSV のバイト列生成）

pub mod csv_core;
pub mod excel_core;

pub use csv_core::generate_csv_buffer;
pub use excel_core::{check_row_limit, generate_excel_buffer, MAX_DATA_ROWS};
