//! 品目コード正規化モジュール
//!
//! 参照側・ベンダー側の両方に同じ関数を適用する。
//! 片側だけ別の処理をすると照合が成立しなくなる。

/// 正規化済みの品目コード
pub type NormalizedKey = String;

/// 品目コードを照合用に正規化する
///
/// 1. 前後の空白を除去
/// 2. 先頭の `'0'` を除去
/// 3. 大文字化
///
/// 先頭ゼロの後ろに空白が続く場合（`"0 7"` など）も空白ごと除去する。
/// これにより `normalize_key(normalize_key(x)) == normalize_key(x)` が常に成り立つ。
///
/// すべてゼロのコードは空文字列になる。空文字列は「コードなし」ではなく
/// 通常のキーとして扱う（参照側にも空キーがあれば一致する）。
pub fn normalize_key(raw: &str) -> NormalizedKey {
    raw.trim_start_matches(|c: char| c == '0' || c.is_whitespace())
        .trim_end()
        .to_uppercase()
}
