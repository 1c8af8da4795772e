use crate::types::{FetchError, FetchResult};
use once_cell::sync::Lazy;
use regex::Regex;

// 単語文字（文字・数字・アンダースコア）と空白以外
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// 検索キーワードをクリーニングする
///
/// 1. 前後の空白を除去
/// 2. 単語文字と空白以外の文字を除去
/// 3. 連続する空白を1つのスペースにまとめる
///
/// 結果が空になった場合は`FetchError::InvalidKeyword`を返す。
/// 呼び出し側はこの場合、外部APIを呼び出してはならない。
pub fn clean_keywords(raw: &str) -> FetchResult<String> {
    let without_symbols = NON_WORD.replace_all(raw.trim(), "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_symbols, " ");
    let cleaned = collapsed.trim();

    if cleaned.is_empty() {
        return Err(FetchError::invalid_keyword(raw));
    }
    Ok(cleaned.to_string())
}
