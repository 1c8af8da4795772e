use super::model::Article;
use crate::infra::parser::parse_calendar_date;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// 掲載元ごとにまとめた記事のグループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleGroup {
    /// 正規化済みの掲載元
    pub source: String,
    /// 日付の新しい順に並んだ記事
    pub articles: Vec<Article>,
}

/// 掲載元の文字列をグループ化のキーに正規化する
///
/// 先頭の`www.`（大文字小文字を問わない）だけを取り除く。
/// それ以外は大文字小文字も含めてそのまま返す。
pub fn normalize_source(source: &str) -> String {
    const PREFIX: &str = "www.";
    match source.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => source[PREFIX.len()..].to_string(),
        _ => source.to_string(),
    }
}

/// 記事を正規化した掲載元でグループ化し、各グループ内を日付の降順に並べる
///
/// - グループの順序は入力中で最初に現れた順
/// - 同じ日付の記事は入力順を保つ（安定ソート）
/// - 解釈できない日付は互いに等しいとみなし、有効な日付の後ろに置く
///
/// 入力は変更しない。
pub fn group_articles_by_source(articles: &[Article]) -> Vec<ArticleGroup> {
    let mut groups: Vec<ArticleGroup> = Vec::new();
    let mut index_by_source: HashMap<String, usize> = HashMap::new();

    for article in articles {
        let source = normalize_source(&article.source);
        let index = *index_by_source.entry(source.clone()).or_insert_with(|| {
            groups.push(ArticleGroup {
                source,
                articles: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].articles.push(article.clone());
    }

    for group in &mut groups {
        // sort_by_cached_keyは安定ソート
        group.articles.sort_by_cached_key(|article| DescendingDate(article.parsed_date()));
    }

    groups
}

/// 日付の降順、解釈できない日付は末尾となる並び順キー
#[derive(PartialEq, Eq)]
struct DescendingDate(Option<chrono::NaiveDate>);

impl Ord for DescendingDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for DescendingDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 表示用に日付を整形する（例: "Jan 5, 2025"）
///
/// 解釈できない日付はそのまま返す
pub fn format_date(date: &str) -> String {
    match parse_calendar_date(date) {
        Some(parsed) => parsed.format("%b %-d, %Y").to_string(),
        None => date.to_string(),
    }
}
