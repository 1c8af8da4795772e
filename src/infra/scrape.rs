use scraper::{Html, Selector};

/// 概要として保持する最大文字数
pub const MAX_SUMMARY_CHARS: usize = 500;

/// 記事ページから抽出した情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub summary: Option<String>,
    /// `article:published_time`などの公開日時（未解析の文字列）
    pub published_at: Option<String>,
}

impl PageMetadata {
    /// HTML文書を1回だけ解析して概要と公開日時を取り出す
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            summary: summary_of(&document),
            published_at: published_time(&document),
        }
    }
}

/// HTML文書から記事の概要を抽出する
///
/// `<meta name="description">`のcontentを優先し、無ければ最初の空でない`<p>`のテキストを使う。
/// 長い場合は`truncate_summary`で切り詰める。どちらも無ければNone。
pub fn extract_summary(html: &str) -> Option<String> {
    summary_of(&Html::parse_document(html))
}

fn summary_of(document: &Html) -> Option<String> {
    meta_description(document)
        .or_else(|| first_paragraph(document))
        .map(|text| truncate_summary(&text, MAX_SUMMARY_CHARS))
}

fn published_time(document: &Html) -> Option<String> {
    let selector = Selector::parse(
        r#"meta[property="article:published_time"], meta[name="date"], meta[itemprop="datePublished"]"#,
    )
    .ok()?;
    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name]").ok()?;
    document
        .select(&selector)
        .filter(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

fn first_paragraph(document: &Html) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    document
        .select(&selector)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 文字数が`max_chars`を超える場合、先頭`max_chars`文字に"..."を付ける
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
