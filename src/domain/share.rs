use super::article::Article;
use serde::Serialize;
use std::fmt;

// 共有先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SharePlatform {
    X,
    Facebook,
    LinkedIn,
    Email,
}

impl SharePlatform {
    pub const ALL: [SharePlatform; 4] = [
        SharePlatform::X,
        SharePlatform::Facebook,
        SharePlatform::LinkedIn,
        SharePlatform::Email,
    ];
}

impl fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SharePlatform::X => "X",
            SharePlatform::Facebook => "Facebook",
            SharePlatform::LinkedIn => "LinkedIn",
            SharePlatform::Email => "Email",
        };
        f.write_str(name)
    }
}

/// 共有時に添える本文
pub fn share_text(title: &str) -> String {
    format!("Check out this article: {}", title)
}

/// 記事の共有リンクを作成する
pub fn share_link(article: &Article, platform: SharePlatform) -> String {
    let url = urlencoding::encode(&article.url);
    match platform {
        SharePlatform::X => format!(
            "https://twitter.com/intent/tweet?text={}&url={}",
            urlencoding::encode(&share_text(&article.title)),
            url
        ),
        SharePlatform::Facebook => {
            format!("https://www.facebook.com/sharer/sharer.php?u={}", url)
        }
        SharePlatform::LinkedIn => format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={}",
            url
        ),
        SharePlatform::Email => format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(&article.title),
            urlencoding::encode(&format!(
                "{}\n\n{}",
                share_text(&article.title),
                article.url
            ))
        ),
    }
}

/// 全共有先のリンクをまとめて作成する
pub fn share_links(article: &Article) -> Vec<(SharePlatform, String)> {
    SharePlatform::ALL
        .into_iter()
        .map(|platform| (platform, share_link(article, platform)))
        .collect()
}
