pub mod model;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート

// model.rsから
pub use model::{Article, ArticlePatch, Language, NewArticle, DEFAULT_LANGUAGE};

// repository.rsから
pub use repository::{ArticleQuery, ArticleRepository, PgArticleRepository};

// service.rsから
pub use service::{format_date, group_articles_by_source, normalize_source, ArticleGroup};
