pub mod http;
pub mod news;
pub mod provider;
pub mod web_search;

pub use http::{HttpClient, MockHttpClient, ReqwestHttpClient};
pub use news::{NewsApiClient, NewsApiConfig};
pub use provider::{ArticleProvider, ProviderResponse, SourceKind};
pub use web_search::{WebSearchClient, WebSearchConfig};
