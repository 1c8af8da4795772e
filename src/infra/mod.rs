pub mod api;
pub mod parser;
pub mod scrape;
pub mod storage;
