//! Infrastructure layer: parsing, HTTP retrieval, configuration, logging and
//! artifact persistence.

pub mod config;
pub mod logging;
pub mod output;
pub mod page_fetcher;
pub mod parsing;
pub mod parsing_error;
pub mod simple_http_client;

pub use config::{AppConfig, ConfigManager};
pub use output::{OutputError, read_listing, write_json_atomic};
pub use page_fetcher::{FetchError, FetchMode, PageFetcher};
pub use parsing::{CaseDetailParser, CaseListParser, ParsingConfig, ParsingError, ParsingResult};
pub use simple_http_client::{HttpClient, HttpClientConfig};
