pub mod acquisition;
pub mod browser;
pub mod http;
pub mod observer;
pub mod report;
pub mod scanner;

pub use acquisition::{select_fetcher, PageFetcher};
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use observer::{ScanObserver, TracingObserver};
pub use scanner::{validate_url, Scanner};
