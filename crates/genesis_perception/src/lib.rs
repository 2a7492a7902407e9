pub mod learner;
pub mod page;
pub mod search;

pub use learner::{extract_insights, WebLearner};
pub use page::{strip_html, truncate_chars, PageFetcher, MAX_PAGE_CHARS};
pub use search::DuckDuckGo;
