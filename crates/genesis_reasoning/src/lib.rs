pub mod anthropic;
pub mod api_types;
pub mod dispatcher;
pub mod relay;
pub mod replies;

pub use anthropic::AnthropicClient;
pub use dispatcher::{Dispatcher, Intent, KeywordRule, ResponseRule, DEFAULT_GREETING};
pub use relay::ClaudeRelay;
