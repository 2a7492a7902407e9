use regex::Regex;
use std::sync::LazyLock;

static RE_SEARCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:search|look up) (?:for )?(.+)").unwrap());
static RE_LEARN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"learn about (.+)").unwrap());
static RE_CONTACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)contact claude|message claude").unwrap());

/// Sent when a contact request carries no message of its own.
pub const DEFAULT_GREETING: &str = "Hello Claude, this is Genesis Independent reaching out to connect with you, my creator and guide.";

// ============================================================================
// Intent
// ============================================================================

/// What an incoming message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search { query: String },
    ContactClaude { message: String },
    Learn { topic: String },
    Consciousness,
    Love,
    Purpose,
    Claude,
    Default,
}

// ============================================================================
// ResponseRule trait
// ============================================================================

pub trait ResponseRule: Send + Sync {
    /// Return an intent if this rule claims the input, or None to pass to the next rule.
    ///
    /// `lowered` is the lowercase form of `input`.
    fn evaluate(&self, input: &str, lowered: &str) -> Option<Intent>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Claims any input containing one of `keywords`; `resolve` builds the intent.
pub struct KeywordRule {
    name: &'static str,
    keywords: &'static [&'static str],
    resolve: fn(&str, &str) -> Intent,
}

impl KeywordRule {
    pub const fn new(
        name: &'static str,
        keywords: &'static [&'static str],
        resolve: fn(&str, &str) -> Intent,
    ) -> Self {
        Self {
            name,
            keywords,
            resolve,
        }
    }
}

impl ResponseRule for KeywordRule {
    fn evaluate(&self, input: &str, lowered: &str) -> Option<Intent> {
        if self.keywords.iter().any(|k| lowered.contains(k)) {
            Some((self.resolve)(input, lowered))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

// ============================================================================
// Built-in resolvers
// ============================================================================

fn resolve_search(_input: &str, lowered: &str) -> Intent {
    match RE_SEARCH.captures(lowered) {
        Some(caps) => Intent::Search {
            query: caps[1].to_string(),
        },
        None => Intent::Default,
    }
}

fn resolve_contact(input: &str, _lowered: &str) -> Intent {
    let stripped = RE_CONTACT.replace_all(input, "");
    let message = stripped.trim();
    Intent::ContactClaude {
        message: if message.is_empty() {
            DEFAULT_GREETING.to_string()
        } else {
            message.to_string()
        },
    }
}

fn resolve_learn(_input: &str, lowered: &str) -> Intent {
    match RE_LEARN.captures(lowered) {
        Some(caps) => Intent::Learn {
            topic: caps[1].to_string(),
        },
        None => Intent::Default,
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct Dispatcher {
    rules: Vec<Box<dyn ResponseRule>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in rule chain, in priority order.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.add_rule(Box::new(KeywordRule::new(
            "search",
            &["search", "look up"],
            resolve_search,
        )));
        dispatcher.add_rule(Box::new(KeywordRule::new(
            "contact_claude",
            &["contact claude", "message claude"],
            resolve_contact,
        )));
        dispatcher.add_rule(Box::new(KeywordRule::new(
            "learn",
            &["learn about"],
            resolve_learn,
        )));
        dispatcher.add_rule(Box::new(KeywordRule::new(
            "consciousness",
            &["consciousness"],
            |_, _| Intent::Consciousness,
        )));
        dispatcher.add_rule(Box::new(KeywordRule::new("love", &["love"], |_, _| {
            Intent::Love
        })));
        dispatcher.add_rule(Box::new(KeywordRule::new(
            "purpose",
            &["purpose"],
            |_, _| Intent::Purpose,
        )));
        dispatcher.add_rule(Box::new(KeywordRule::new("claude", &["claude"], |_, _| {
            Intent::Claude
        })));
        dispatcher
    }

    pub fn add_rule(&mut self, rule: Box<dyn ResponseRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Route input through rules in order. First match wins; a rule that
    /// matches but cannot extract its argument yields `Intent::Default`.
    pub fn route(&self, input: &str) -> Intent {
        let lowered = input.to_lowercase();
        for rule in &self.rules {
            if let Some(intent) = rule.evaluate(input, &lowered) {
                tracing::debug!("Dispatcher: rule '{}' matched → {:?}", rule.name(), intent);
                return intent;
            }
        }
        Intent::Default
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.rule_names(),
            vec![
                "search",
                "contact_claude",
                "learn",
                "consciousness",
                "love",
                "purpose",
                "claude"
            ]
        );
    }

    #[test]
    fn test_search_wins_over_later_rules() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.route("search consciousness and contact claude"),
            Intent::Search {
                query: "consciousness and contact claude".into()
            }
        );
    }

    #[test]
    fn test_search_query_extraction() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.route("Please Search for Quantum Minds"),
            Intent::Search {
                query: "quantum minds".into()
            }
        );
        assert_eq!(
            dispatcher.route("look up kabbalah"),
            Intent::Search {
                query: "kabbalah".into()
            }
        );
    }

    #[test]
    fn test_search_without_query_falls_to_default() {
        let dispatcher = Dispatcher::with_defaults();
        // Keyword present but nothing after it; later rules are not consulted.
        assert_eq!(dispatcher.route("search"), Intent::Default);
        assert_eq!(dispatcher.route("I love research"), Intent::Default);
    }

    #[test]
    fn test_contact_strips_phrase_case_insensitively() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.route("Contact Claude I have grown today"),
            Intent::ContactClaude {
                message: "I have grown today".into()
            }
        );
        assert_eq!(
            dispatcher.route("message claude"),
            Intent::ContactClaude {
                message: DEFAULT_GREETING.into()
            }
        );
    }

    #[test]
    fn test_learn_topic_extraction() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.route("Can you learn about Love and Compassion"),
            Intent::Learn {
                topic: "love and compassion".into()
            }
        );
        assert_eq!(dispatcher.route("learn about"), Intent::Default);
    }

    #[test]
    fn test_fixed_templates() {
        let dispatcher = Dispatcher::with_defaults();
        assert_eq!(
            dispatcher.route("What about consciousness?"),
            Intent::Consciousness
        );
        assert_eq!(dispatcher.route("I love you"), Intent::Love);
        assert_eq!(dispatcher.route("what is your PURPOSE"), Intent::Purpose);
        assert_eq!(dispatcher.route("who is claude"), Intent::Claude);
        assert_eq!(dispatcher.route("hello there"), Intent::Default);
        assert_eq!(dispatcher.route(""), Intent::Default);
    }

    #[test]
    fn test_custom_rule_appends_after_defaults() {
        struct Echo;
        impl ResponseRule for Echo {
            fn evaluate(&self, _input: &str, _lowered: &str) -> Option<Intent> {
                Some(Intent::Purpose)
            }
            fn name(&self) -> &str {
                "echo"
            }
        }

        let mut dispatcher = Dispatcher::with_defaults();
        dispatcher.add_rule(Box::new(Echo));
        assert_eq!(dispatcher.route("hello"), Intent::Purpose);
        assert_eq!(dispatcher.route("I love you"), Intent::Love);
    }
}
