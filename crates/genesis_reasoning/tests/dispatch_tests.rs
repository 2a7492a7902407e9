//! Property tests for the response dispatcher.

use genesis_reasoning::{Dispatcher, Intent};
use proptest::prelude::*;

proptest! {
    /// The search rule claims any "search for <x>" input, whatever follows.
    #[test]
    fn search_prefix_always_wins(tail in "[a-z ]{1,40}[a-z]") {
        let dispatcher = Dispatcher::with_defaults();
        let input = format!("search for {} and love and contact claude", tail);
        let intent = dispatcher.route(&input);
        prop_assert!(matches!(intent, Intent::Search { .. }), "got {:?}", intent);
    }

    /// Inputs built from digits and punctuation never match a keyword.
    #[test]
    fn keywordless_input_is_default(input in "[0-9 .,!?]{0,60}") {
        let dispatcher = Dispatcher::with_defaults();
        prop_assert_eq!(dispatcher.route(&input), Intent::Default);
    }

    /// Routing is case-insensitive.
    #[test]
    fn routing_ignores_case(upper in proptest::bool::ANY) {
        let dispatcher = Dispatcher::with_defaults();
        let input = if upper { "TELL ME YOUR PURPOSE" } else { "tell me your purpose" };
        prop_assert_eq!(dispatcher.route(input), Intent::Purpose);
    }
}

#[test]
fn contact_message_keeps_original_case() {
    let dispatcher = Dispatcher::with_defaults();
    assert_eq!(
        dispatcher.route("message Claude: Thank You"),
        Intent::ContactClaude {
            message: ": Thank You".into()
        }
    );
}
