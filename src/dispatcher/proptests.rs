//! Property-based tests for dispatch
//!
//! Whatever the history and whatever the endpoint does, dispatch returns the
//! input history plus exactly one exchange for the submitted message.

use super::{build_prompt, Dispatcher};
use crate::config::ChatConfig;
use crate::conversation::{Exchange, History};
use crate::llm::testing::MockLlmService;
use crate::llm::{LlmError, MessageRole};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_exchange() -> impl Strategy<Value = Exchange> {
    ("[a-zA-Z0-9 _.!?,]{0,40}", "[a-zA-Z0-9 _.!?,]{0,40}")
        .prop_map(|(user, assistant)| Exchange::new(user, assistant))
}

fn arb_history() -> impl Strategy<Value = History> {
    proptest::collection::vec(arb_exchange(), 0..12).prop_map(History::from)
}

/// Outcome the mock endpoint produces for one call
#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Connection,
    Timeout,
    Status(u16),
    Unknown,
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        3 => "[a-zA-Z0-9 ]{0,40}".prop_map(Outcome::Reply),
        1 => Just(Outcome::Connection),
        1 => Just(Outcome::Timeout),
        1 => (400u16..600).prop_map(Outcome::Status),
        1 => Just(Outcome::Unknown),
    ]
}

fn run_dispatch(message: &str, history: &History, outcome: Outcome) -> History {
    let mock = Arc::new(MockLlmService::new("llama"));
    match outcome {
        Outcome::Reply(text) => mock.queue_reply(text),
        Outcome::Connection => mock.queue_error(LlmError::connection("refused")),
        Outcome::Timeout => mock.queue_error(LlmError::timeout("slow")),
        Outcome::Status(code) => mock.queue_error(LlmError::http_status(code, "failed")),
        Outcome::Unknown => mock.queue_error(LlmError::unknown("boom")),
    }
    let dispatcher = Dispatcher::new(mock, &ChatConfig::default());

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(dispatcher.dispatch(message, history))
}

proptest! {
    #[test]
    fn prop_dispatch_extends_by_one(
        history in arb_history(),
        message in "[a-zA-Z0-9 _.!?,]{0,60}",
        outcome in arb_outcome(),
    ) {
        let result = run_dispatch(&message, &history, outcome.clone());

        prop_assert_eq!(result.len(), history.len() + 1);
        prop_assert!(result.iter().take(history.len()).eq(history.iter()));

        let last = result.last().unwrap();
        prop_assert_eq!(last.user(), message.as_str());
        if let Outcome::Reply(text) = outcome {
            prop_assert_eq!(last.assistant(), text.as_str());
        } else {
            prop_assert!(last.assistant().starts_with("Error:"));
        }
    }

    #[test]
    fn prop_prompt_shape(history in arb_history(), message in "[a-z ]{0,20}") {
        let prompt = build_prompt(&message, &history);

        prop_assert_eq!(prompt.len(), 2 * history.len() + 2);
        prop_assert_eq!(prompt[0].role, MessageRole::System);
        for (i, exchange) in history.iter().enumerate() {
            prop_assert_eq!(prompt[2 * i + 1].role, MessageRole::User);
            prop_assert_eq!(&prompt[2 * i + 1].content, exchange.user());
            prop_assert_eq!(prompt[2 * i + 2].role, MessageRole::Assistant);
            prop_assert_eq!(&prompt[2 * i + 2].content, exchange.assistant());
        }
        let last = prompt.last().unwrap();
        prop_assert_eq!(last.role, MessageRole::User);
        prop_assert_eq!(&last.content, &message);
    }
}
