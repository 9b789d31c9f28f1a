mod common;

use std::time::Duration;

use lightdesk_bot::dispatcher::Dispatcher;
use lightdesk_bot::event::UserEvent;
use lightdesk_bot::menu::{TAKE_SURVEY, WELCOME};

use common::*;

fn prompts_for(h: &Harness, user: i64) -> Vec<String> {
    h.messenger
        .sent()
        .into_iter()
        .filter_map(|s| match s {
            Sent::Prompt { chat, prompt } if chat == user => Some(prompt.text),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn each_chat_gets_its_own_worker() {
    let h = Harness::new();
    let mut dispatcher = Dispatcher::new(h.state.clone());

    dispatcher.dispatch(USER, UserEvent::Start);
    dispatcher.dispatch(OTHER_USER, UserEvent::Start);
    assert_eq!(dispatcher.active_chats(), 2);

    dispatcher.shutdown().await;

    assert_eq!(prompts_for(&h, USER), vec![WELCOME.to_string()]);
    assert_eq!(prompts_for(&h, OTHER_USER), vec![WELCOME.to_string()]);
}

#[tokio::test]
async fn events_of_one_chat_run_in_order() {
    let h = Harness::new();
    let mut dispatcher = Dispatcher::new(h.state.clone());

    dispatcher.dispatch(USER, UserEvent::Text(TAKE_SURVEY.to_string()));
    dispatcher.dispatch(USER, UserEvent::Text("Acme".to_string()));
    dispatcher.dispatch(USER, UserEvent::Text("Stage manager".to_string()));
    dispatcher.shutdown().await;

    let draft = h.store.draft(USER).unwrap();
    assert_eq!(draft.answers.org.as_deref(), Some("Acme"));
    assert_eq!(draft.answers.role.as_deref(), Some("Stage manager"));
    assert_eq!(draft.state.as_str(), "name");
}

#[tokio::test]
async fn idle_worker_hands_its_chat_to_the_next_one() {
    let h = Harness::new();
    let mut dispatcher = Dispatcher::with_idle_timeout(h.state.clone(), Duration::from_millis(20));

    dispatcher.dispatch(USER, UserEvent::Start);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.active_chats(), 0);

    // Workers keep exiting and respawning while the chat stays idle.
    for _ in 0..5 {
        dispatcher.dispatch(USER, UserEvent::Start);
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
    dispatcher.dispatch(USER, UserEvent::Text(TAKE_SURVEY.to_string()));
    dispatcher.dispatch(USER, UserEvent::Text("Acme".to_string()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    // A chat in the middle of a flow keeps its worker past the idle timeout.
    assert_eq!(dispatcher.active_chats(), 1);

    dispatcher.dispatch(USER, UserEvent::Text("Stage manager".to_string()));
    dispatcher.shutdown().await;

    let prompts = prompts_for(&h, USER);
    assert!(prompts.len() > 6);
    assert!(prompts[..6].iter().all(|p| p == WELCOME));
    let draft = h.store.draft(USER).unwrap();
    assert_eq!(draft.answers.org.as_deref(), Some("Acme"));
    assert_eq!(draft.answers.role.as_deref(), Some("Stage manager"));
    assert_eq!(draft.state.as_str(), "name");
}
