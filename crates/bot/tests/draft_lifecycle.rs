mod common;

use assert_matches::assert_matches;

use lightdesk_bot::menu::{CONTINUE_SURVEY, TAKE_SURVEY};
use lightdesk_bot::session::Mode;
use lightdesk_bot::survey::DRAFT_UNREADABLE;
use lightdesk_core::dialogue::SurveyState;
use lightdesk_core::draft::{PAUSED, PAUSE_REFUSED};
use lightdesk_core::prompt::{Markup, PAUSE_LABEL, USE_BUTTONS};

use common::*;

#[tokio::test]
async fn resume_after_restart_shows_the_same_prompt() {
    let h = Harness::new();
    let mut s = h.session(USER);
    answer_until_power(&mut s).await;
    press(&mut s, "pw:t:0").await;
    press(&mut s, "pw:next").await;
    say(&mut s, "3").await;
    press(&mut s, "pw:w:0").await;

    let before = h.messenger.last_prompt();
    assert!(before.text.ends_with("(2 left)"));

    // A new session stands in for a process restart.
    let mut restarted = h.session(USER);
    say(&mut restarted, CONTINUE_SURVEY).await;
    assert_eq!(h.messenger.last_prompt(), before);

    press(&mut restarted, "pw:w:1").await;
    assert!(h.messenger.last_prompt().text.ends_with("(1 left)"));
}

#[tokio::test]
async fn pause_inside_power_block_is_refused() {
    let h = Harness::new();
    let mut s = h.session(USER);
    answer_until_power(&mut s).await;
    press(&mut s, "pw:t:0").await;

    say(&mut s, PAUSE_LABEL).await;

    assert_eq!(h.messenger.last_prompt().text, PAUSE_REFUSED);
    assert_matches!(s.mode(), Mode::Survey(d) if d.state == SurveyState::PowerTypeSelect);
}

#[tokio::test]
async fn pause_keeps_draft_and_offers_continue() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, TAKE_SURVEY).await;
    for answer in ["Acme", "Stage manager", "Jane Doe", "01.01.2030", "Gala"] {
        say(&mut s, answer).await;
    }
    let venue_prompt = h.messenger.last_prompt();

    say(&mut s, PAUSE_LABEL).await;

    let menu = h.messenger.last_prompt();
    assert_eq!(menu.text, PAUSED);
    let Markup::Reply(rows) = menu.markup else {
        panic!("expected main menu");
    };
    assert!(rows.iter().flatten().any(|k| k == CONTINUE_SURVEY));
    assert_matches!(s.mode(), Mode::Idle);
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::Venue);

    say(&mut s, CONTINUE_SURVEY).await;
    assert_eq!(h.messenger.last_prompt(), venue_prompt);
}

#[tokio::test]
async fn take_survey_with_saved_draft_asks_first() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, TAKE_SURVEY).await;
    say(&mut s, "Acme").await;

    let mut later = h.session(USER);
    say(&mut later, TAKE_SURVEY).await;
    assert_eq!(
        h.messenger.last_prompt().markup.callback_data(),
        vec!["draft:0", "draft:1"]
    );
    assert_matches!(later.mode(), Mode::DraftChoice);

    say(&mut later, "whatever").await;
    assert_eq!(h.messenger.last_prompt().text, USE_BUTTONS);

    press(&mut later, "draft:0").await;
    assert_matches!(later.mode(), Mode::Survey(d) if d.state == SurveyState::Role);
}

#[tokio::test]
async fn start_over_replaces_saved_draft() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, TAKE_SURVEY).await;
    say(&mut s, "Acme").await;
    say(&mut s, TAKE_SURVEY).await;

    press(&mut s, "draft:1").await;

    let draft = h.store.draft(USER).unwrap();
    assert_eq!(draft.state, SurveyState::Org);
    assert_eq!(draft.answers.org, None);
    assert!(h.messenger.last_prompt().text.contains("organization"));
}

#[tokio::test]
async fn unreadable_draft_restarts_the_survey() {
    let h = Harness::new();
    h.store.corrupt_draft(USER);
    let mut s = h.session(USER);

    say(&mut s, CONTINUE_SURVEY).await;

    let texts: Vec<String> = h.messenger.prompts().into_iter().map(|p| p.text).collect();
    assert!(texts.contains(&DRAFT_UNREADABLE.to_string()));
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::Org);
    assert_matches!(s.mode(), Mode::Survey(d) if d.state == SurveyState::Org);
}

#[tokio::test]
async fn documents_key_keeps_survey_open() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, TAKE_SURVEY).await;
    say(&mut s, "Acme").await;

    say(&mut s, "📂 Documents").await;

    assert_matches!(s.mode(), Mode::Survey(_));
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::Role);
}
