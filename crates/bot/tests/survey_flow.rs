mod common;

use std::sync::atomic::Ordering;

use assert_matches::assert_matches;

use lightdesk_bot::menu::{CONTINUE_SURVEY, SOMETHING_WENT_WRONG};
use lightdesk_bot::session::Mode;
use lightdesk_bot::survey::{DISCARDED, NO_DRAFT};
use lightdesk_core::answers::RowValue;
use lightdesk_core::dialogue::SurveyState;
use lightdesk_core::options::{ConsoleHelp, ExtraEquipment, Operator, Venue, YesNo};
use lightdesk_core::prompt::{Markup, STALE_BUTTON, USE_BUTTONS};

use common::*;

const FOLDER: &str = "Festival/01.01.2030-Acme-Gala";

fn reply_keys(markup: &Markup) -> Vec<String> {
    match markup {
        Markup::Reply(rows) => rows.iter().flatten().cloned().collect(),
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn full_pass_commits_the_confirmed_answers() {
    let h = Harness::new();
    let mut s = h.session(USER);

    answer_until_power(&mut s).await;
    answer_power(&mut s).await;
    answer_after_power(&mut s).await;
    let confirm = h.messenger.last_prompt();
    assert_eq!(confirm.markup.callback_data(), vec!["confirm:0", "confirm:1"]);

    press(&mut s, "confirm:0").await;

    let submissions = h.store.submissions();
    assert_eq!(submissions.len(), 1);
    let sub = &submissions[0];
    assert_eq!(sub.user_id, USER);
    assert_eq!(sub.folder_path, FOLDER);

    // What the user confirmed is exactly what was stored.
    assert_eq!(
        confirm.text,
        format!("Please check your answers:\n\n{}", sub.answers.summary().to_text())
    );

    let a = &sub.answers;
    assert_eq!(a.venue, Some(Venue::MainHall));
    assert_eq!(a.night_mount, Some(YesNo::No));
    assert_eq!(a.techs_count, Some(2));
    assert_eq!(a.extra_equipment, Some(ExtraEquipment::OwnGear));
    assert_eq!(a.plugs.as_deref(), Some("2x Schuko"));
    assert_eq!(a.power_type.as_deref(), Some("63A - 5 pin, 32A - 5 pin"));
    assert_eq!(a.power_count, Some(3));
    assert_eq!(
        a.power_where.clone().unwrap(),
        vec![
            "63A - 5 pin: Stage left",
            "63A - 5 pin: Upstage",
            "32A - 5 pin: Stage right",
        ]
    );
    assert_eq!(a.operator, Some(Operator::Client));
    assert_eq!(a.console_help, Some(ConsoleHelp::BringOwn));
    assert_eq!(a.console_model.as_deref(), Some("Avolites Tiger Touch"));
    assert_eq!(a.phone.as_deref(), Some("+79001234567"));
    assert_eq!(
        a.summary().get("Special effects"),
        Some(&RowValue::List(vec!["Haze".to_string(), "Other: Bubbles".to_string()]))
    );

    assert!(!h.store.has_draft(USER));
    let pointer = h.store.last_pointer(USER).unwrap();
    assert_eq!(pointer.submission_id, Some(sub.id));
    assert_eq!(pointer.folder_path, FOLDER);
    assert_matches!(s.mode(), Mode::Idle);
}

#[tokio::test]
async fn commit_archives_summary_document() {
    let h = Harness::new();
    let mut s = h.session(USER);
    complete_survey(&mut s).await;

    let sub = h.store.submissions().remove(0);
    assert!(h.vault.has_folder(FOLDER));

    let docx_path = format!("{FOLDER}/submission_{}_01.01.2030_Acme_Gala.docx", sub.id);
    let bytes = h.vault.file(&docx_path).expect("summary uploaded");
    assert!(bytes.starts_with(b"PK"));

    let uploads = h.store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].remote_path, docx_path);
    assert_eq!(uploads[0].submission_id, Some(sub.id));
}

#[tokio::test]
async fn vault_failures_after_commit_are_swallowed() {
    let h = Harness::new();
    h.vault.fail_ensure.store(true, Ordering::SeqCst);
    h.vault.fail_upload.store(true, Ordering::SeqCst);
    let mut s = h.session(USER);

    complete_survey(&mut s).await;

    assert_eq!(h.store.submissions().len(), 1);
    assert!(h.store.uploads().is_empty());
    let texts: Vec<String> = h.messenger.prompts().into_iter().map(|p| p.text).collect();
    assert!(texts.iter().any(|t| t.starts_with("Thank you!")));
    assert!(!texts.iter().any(|t| t == SOMETHING_WENT_WRONG));
}

#[tokio::test]
async fn committed_draft_does_not_resume() {
    let h = Harness::new();
    let mut s = h.session(USER);
    complete_survey(&mut s).await;

    let menu = h.messenger.last_prompt();
    assert!(!reply_keys(&menu.markup).contains(&CONTINUE_SURVEY.to_string()));

    say(&mut s, CONTINUE_SURVEY).await;
    assert_eq!(h.messenger.last_prompt().text, NO_DRAFT);
    assert_matches!(s.mode(), Mode::Idle);
}

#[tokio::test]
async fn invalid_date_is_reprompted_without_advancing() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, "📝 Take survey").await;
    say(&mut s, "Acme").await;
    say(&mut s, "Stage manager").await;
    say(&mut s, "Jane Doe").await;

    say(&mut s, "29.02.2021").await;
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::EventDate);
    assert!(h.messenger.last_prompt().text.contains("Event date (DD.MM.YYYY)?"));

    say(&mut s, "01.01.2030").await;
    let draft = h.store.draft(USER).unwrap();
    assert_eq!(draft.state, SurveyState::EventTitle);
    assert_eq!(draft.answers.event_date.as_deref(), Some("01.01.2030"));
}

#[tokio::test]
async fn text_on_button_step_asks_for_buttons() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, "📝 Take survey").await;
    for answer in ["Acme", "Stage manager", "Jane Doe", "01.01.2030", "Gala"] {
        say(&mut s, answer).await;
    }

    say(&mut s, "Main hall").await;
    assert_eq!(h.messenger.last_prompt().text, USE_BUTTONS);
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::Venue);
}

#[tokio::test]
async fn stale_button_gets_a_notice() {
    let h = Harness::new();
    let mut s = h.session(USER);
    say(&mut s, "📝 Take survey").await;

    press(&mut s, "venue:0").await;
    assert_eq!(h.messenger.notices(), vec![STALE_BUTTON.to_string()]);
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::Org);
}

#[tokio::test]
async fn power_toggle_redraws_keyboard_in_place() {
    let h = Harness::new();
    let mut s = h.session(USER);
    answer_until_power(&mut s).await;

    press(&mut s, "pw:t:0").await;
    let markup = h.messenger.refreshes().pop().expect("keyboard refreshed");
    let Markup::Inline(rows) = markup else {
        panic!("expected inline keyboard");
    };
    assert_eq!(rows[0][0].label, "✅ 63A - 5 pin");
    assert_eq!(h.store.draft(USER).unwrap().power.selected, vec!["63A - 5 pin"]);
    // Every press is answered.
    assert_eq!(h.messenger.notices().last().map(String::as_str), Some(""));
}

#[tokio::test]
async fn empty_power_selection_stores_none() {
    let h = Harness::new();
    let mut s = h.session(USER);
    answer_until_power(&mut s).await;
    press(&mut s, "pw:next").await;
    assert_eq!(h.store.draft(USER).unwrap().state, SurveyState::DimmerChoice);

    answer_after_power(&mut s).await;
    press(&mut s, "confirm:0").await;

    let a = h.store.submissions().remove(0).answers;
    assert_eq!(a.power_type.as_deref(), Some("None"));
    assert_eq!(a.power_where, Some(vec![]));
    assert_eq!(a.power_count, Some(0));
    assert_eq!(
        a.summary().get("Power connections"),
        Some(&RowValue::Text("No".to_string()))
    );
}

#[tokio::test]
async fn start_over_discards_and_returns_to_menu() {
    let h = Harness::new();
    let mut s = h.session(USER);
    answer_until_power(&mut s).await;
    answer_power(&mut s).await;
    answer_after_power(&mut s).await;

    press(&mut s, "confirm:1").await;

    assert!(!h.store.has_draft(USER));
    assert!(h.store.submissions().is_empty());
    assert_matches!(s.mode(), Mode::Idle);
    let menu = h.messenger.last_prompt();
    assert_eq!(menu.text, DISCARDED);
    assert!(!reply_keys(&menu.markup).contains(&CONTINUE_SURVEY.to_string()));
}
