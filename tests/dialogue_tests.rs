mod common;

use anyhow::Result;

use common::TestBot;
use nutribot::dialogue::{parse_positive_number, validate_notify_time, DialogState};
use nutribot::profile::{is_profile_complete, ActivityLevel, Gender, Goal, Profile, ProfileRepository};
use nutribot::session::SessionDraft;

/// Valid numbers advance the weight step; invalid ones leave state and draft untouched
#[tokio::test]
async fn test_weight_step_validation() -> Result<()> {
    for (input, expected) in [("70", Some(70.0)), ("70,5", Some(70.5)), (" 55.2 ", Some(55.2))] {
        let bot = TestBot::new(false);
        let chat = bot.chat();
        let draft = SessionDraft {
            display_name: Some("Иван".to_string()),
            ..Default::default()
        };
        bot.sessions.start(chat, DialogState::Weight, draft).await?;

        bot.text(input).await;

        let session = bot.sessions.get(chat).await;
        assert_eq!(session.state(), Some(DialogState::Height), "input {input:?}");
        assert_eq!(session.data.weight, expected);
        assert_eq!(session.data.display_name.as_deref(), Some("Иван"));
    }

    for input in ["abc", "0", "-5", "", "NaN", "inf", "70 кг", "1e308", "501"] {
        let bot = TestBot::new(false);
        let chat = bot.chat();
        bot.sessions
            .start(chat, DialogState::Weight, SessionDraft::default())
            .await?;

        bot.text(input).await;

        let session = bot.sessions.get(chat).await;
        assert_eq!(session.state(), Some(DialogState::Weight), "input {input:?}");
        assert_eq!(session.data, SessionDraft::default());
        assert!(bot.messenger.last_text().contains("вес"));
    }
    Ok(())
}

#[tokio::test]
async fn test_height_and_age_reprompt_specifically() -> Result<()> {
    let bot = TestBot::new(false);
    let chat = bot.chat();

    bot.sessions.start(chat, DialogState::Height, SessionDraft::default()).await?;
    bot.text("высокий").await;
    assert!(bot.messenger.last_text().contains("рост"));

    bot.sessions.start(chat, DialogState::Age, SessionDraft::default()).await?;
    bot.text("-1").await;
    assert!(bot.messenger.last_text().contains("возраст"));
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Age));
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_values_are_reprompted() -> Result<()> {
    let bot = TestBot::new(false);
    let chat = bot.chat();

    bot.sessions.start(chat, DialogState::Height, SessionDraft::default()).await?;
    bot.text("350").await;
    assert!(bot.messenger.last_text().contains("рост"));
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Height));

    bot.sessions.start(chat, DialogState::Age, SessionDraft::default()).await?;
    bot.text("200").await;
    assert!(bot.messenger.last_text().contains("возраст"));
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Age));

    // A single-field edit stays open and writes nothing
    let draft = SessionDraft {
        single_field: true,
        ..Default::default()
    };
    bot.sessions.start(chat, DialogState::Weight, draft).await?;
    bot.text("1e308").await;
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Weight));
    assert_eq!(bot.profiles.get_profile(chat).await?.weight, None);
    Ok(())
}

#[tokio::test]
async fn test_cancel_words_clear_any_dialog() -> Result<()> {
    for word in ["отмена", "Стоп", "cancel", "/cancel"] {
        let bot = TestBot::new(false);
        let chat = bot.chat();
        bot.sessions.start(chat, DialogState::Age, SessionDraft::default()).await?;

        bot.text(word).await;

        assert!(bot.sessions.get(chat).await.is_idle(), "word {word:?}");
        assert_eq!(bot.messenger.last_text(), "Действие отменено.");
    }
    Ok(())
}

#[tokio::test]
async fn test_text_in_button_states_resends_keyboard() -> Result<()> {
    let bot = TestBot::new(false);
    let chat = bot.chat();

    bot.sessions.start(chat, DialogState::Sex, SessionDraft::default()).await?;
    bot.text("мужской").await;
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Sex));
    assert_eq!(
        bot.messenger.last_inline_payloads(),
        vec!["set_sex:m", "set_sex:f", "dialog:cancel"]
    );

    bot.sessions.start(chat, DialogState::Activity, SessionDraft::default()).await?;
    bot.text("средний").await;
    assert_eq!(bot.sessions.get(chat).await.state(), Some(DialogState::Activity));
    assert!(bot
        .messenger
        .last_inline_payloads()
        .contains(&"set_activity:средний".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_name_confirmation_uses_typed_name() -> Result<()> {
    let bot = TestBot::new(false);
    let chat = bot.chat();

    bot.text("/start").await;
    bot.text("Зовите меня Ваня").await;

    let session = bot.sessions.get(chat).await;
    assert_eq!(session.state(), Some(DialogState::Weight));
    assert_eq!(session.data.display_name.as_deref(), Some("Зовите меня Ваня"));

    bot.text("/start").await;
    bot.text("Да, верно").await;
    assert_eq!(
        bot.sessions.get(chat).await.data.display_name.as_deref(),
        Some("Иван")
    );
    Ok(())
}

#[tokio::test]
async fn test_restart_overwrites_pending_dialog() -> Result<()> {
    let bot = TestBot::new(false);
    let chat = bot.chat();
    let draft = SessionDraft {
        weight: Some(90.0),
        ..Default::default()
    };
    bot.sessions.start(chat, DialogState::Height, draft).await?;

    bot.sessions
        .start(chat, DialogState::NameConfirmation, SessionDraft::default())
        .await?;

    let session = bot.sessions.get(chat).await;
    assert_eq!(session.state(), Some(DialogState::NameConfirmation));
    assert_eq!(session.data.weight, None);
    Ok(())
}

#[test]
fn test_notify_time_validator() {
    for ok in ["07:30", "23:59", "00:00"] {
        assert!(validate_notify_time(ok).is_ok(), "{ok}");
    }
    for bad in ["24:00", "7:30", "07:60", "0730", "", "12:3"] {
        assert!(validate_notify_time(bad).is_err(), "{bad}");
    }
}

#[test]
fn test_numbers_must_be_positive() {
    assert_eq!(parse_positive_number("0.1"), Some(0.1));
    assert_eq!(parse_positive_number("0"), None);
    assert_eq!(parse_positive_number("-0,5"), None);
}

#[test]
fn test_profile_completeness_requires_every_field() {
    let complete = Profile {
        weight: Some(70.0),
        height: Some(175.0),
        age: Some(30.0),
        gender: Some(Gender::Female),
        activity_level: Some(ActivityLevel::Low),
        goal: Some(Goal::GainMass),
        ..Default::default()
    };
    assert!(is_profile_complete(&complete));

    let removals: Vec<fn(&mut Profile)> = vec![
        |p: &mut Profile| p.weight = None,
        |p: &mut Profile| p.height = None,
        |p: &mut Profile| p.age = None,
        |p: &mut Profile| p.gender = None,
        |p: &mut Profile| p.activity_level = None,
        |p: &mut Profile| p.goal = None,
    ];
    for remove in removals {
        let mut profile = complete.clone();
        remove(&mut profile);
        assert!(!is_profile_complete(&profile));
    }
}
