use chrono::Duration;

use csync_auth::domain::clock::Clock;
use csync_auth::domain::repository::UserDirectory;
use csync_auth::domain::types::Profile;
use csync_auth::error::AuthFlowError;
use csync_auth::usecase::start::{StartAuthInput, StartAuthUseCase, StartMode};

use crate::helpers::{
    FailingMailer, code_from_email, manual_clock, start_usecase, test_state,
};

fn input(mode: StartMode, email: &str) -> StartAuthInput {
    StartAuthInput {
        mode,
        email: email.to_owned(),
        profile: None,
        client_ip: "203.0.113.9".to_owned(),
    }
}

#[tokio::test]
async fn should_issue_code_and_return_token_id() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);

    let out = start_usecase(&state)
        .execute(input(StartMode::Code, "a@b.com"))
        .await
        .unwrap();

    assert!(out.token_id.is_some(), "code mode returns a token id");
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1, "exactly one email per start call");
    assert_eq!(sent[0].to, "a@b.com");
    assert_eq!(sent[0].subject, "Your ConciergeSync sign-in code");
    assert_eq!(code_from_email(&sent[0]).len(), 6);
}

#[tokio::test]
async fn should_normalize_email_before_use() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);

    start_usecase(&state)
        .execute(input(StartMode::Code, "  User@Example.COM "))
        .await
        .unwrap();

    assert_eq!(mailer.sent()[0].to, "user@example.com");
}

#[tokio::test]
async fn should_reject_malformed_email() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);

    let result = start_usecase(&state)
        .execute(input(StartMode::Code, "not-an-address"))
        .await;

    assert!(
        matches!(result, Err(AuthFlowError::InvalidEmail)),
        "expected InvalidEmail, got {result:?}"
    );
    assert!(mailer.sent().is_empty(), "nothing is sent for bad input");
}

#[tokio::test]
async fn should_email_magic_link_without_token_id() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);

    let out = start_usecase(&state)
        .execute(input(StartMode::Link, "x@y.com"))
        .await
        .unwrap();

    assert!(out.token_id.is_none(), "link mode exposes no token id");
    let sent = mailer.sent();
    assert_eq!(sent[0].subject, "Your ConciergeSync magic link");
    let text = sent[0].text.as_deref().unwrap();
    assert!(
        text.contains("http://localhost:3000/api/auth/callback?token="),
        "link email carries the callback URL, got: {text}"
    );
}

#[tokio::test]
async fn should_create_user_with_profile_on_register() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);

    let out = start_usecase(&state)
        .execute(StartAuthInput {
            mode: StartMode::Register,
            email: "ada@example.com".to_owned(),
            profile: Some(Profile {
                first_name: Some("Ada".to_owned()),
                last_name: Some("Lovelace".to_owned()),
            }),
            client_ip: "203.0.113.9".to_owned(),
        })
        .await
        .unwrap();

    assert!(out.token_id.is_some(), "register still issues a code");
    let user = state.users.find_by_email("ada@example.com").await.unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
    assert_eq!(user.created_at, clock.now());
}

#[tokio::test]
async fn should_not_create_user_on_plain_login_start() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);

    start_usecase(&state)
        .execute(input(StartMode::Code, "new@example.com"))
        .await
        .unwrap();

    assert!(
        state.users.find_by_email("new@example.com").await.is_none(),
        "login provisions on verify, not on start"
    );
}

#[tokio::test]
async fn should_rate_limit_per_ip_across_addresses() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);
    let usecase = start_usecase(&state);

    for i in 0..30 {
        usecase
            .execute(input(StartMode::Code, &format!("user{i}@example.com")))
            .await
            .unwrap();
    }

    let result = usecase
        .execute(input(StartMode::Code, "user31@example.com"))
        .await;
    assert!(
        matches!(
            result,
            Err(AuthFlowError::RateLimited {
                hint: "Too many requests. Please wait a minute."
            })
        ),
        "expected IP rate limit, got {result:?}"
    );

    // A fresh window admits the same IP again.
    clock.advance(Duration::seconds(61));
    assert!(
        usecase
            .execute(input(StartMode::Code, "user32@example.com"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn should_rate_limit_per_email_across_ips() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);
    let usecase = start_usecase(&state);

    for i in 0..10 {
        usecase
            .execute(StartAuthInput {
                mode: StartMode::Code,
                email: "hot@example.com".to_owned(),
                profile: None,
                client_ip: format!("203.0.113.{i}"),
            })
            .await
            .unwrap();
    }

    let result = usecase
        .execute(StartAuthInput {
            mode: StartMode::Code,
            email: "hot@example.com".to_owned(),
            profile: None,
            client_ip: "203.0.113.99".to_owned(),
        })
        .await;
    assert!(
        matches!(
            result,
            Err(AuthFlowError::RateLimited {
                hint: "Please try again shortly."
            })
        ),
        "expected email rate limit, got {result:?}"
    );
}

#[tokio::test]
async fn should_discard_pending_code_when_delivery_fails() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);

    let usecase = StartAuthUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        limiter: state.limiter.clone(),
        mailer: FailingMailer,
        rate_policy: state.rate_policy,
        credential_policy: state.credential_policy,
        public_origin: state.public_origin.clone(),
    };

    let result = usecase.execute(input(StartMode::Code, "a@b.com")).await;
    assert!(
        matches!(result, Err(AuthFlowError::Delivery(_))),
        "expected Delivery, got {result:?}"
    );

    // Nothing pending survives the failed send: once every TTL has
    // passed, the sweep finds nothing to remove.
    clock.advance(Duration::seconds(
        csync_auth::domain::types::DEFAULT_LINK_TTL_SECS + 1,
    ));
    assert_eq!(state.credentials.sweep(), (0, 0));
}

#[tokio::test]
async fn should_discard_pending_link_when_delivery_fails() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);

    let usecase = StartAuthUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        limiter: state.limiter.clone(),
        mailer: FailingMailer,
        rate_policy: state.rate_policy,
        credential_policy: state.credential_policy,
        public_origin: state.public_origin.clone(),
    };

    let result = usecase.execute(input(StartMode::Link, "x@y.com")).await;
    assert!(
        matches!(result, Err(AuthFlowError::Delivery(_))),
        "expected Delivery, got {result:?}"
    );

    clock.advance(Duration::seconds(
        csync_auth::domain::types::DEFAULT_LINK_TTL_SECS + 1,
    ));
    assert_eq!(state.credentials.sweep(), (0, 0));
}
