use chrono::Duration;

use csync_auth::domain::clock::Clock;
use csync_auth::domain::repository::UserDirectory;
use csync_auth::domain::types::{DEFAULT_CODE_TTL_SECS, Profile};
use csync_auth::error::AuthFlowError;
use csync_auth::usecase::session::VerifyCodeInput;
use csync_auth::usecase::start::{StartAuthInput, StartMode};
use csync_session::token::verify_session;

use crate::helpers::{
    TEST_SECRET, code_from_email, manual_clock, start_usecase, test_state, verify_usecase,
};

/// Run start() in code mode and return (token_id, plaintext code).
async fn issue_code(
    state: &csync_auth::state::AppState,
    mailer: &csync_auth::mailer::MemoryMailer,
    email: &str,
) -> (String, String) {
    let out = start_usecase(state)
        .execute(StartAuthInput {
            mode: StartMode::Code,
            email: email.to_owned(),
            profile: None,
            client_ip: "203.0.113.9".to_owned(),
        })
        .await
        .unwrap();
    let sent = mailer.sent();
    let code = code_from_email(sent.last().unwrap());
    (out.token_id.unwrap().to_string(), code)
}

fn wrong(code: &str) -> String {
    if code == "000000" {
        "000001".to_owned()
    } else {
        "000000".to_owned()
    }
}

#[tokio::test]
async fn should_verify_correct_code_exactly_once() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "a@b.com").await;
    let usecase = verify_usecase(&state);

    let out = usecase
        .execute(VerifyCodeInput {
            token_id: token_id.clone(),
            code: code.clone(),
        })
        .await
        .unwrap();
    assert_eq!(out.email, "a@b.com");

    let claims = verify_session(&out.token, TEST_SECRET).unwrap();
    assert_eq!(claims.sub, "a@b.com");

    // Single-use: the same token id and code now name nothing.
    let again = usecase
        .execute(VerifyCodeInput { token_id, code })
        .await;
    assert!(
        matches!(again, Err(AuthFlowError::InvalidCredential)),
        "expected InvalidCredential, got {again:?}"
    );
}

#[tokio::test]
async fn should_auto_provision_user_on_first_verify() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "new@example.com").await;

    assert!(state.users.find_by_email("new@example.com").await.is_none());

    verify_usecase(&state)
        .execute(VerifyCodeInput { token_id, code })
        .await
        .unwrap();

    let user = state.users.find_by_email("new@example.com").await.unwrap();
    assert_eq!(user.created_at, clock.now());
    assert!(user.first_name.is_none());
}

#[tokio::test]
async fn should_keep_registered_profile_when_verify_provisions() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);

    let out = start_usecase(&state)
        .execute(StartAuthInput {
            mode: StartMode::Register,
            email: "ada@example.com".to_owned(),
            profile: Some(Profile {
                first_name: Some("Ada".to_owned()),
                last_name: None,
            }),
            client_ip: "203.0.113.9".to_owned(),
        })
        .await
        .unwrap();
    let token_id = out.token_id.unwrap().to_string();
    let code = code_from_email(mailer.sent().last().unwrap());

    verify_usecase(&state)
        .execute(VerifyCodeInput { token_id, code })
        .await
        .unwrap();

    // Verify must not overwrite the record created at registration.
    let user = state.users.find_by_email("ada@example.com").await.unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn should_count_incorrect_attempt_without_destroying_record() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "a@b.com").await;
    let usecase = verify_usecase(&state);

    let miss = usecase
        .execute(VerifyCodeInput {
            token_id: token_id.clone(),
            code: wrong(&code),
        })
        .await;
    assert!(
        matches!(miss, Err(AuthFlowError::IncorrectCode)),
        "expected IncorrectCode, got {miss:?}"
    );

    // The record survived the miss; the correct code still works.
    assert!(
        usecase
            .execute(VerifyCodeInput { token_id, code })
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn should_exhaust_attempts_on_seventh_call_even_if_correct() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "a@b.com").await;
    let usecase = verify_usecase(&state);

    for _ in 0..6 {
        let miss = usecase
            .execute(VerifyCodeInput {
                token_id: token_id.clone(),
                code: wrong(&code),
            })
            .await;
        assert!(
            matches!(miss, Err(AuthFlowError::IncorrectCode)),
            "expected IncorrectCode, got {miss:?}"
        );
    }

    let seventh = usecase
        .execute(VerifyCodeInput {
            token_id: token_id.clone(),
            code: code.clone(),
        })
        .await;
    assert!(
        matches!(seventh, Err(AuthFlowError::AttemptsExhausted)),
        "expected AttemptsExhausted, got {seventh:?}"
    );

    // The ceiling destroyed the record.
    let after = usecase
        .execute(VerifyCodeInput { token_id, code })
        .await;
    assert!(
        matches!(after, Err(AuthFlowError::InvalidCredential)),
        "expected InvalidCredential, got {after:?}"
    );
}

#[tokio::test]
async fn should_reject_code_at_exactly_expiry() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "a@b.com").await;

    clock.advance(Duration::seconds(DEFAULT_CODE_TTL_SECS));
    let result = verify_usecase(&state)
        .execute(VerifyCodeInput { token_id, code })
        .await;
    assert!(
        matches!(result, Err(AuthFlowError::InvalidCredential)),
        "expected InvalidCredential, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_code_one_second_past_expiry() {
    let clock = manual_clock();
    let (state, mailer) = test_state(&clock);
    let (token_id, code) = issue_code(&state, &mailer, "a@b.com").await;

    clock.advance(Duration::seconds(DEFAULT_CODE_TTL_SECS + 1));
    let result = verify_usecase(&state)
        .execute(VerifyCodeInput { token_id, code })
        .await;
    assert!(
        matches!(result, Err(AuthFlowError::InvalidCredential)),
        "expected InvalidCredential, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_unparseable_token_id() {
    let clock = manual_clock();
    let (state, _mailer) = test_state(&clock);

    let result = verify_usecase(&state)
        .execute(VerifyCodeInput {
            token_id: "not-a-token".to_owned(),
            code: "123456".to_owned(),
        })
        .await;
    assert!(
        matches!(result, Err(AuthFlowError::InvalidCredential)),
        "expected InvalidCredential, got {result:?}"
    );
}
