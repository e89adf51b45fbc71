use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use csync_session::cookie::{SESSION_COOKIE, clear_session_cookie, set_session_cookie};
use csync_session::token::verify_session;

use crate::domain::repository::UserDirectory;
use crate::domain::types::Profile;
use crate::error::AuthFlowError;
use crate::state::AppState;
use crate::usecase::session::{ConsumeLinkUseCase, VerifyCodeInput, VerifyCodeUseCase};
use crate::usecase::start::{StartAuthInput, StartAuthUseCase, StartMode};

/// Client address for rate limiting. The beta runs behind a reverse
/// proxy, so trust `x-forwarded-for` (first hop), then `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| "local".to_owned())
}

// ── POST /api/auth/start ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartRequest {
    pub mode: StartMode,
    pub email: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<Uuid>,
}

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StartRequest>,
) -> Result<Json<StartResponse>, AuthFlowError> {
    let usecase = StartAuthUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        limiter: state.limiter.clone(),
        mailer: state.mailer.clone(),
        rate_policy: state.rate_policy,
        credential_policy: state.credential_policy,
        public_origin: state.public_origin.clone(),
    };

    let out = usecase
        .execute(StartAuthInput {
            mode: body.mode,
            email: body.email,
            profile: body.profile,
            client_ip: client_ip(&headers),
        })
        .await?;

    Ok(Json(StartResponse {
        ok: true,
        token_id: out.token_id,
    }))
}

// ── POST /api/auth/verify ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub token_id: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub async fn verify(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyRequest>,
) -> Result<(CookieJar, Json<OkResponse>), AuthFlowError> {
    let usecase = VerifyCodeUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        session_secret: state.session_secret.clone(),
    };

    let out = usecase
        .execute(VerifyCodeInput {
            token_id: body.token_id,
            code: body.code,
        })
        .await?;

    let jar = set_session_cookie(jar, out.token);
    Ok((jar, Json(OkResponse { ok: true })))
}

// ── GET /api/auth/callback ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub token: String,
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let usecase = ConsumeLinkUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        session_secret: state.session_secret.clone(),
    };

    match usecase.execute(&query.token).await {
        Ok(out) => {
            let jar = set_session_cookie(jar, out.token);
            (jar, Redirect::to(&state.post_login_path)).into_response()
        }
        // Plain text, not JSON — the link is opened in a browser tab.
        Err(_) => (StatusCode::BAD_REQUEST, "Link invalid or expired.").into_response(),
    }
}

// ── GET /api/auth/me ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<MeUser>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Json<MeResponse> {
    let anonymous = Json(MeResponse {
        ok: false,
        user: None,
    });

    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return anonymous;
    };
    // Forged, malformed, and expired tokens all land here; none gets
    // a distinct answer.
    let Ok(claims) = verify_session(cookie.value(), &state.session_secret) else {
        return anonymous;
    };

    // The directory may have lost this record across a restart; the
    // session remains valid, so answer with the bare subject.
    let (first_name, last_name) = match state.users.find_by_email(&claims.sub).await {
        Some(user) => (user.first_name, user.last_name),
        None => (None, None),
    };

    Json(MeResponse {
        ok: true,
        user: Some(MeUser {
            email: claims.sub,
            first_name,
            last_name,
        }),
    })
}

// ── POST /api/auth/logout ────────────────────────────────────────────────────

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    // Stateless sessions: clearing the client cookie is all there is.
    (clear_session_cookie(jar), Json(OkResponse { ok: true }))
}
