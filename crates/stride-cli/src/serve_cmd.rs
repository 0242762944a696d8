use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use stride_core::auth::{AuthError, AuthService, SessionConfig, SignedIn};
use stride_core::display::format_main_workout;
use stride_core::measurements::{MeasurementError, WeeklyMeasurements, validate_week_index};
use stride_core::plan::PlanDay;
use stride_core::progress::{CompletionMap, WeekAggregator};
use stride_core::store::{TrackerStore, User};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized".to_owned(),
        }
    }

    /// The full error chain goes to the log; the client only sees `message`.
    pub fn internal(message: &'static str, err: anyhow::Error) -> Self {
        error!(error = %format!("{err:#}"), "{message}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::Store(inner) => return Self::internal("Internal server error", inner),
            AuthError::MissingCredentials | AuthError::PasswordTooShort(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MeasurementError> for AppError {
    fn from(err: MeasurementError) -> Self {
        match err {
            MeasurementError::InvalidWeekIndex(_) => Self::bad_request("Invalid week index"),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        Self::bad_request("Invalid request")
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub store: Arc<dyn TrackerStore>,
    pub plan: Arc<Vec<PlanDay>>,
    pub aggregator: WeekAggregator,
}

impl AppState {
    pub fn new(store: Arc<dyn TrackerStore>, plan: Vec<PlanDay>, session: SessionConfig) -> Self {
        Self {
            auth: AuthService::new(store.clone(), session),
            store,
            plan: Arc::new(plan),
            aggregator: WeekAggregator::default(),
        }
    }

    /// The user behind the request's session cookie, if any.
    async fn session_user(&self, jar: &CookieJar) -> Result<Option<User>, AppError> {
        let Some(cookie) = jar.get(&self.auth.config().cookie_name) else {
            return Ok(None);
        };
        Ok(self.auth.current_user(cookie.value()).await?)
    }

    async fn require_user(&self, jar: &CookieJar) -> Result<User, AppError> {
        self.session_user(jar)
            .await?
            .ok_or_else(AppError::unauthorized)
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        let config = self.auth.config();
        Cookie::build((config.cookie_name.clone(), token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(config.ttl.num_seconds()))
            .secure(config.secure)
            .build()
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        let config = self.auth.config();
        Cookie::build((config.cookie_name.clone(), ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(config.secure)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWeekResponse<'a> {
    pub id: String,
    pub label: String,
    pub total: usize,
    pub days: &'a [PlanDay],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekProgressResponse {
    pub id: String,
    pub label: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub weeks: Vec<WeekProgressResponse>,
    pub overall_completed: usize,
    pub plan_total: usize,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/plan", get(get_plan))
        .route("/api/progress", get(get_progress))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/auth/me", get(me))
        .route(
            "/api/completions",
            get(list_completions).post(save_completion),
        )
        .route(
            "/api/measurements",
            get(list_measurements).post(save_measurements),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("stride serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("stride serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// JavaScript-style truthiness of a JSON value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Week index coerced the way JavaScript's `Number()` would: numbers,
/// numeric strings and booleans. Non-integers and values below 1 are
/// rejected.
fn week_index_from_json(value: &Value) -> Result<u32, MeasurementError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    match number {
        Some(f) if f.fract() == 0.0 && f >= 1.0 && f <= f64::from(u32::MAX) => {
            validate_week_index(f as i64)
        }
        _ => Err(MeasurementError::InvalidWeekIndex(0)),
    }
}

fn signed_in_response(state: &AppState, jar: CookieJar, signed: SignedIn) -> Response {
    let jar = jar.add(state.session_cookie(signed.token));
    (jar, Json(json!({ "user": signed.user }))).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(state): State<AppState>) -> Html<String> {
    let weeks = state.aggregator.weeks(&state.plan, &CompletionMap::new());

    let body = if weeks.is_empty() {
        "<p>No workout days found in plan.</p>".to_owned()
    } else {
        weeks
            .iter()
            .map(|week| {
                let rows = week
                    .days
                    .iter()
                    .map(|day| {
                        let workout = format_main_workout(&day.main_workout)
                            .iter()
                            .map(|line| escape_html(line))
                            .collect::<Vec<_>>()
                            .join("<br>");
                        format!(
                            "<tr><td>{day}</td><td>{date}</td><td>{workout}</td></tr>",
                            day = escape_html(&day.day),
                            date = escape_html(&day.date),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "<h2 id=\"{id}\">{label}</h2>\
<table><tr><th>Day</th><th>Date</th><th>Main workout</th></tr>{rows}</table>",
                    id = week.id,
                    label = week.label,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Html(format!(
        "<!DOCTYPE html>\
<html><head><title>stride</title></head><body>\
<h1>Workout plan</h1>\
<p>{total} days | <a href=\"/api/plan\">/api/plan</a></p>\
{body}\
</body></html>",
        total = state.plan.len(),
    ))
}

async fn get_plan(State(state): State<AppState>) -> Response {
    let weeks: Vec<PlanWeekResponse<'_>> = state
        .aggregator
        .weeks(&state.plan, &CompletionMap::new())
        .into_iter()
        .map(|week| PlanWeekResponse {
            id: week.id,
            label: week.label,
            total: week.total,
            days: week.days,
        })
        .collect();

    Json(json!({ "days": state.plan.as_slice(), "weeks": weeks })).into_response()
}

async fn get_progress(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ProgressResponse>, AppError> {
    let user = state.require_user(&jar).await?;
    let completions = state
        .store
        .list_completions(user.id)
        .await
        .map_err(|e| AppError::internal("Failed to load progress", e))?;

    let summary = state.aggregator.summarize(&state.plan, &completions);
    Ok(Json(ProgressResponse {
        weeks: summary
            .weeks
            .into_iter()
            .map(|week| WeekProgressResponse {
                id: week.id,
                label: week.label,
                completed: week.completed,
                total: week.total,
            })
            .collect(),
        overall_completed: summary.overall_completed,
        plan_total: summary.plan_total,
    }))
}

async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let signed = state
        .auth
        .sign_up(&req.email, &req.password, &req.display_name)
        .await?;
    Ok(signed_in_response(&state, jar, signed))
}

async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let signed = state.auth.sign_in(&req.email, &req.password).await?;
    Ok(signed_in_response(&state, jar, signed))
}

async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(&state.auth.config().cookie_name) {
        // The cookie is cleared either way.
        if let Err(e) = state.auth.sign_out(cookie.value()).await {
            warn!(error = %e, "failed to delete session");
        }
    }
    let jar = jar.remove(state.removal_cookie());
    (jar, Json(json!({ "ok": true }))).into_response()
}

async fn me(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    match state.session_user(&jar).await? {
        Some(user) => Ok(Json(json!({ "user": user })).into_response()),
        None => Ok((StatusCode::UNAUTHORIZED, Json(json!({ "user": null }))).into_response()),
    }
}

async fn list_completions(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let user = state.require_user(&jar).await?;
    let completed = state
        .store
        .list_completions(user.id)
        .await
        .map_err(|e| AppError::internal("Failed to load completions", e))?;
    Ok(Json(json!({ "enabled": true, "completedDays": completed })).into_response())
}

async fn save_completion(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let user = state.require_user(&jar).await?;
    let Json(req) = body?;

    let day_id = match req.get("dayId") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v @ Value::Number(n)) if truthy(v) => n.to_string(),
        _ => return Err(AppError::bad_request("dayId is required")),
    };
    let is_done = req.get("isDone").is_some_and(truthy);

    state
        .store
        .upsert_completion(user.id, &day_id, is_done)
        .await
        .map_err(|e| AppError::internal("Failed to save completion", e))?;
    Ok(Json(json!({ "ok": true, "enabled": true })).into_response())
}

async fn list_measurements(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let user = state.require_user(&jar).await?;
    let by_week = state
        .store
        .list_measurements(user.id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch measurements", e))?;
    Ok(Json(json!({ "measurementsByWeek": by_week })).into_response())
}

async fn save_measurements(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let user = state.require_user(&jar).await?;
    let Json(req) = body?;

    let week = week_index_from_json(req.get("weekIndex").unwrap_or(&Value::Null))?;
    let record = match req.get("metrics") {
        None | Some(Value::Null) => WeeklyMeasurements::default(),
        Some(metrics) => WeeklyMeasurements::from_json(metrics)?,
    };

    state
        .store
        .upsert_measurements(user.id, week, &record)
        .await
        .map_err(|e| AppError::internal("Failed to save measurements", e))?;
    Ok(Json(json!({ "ok": true })).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
