// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! API routes for authenticated users.

use crate::engine::level::{level_progress, xp_for_level, xp_for_next_level};
use crate::engine::Sample;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{QuestTemplate, UserAccount, UserQuest};
use crate::services::SampleResult;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_PER_PAGE: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(create_profile))
        .route("/api/quests", get(get_quests))
        .route("/api/quests/active", get(get_active_quests))
        .route("/api/quests/{quest_id}/accept", post(accept_quest))
        .route("/api/quests/{quest_id}/start", post(start_quest))
        .route("/api/quests/{quest_id}/samples", post(post_sample))
        .route("/api/quests/{quest_id}/abandon", post(abandon_quest))
        .route("/api/history", get(get_history))
        .route("/api/steps", post(post_steps))
        .route("/api/checkin", post(post_checkin))
        .route("/api/achievements", get(get_achievements))
}

// ─── User Profile ────────────────────────────────────────────

/// Level progress block for the profile bar.
#[derive(Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub level_floor_xp: u32,
    pub next_level_xp: u32,
    pub fraction: f64,
}

/// Current user response.
#[derive(Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub account: UserAccount,
    pub level_progress: LevelProgress,
}

fn user_response(account: UserAccount) -> UserResponse {
    let level_progress = LevelProgress {
        level: account.level,
        level_floor_xp: xp_for_level(account.level),
        next_level_xp: xp_for_next_level(account.level),
        fraction: level_progress(account.xp, account.level),
    };
    UserResponse {
        account,
        level_progress,
    }
}

/// Get current user profile and level progress.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let account = state.db.get_user(&user.user_id).await?.ok_or_else(|| {
        crate::error::AppError::NotFound(format!("User {} not found", user.user_id))
    })?;

    Ok(Json(user_response(account)))
}

/// Create the caller's account at profile setup (idempotent).
async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let account = state.quest_service.ensure_profile(&user.user_id).await?;
    Ok(Json(user_response(account)))
}

// ─── Quest Catalog ───────────────────────────────────────────

#[derive(Deserialize)]
struct QuestsQuery {
    /// Filter by environment (Indoor, Outdoor, Any)
    environment: Option<String>,
}

/// A catalog entry: the template plus derived client hints.
#[derive(Serialize)]
pub struct QuestCatalogEntry {
    #[serde(flatten)]
    pub quest: QuestTemplate,
    /// Suggested place-search radius for Active quests, in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_radius_m: Option<f64>,
}

#[derive(Serialize)]
pub struct QuestsResponse {
    pub quests: Vec<QuestCatalogEntry>,
}

/// List active quest templates.
async fn get_quests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuestsQuery>,
) -> Result<Json<QuestsResponse>> {
    let wanted = params
        .environment
        .as_deref()
        .map(|env| {
            serde_json::from_value::<crate::models::Environment>(serde_json::Value::String(
                env.to_string(),
            ))
            .map_err(|_| {
                crate::error::AppError::BadRequest(format!("Unknown environment '{}'", env))
            })
        })
        .transpose()?;

    let mut quests = state.db.list_active_quests().await?;
    if let Some(wanted) = wanted {
        quests.retain(|q| {
            q.environment == wanted || q.environment == crate::models::Environment::Any
        });
    }

    let quests = quests
        .into_iter()
        .map(|quest| {
            let route_radius_m = (quest.activity_type == crate::models::ActivityType::Active)
                .then(|| crate::engine::goal::route_goal_meters(&quest.goal));
            QuestCatalogEntry {
                quest,
                route_radius_m,
            }
        })
        .collect();

    Ok(Json(QuestsResponse { quests }))
}

// ─── Quest Lifecycle ─────────────────────────────────────────

#[derive(Serialize)]
pub struct UserQuestResponse {
    pub quest: UserQuest,
}

/// Accept a quest.
async fn accept_quest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
) -> Result<Json<UserQuestResponse>> {
    let instance = state
        .quest_service
        .accept_quest(&user.user_id, &quest_id)
        .await?;
    Ok(Json(UserQuestResponse { quest: instance }))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StartQuestBody {
    /// Destination for Active quests (picked client-side)
    destination: Option<Destination>,
}

#[derive(Deserialize)]
struct Destination {
    lat: f64,
    lon: f64,
}

/// Start an accepted quest.
async fn start_quest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
    Json(body): Json<StartQuestBody>,
) -> Result<Json<UserQuestResponse>> {
    let destination = body
        .destination
        .map(|d| validate_coordinate(d.lat, d.lon).map(|_| Point::new(d.lon, d.lat)))
        .transpose()?;

    let instance = state
        .quest_service
        .start_quest(&user.user_id, &quest_id, destination)
        .await?;
    Ok(Json(UserQuestResponse { quest: instance }))
}

/// One raw signal from the client, tagged by kind.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
enum SampleBody {
    LocationFix { lat: f64, lon: f64 },
    TimerTick,
    RepSet,
    ManualComplete,
    Pause,
    Resume,
}

#[derive(Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SampleResponse {
    Pending {
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_km: Option<f64>,
    },
    Completed {
        /// Transient banner ("+200 XP · 200 kcal burned")
        banner: String,
        xp: u32,
        level: u32,
        title: String,
        quests_this_week: u32,
        unlocked: Vec<String>,
    },
    Ignored,
}

/// Feed one raw sample to the quest's progress evaluator.
async fn post_sample(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
    Json(body): Json<SampleBody>,
) -> Result<Json<SampleResponse>> {
    let sample = match body {
        SampleBody::LocationFix { lat, lon } => {
            validate_coordinate(lat, lon)?;
            Sample::LocationFix { lon, lat }
        }
        SampleBody::TimerTick => Sample::TimerTick,
        SampleBody::RepSet => Sample::RepSet,
        SampleBody::ManualComplete => Sample::ManualComplete,
        SampleBody::Pause => Sample::Pause,
        SampleBody::Resume => Sample::Resume,
    };

    let result = state
        .quest_service
        .observe_sample(&user.user_id, &quest_id, sample)
        .await?;

    let response = match result {
        SampleResult::Pending {
            progress,
            remaining_km,
        } => SampleResponse::Pending {
            progress,
            remaining_km,
        },
        SampleResult::Completed(outcome) => SampleResponse::Completed {
            banner: outcome.banner,
            xp: outcome.xp,
            level: outcome.level,
            title: outcome.title,
            quests_this_week: outcome.quests_this_week,
            unlocked: outcome.unlocked,
        },
        SampleResult::Ignored => SampleResponse::Ignored,
    };

    Ok(Json(response))
}

/// Abandon a quest.
async fn abandon_quest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state
        .quest_service
        .abandon_quest(&user.user_id, &quest_id)
        .await?;
    Ok(Json(serde_json::json!({ "abandoned": true })))
}

/// List the caller's open quest instances.
async fn get_active_quests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let quests = state.db.list_open_user_quests(&user.user_id).await?;
    Ok(Json(serde_json::json!({ "quests": quests })))
}

// ─── Completion History ──────────────────────────────────────

#[derive(Deserialize)]
struct HistoryQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub quests: Vec<UserQuest>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

fn parse_cursor(cursor: Option<&str>) -> Result<Option<String>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || crate::error::AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            chrono::DateTime::parse_from_rfc3339(decoded_str).map_err(|_| invalid_cursor())?;
            Ok(decoded_str.to_string())
        })
        .transpose()
}

fn encode_cursor(completed_at: &str) -> String {
    URL_SAFE_NO_PAD.encode(completed_at)
}

/// Completed quests, newest first, cursor-paginated.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let limit = params.per_page.clamp(1, MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let quests = state
        .db
        .list_completed_quests(&user.user_id, cursor.as_deref(), limit)
        .await?;

    // A full page means there may be more; hand back the last timestamp
    let next_cursor = if quests.len() as u32 == limit {
        quests
            .last()
            .and_then(|q| q.completed_at.as_deref())
            .map(encode_cursor)
    } else {
        None
    };

    Ok(Json(HistoryResponse {
        quests,
        per_page: limit,
        next_cursor,
    }))
}

// ─── Stats Updates ───────────────────────────────────────────

#[derive(Deserialize)]
struct StepsBody {
    /// Cumulative pedometer count for today
    steps_today: u32,
}

/// Record a pedometer sample.
async fn post_steps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<StepsBody>,
) -> Result<Json<serde_json::Value>> {
    let account = state
        .quest_service
        .record_steps(&user.user_id, body.steps_today)
        .await?;

    match account {
        Some(account) => Ok(Json(serde_json::json!({
            "stepsToday": account.steps_today,
            "totalSteps": account.total_steps,
        }))),
        None => Err(crate::error::AppError::NotFound(format!(
            "User {} not found",
            user.user_id
        ))),
    }
}

/// Record a daily check-in.
async fn post_checkin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let account = state.quest_service.check_in(&user.user_id).await?;

    match account {
        Some(account) => Ok(Json(serde_json::json!({
            "streak": account.streak,
            "lastActive": account.last_active,
        }))),
        None => Err(crate::error::AppError::NotFound(format!(
            "User {} not found",
            user.user_id
        ))),
    }
}

// ─── Achievements ────────────────────────────────────────────

#[derive(Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub def: crate::models::AchievementDef,
    pub unlocked: bool,
}

/// Definitions joined with the caller's unlocked map.
async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let account = state.db.get_user(&user.user_id).await?.ok_or_else(|| {
        crate::error::AppError::NotFound(format!("User {} not found", user.user_id))
    })?;
    let defs = state.db.list_achievement_defs().await?;

    let achievements: Vec<AchievementStatus> = defs
        .into_iter()
        .map(|def| {
            let unlocked = account.achievements.get(&def.title).copied().unwrap_or(false);
            AchievementStatus { def, unlocked }
        })
        .collect();

    Ok(Json(serde_json::json!({ "achievements": achievements })))
}

// ─── Helpers ─────────────────────────────────────────────────

fn validate_coordinate(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(crate::error::AppError::BadRequest(format!(
            "Coordinate out of range: ({}, {})",
            lat, lon
        )));
    }
    Ok(())
}
