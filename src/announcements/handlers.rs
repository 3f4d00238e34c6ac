use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    announcements::{
        dto::{
            AnnouncementListResponse, AnnouncementResponse, ChangeStatusRequest,
            CreateAnnouncementRequest, UpdateAnnouncementRequest,
        },
        repo_types::{AnnouncementStatus, NewAnnouncement},
    },
    auth::{extractors::AuthUser, policy},
    error::{internal, ApiError},
    response::MessageResponse,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(list_announcements))
        .route("/announcements/:id", get(get_announcement))
}

/// Mounted behind the auth gate.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", post(create_announcement))
        .route(
            "/announcements/:id",
            patch(update_announcement).delete(delete_announcement),
        )
        .route("/announcements/:id/status", patch(change_status))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid announcement ID"))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "announcement body rejected");
        ApiError::BadRequest("could not parse request body")
    })
}

#[instrument(skip(state))]
pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<AnnouncementListResponse>, ApiError> {
    let announcements = state
        .announcements
        .list()
        .await
        .map_err(internal("Could not fetch announcements"))?;
    if announcements.is_empty() {
        return Err(ApiError::NotFound("No announcements found"));
    }
    Ok(Json(AnnouncementListResponse {
        message: "Announcements retrieved successfully",
        announcements,
    }))
}

#[instrument(skip(state))]
pub async fn get_announcement(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<AnnouncementResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let announcement = state
        .announcements
        .find_by_id(id)
        .await
        .map_err(internal("Could not fetch announcement"))?
        .ok_or(ApiError::NotFound("Announcement not found"))?;
    Ok(Json(AnnouncementResponse {
        message: "Announcement retrieved successfully",
        announcement,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_announcement(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<CreateAnnouncementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), ApiError> {
    let req = body(payload)?;
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required"));
    }
    if req.end_date < req.start_date {
        return Err(ApiError::BadRequest("end_date must not be before start_date"));
    }

    let announcement = state
        .announcements
        .create(NewAnnouncement {
            owner_id: caller.user_id,
            text: req.text,
            start_date: req.start_date,
            end_date: req.end_date,
        })
        .await
        .map_err(internal("Could not create announcement"))?;

    info!(announcement_id = announcement.id, owner_id = caller.user_id, "announcement created");
    Ok((
        StatusCode::CREATED,
        Json(AnnouncementResponse {
            message: "Announcement created successfully",
            announcement,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_announcement(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateAnnouncementRequest>, JsonRejection>,
) -> Result<Json<AnnouncementResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let mut announcement = state
        .announcements
        .find_by_id(id)
        .await
        .map_err(internal("Could not fetch announcement"))?
        .ok_or(ApiError::NotFound("Announcement not found"))?;

    policy::ensure_can_update(&caller, &announcement).map_err(|e| {
        warn!(error = %e, caller_id = caller.user_id, owner_id = announcement.owner_id, "update denied");
        ApiError::Forbidden("You are not allowed to update this announcement")
    })?;

    let req = body(payload)?;
    if let Some(text) = req.text {
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest("text is required"));
        }
        announcement.text = text;
    }
    if let Some(start) = req.start_date {
        announcement.start_date = start;
    }
    if let Some(end) = req.end_date {
        announcement.end_date = end;
    }
    if announcement.end_date < announcement.start_date {
        return Err(ApiError::BadRequest("end_date must not be before start_date"));
    }

    let announcement = state
        .announcements
        .update(&announcement)
        .await
        .map_err(internal("Could not update announcement"))?
        .ok_or(ApiError::NotFound("Announcement not found"))?;

    info!(announcement_id = id, caller_id = caller.user_id, "announcement updated");
    Ok(Json(AnnouncementResponse {
        message: "Announcement updated successfully",
        announcement,
    }))
}

#[instrument(skip(state))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    state
        .announcements
        .find_by_id(id)
        .await
        .map_err(internal("Could not fetch announcement"))?
        .ok_or(ApiError::NotFound("Announcement not found"))?;

    policy::ensure_can_delete(&caller).map_err(|e| {
        warn!(error = %e, caller_id = caller.user_id, announcement_id = id, "delete denied");
        ApiError::Forbidden("You are not allowed to delete this announcement")
    })?;

    let deleted = state
        .announcements
        .delete(id)
        .await
        .map_err(internal("Could not delete announcement"))?;
    if !deleted {
        return Err(ApiError::NotFound("Announcement not found"));
    }

    info!(announcement_id = id, caller_id = caller.user_id, "announcement deleted");
    Ok(Json(MessageResponse {
        message: "Announcement deleted successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<AnnouncementResponse>, ApiError> {
    let id = parse_id(&raw_id)?;

    policy::ensure_can_change_status(&caller).map_err(|e| {
        warn!(error = %e, caller_id = caller.user_id, announcement_id = id, "status change denied");
        ApiError::Forbidden("You are not allowed to change the status of this announcement")
    })?;

    let raw_status = body(payload)?
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or(ApiError::BadRequest("status is required"))?;
    let next: AnnouncementStatus = raw_status
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status value"))?;

    let current = state
        .announcements
        .find_by_id(id)
        .await
        .map_err(internal("Could not fetch announcement"))?
        .ok_or(ApiError::NotFound("Announcement not found"))?;

    if !current.status.can_transition_to(next) {
        warn!(announcement_id = id, from = %current.status, to = %next, "invalid status transition");
        return Err(ApiError::Conflict("Invalid status transition"));
    }

    let updated = state
        .announcements
        .set_status(id, current.status, next)
        .await
        .map_err(internal("Could not update announcement status"))?;
    let announcement = match updated {
        Some(a) => a,
        None => {
            // Lost the race: another request moved or deleted the row first.
            let exists = state
                .announcements
                .find_by_id(id)
                .await
                .map_err(internal("Could not fetch announcement"))?
                .is_some();
            if !exists {
                return Err(ApiError::NotFound("Announcement not found"));
            }
            warn!(announcement_id = id, from = %current.status, to = %next, "status changed concurrently");
            return Err(ApiError::Conflict("Invalid status transition"));
        }
    };

    info!(announcement_id = id, from = %current.status, to = %next, "announcement status changed");
    Ok(Json(AnnouncementResponse {
        message: "Announcement status updated successfully",
        announcement,
    }))
}
