use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Announcement;

/// Body of `POST /announcements`. Any `owner_id` or `status` sent by the
/// client is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
}

/// Body of `PATCH /announcements/:id`; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnnouncementRequest {
    pub text: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    pub message: &'static str,
    pub announcement: Announcement,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementListResponse {
    pub message: &'static str,
    pub announcements: Vec<Announcement>,
}
