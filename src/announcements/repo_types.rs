use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Lifecycle of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "announcement_status", rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Pending,
    Accepted,
    Declined,
    Active,
    Deactivated,
}

impl AnnouncementStatus {
    /// pending -> accepted | declined, accepted -> active, active -> deactivated.
    pub fn can_transition_to(self, next: AnnouncementStatus) -> bool {
        use AnnouncementStatus::*;
        match self {
            Pending => matches!(next, Accepted | Declined),
            Accepted => matches!(next, Active),
            Active => matches!(next, Deactivated),
            Declined | Deactivated => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnnouncementStatus::Pending => "pending",
            AnnouncementStatus::Accepted => "accepted",
            AnnouncementStatus::Declined => "declined",
            AnnouncementStatus::Active => "active",
            AnnouncementStatus::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for AnnouncementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownStatus;

impl FromStr for AnnouncementStatus {
    type Err = UnknownStatus;

    /// Accepts the lowercase name (any case) or the legacy ordinal `0..=4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "0" => AnnouncementStatus::Pending,
            "accepted" | "1" => AnnouncementStatus::Accepted,
            "declined" | "2" => AnnouncementStatus::Declined,
            "active" | "3" => AnnouncementStatus::Active,
            "deactivated" | "4" => AnnouncementStatus::Deactivated,
            _ => return Err(UnknownStatus),
        };
        Ok(status)
    }
}

/// Announcement record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Announcement {
    pub id: i64,
    pub owner_id: i64, // set from the caller at creation, never changed
    pub status: AnnouncementStatus,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub create_date: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub owner_id: i64,
    pub text: String,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
}
