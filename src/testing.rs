//! In-memory stores and request helpers used by handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

use crate::{
    announcements::{
        repo::AnnouncementStore,
        repo_types::{Announcement, AnnouncementStatus, NewAnnouncement},
    },
    db::StoreError,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|u| u.email == user.email || u.phone_number == user.phone_number)
        {
            return Err(StoreError::Duplicate);
        }
        let row = User {
            id: rows.len() as i64 + 1,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            address: user.address,
            is_admin: user.is_admin,
            flagged: false,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn flag(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.flagged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryAnnouncementStore {
    rows: Mutex<Vec<Announcement>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl AnnouncementStore for MemoryAnnouncementStore {
    async fn create(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let row = Announcement {
            id,
            owner_id: new.owner_id,
            status: AnnouncementStatus::Pending,
            text: new.text,
            start_date: new.start_date,
            end_date: new.end_date,
            create_date: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Announcement>, StoreError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn update(&self, announcement: &Announcement) -> Result<Option<Announcement>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|a| a.id == announcement.id).map(|row| {
            row.text = announcement.text.clone();
            row.start_date = announcement.start_date;
            row.end_date = announcement.end_date;
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() < before)
    }

    async fn set_status(
        &self,
        id: i64,
        from: AnnouncementStatus,
        to: AnnouncementStatus,
    ) -> Result<Option<Announcement>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|a| a.id == id && a.status == from)
            .map(|row| {
                row.status = to;
                row.clone()
            }))
    }
}

/// Sends one request through the router and returns the status and JSON body
/// (`Value::Null` when the body is not JSON).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    let req = match body {
        Some(b) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_owned()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(app, method, uri, token, Some(&body.to_string())).await
}
