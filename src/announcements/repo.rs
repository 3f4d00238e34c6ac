use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    announcements::repo_types::{Announcement, AnnouncementStatus, NewAnnouncement},
    db::StoreError,
};

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    /// Inserts as `Pending` with `create_date = now()`.
    async fn create(&self, new: NewAnnouncement) -> Result<Announcement, StoreError>;
    async fn list(&self) -> Result<Vec<Announcement>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>, StoreError>;
    /// Writes `text`, `start_date` and `end_date`; owner and status are left alone.
    async fn update(&self, announcement: &Announcement) -> Result<Option<Announcement>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    /// Moves the row from `from` to `to` only if it is still in `from`.
    /// `None` means the row is gone or its status changed underneath.
    async fn set_status(
        &self,
        id: i64,
        from: AnnouncementStatus,
        to: AnnouncementStatus,
    ) -> Result<Option<Announcement>, StoreError>;
}

#[derive(Clone)]
pub struct PgAnnouncementStore {
    db: PgPool,
}

impl PgAnnouncementStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AnnouncementStore for PgAnnouncementStore {
    async fn create(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let row = sqlx::query_as::<_, Announcement>(
            r#"
            INSERT INTO announcements (owner_id, status, text, start_date, end_date)
            VALUES ($1, 'pending', $2, $3, $4)
            RETURNING id, owner_id, status, text, start_date, end_date, create_date
            "#,
        )
        .bind(new.owner_id)
        .bind(&new.text)
        .bind(new.start_date)
        .bind(new.end_date)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Announcement>, StoreError> {
        let rows = sqlx::query_as::<_, Announcement>(
            r#"
            SELECT id, owner_id, status, text, start_date, end_date, create_date
            FROM announcements
            ORDER BY create_date DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>, StoreError> {
        let row = sqlx::query_as::<_, Announcement>(
            r#"
            SELECT id, owner_id, status, text, start_date, end_date, create_date
            FROM announcements
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, announcement: &Announcement) -> Result<Option<Announcement>, StoreError> {
        let row = sqlx::query_as::<_, Announcement>(
            r#"
            UPDATE announcements
               SET text = $2, start_date = $3, end_date = $4
             WHERE id = $1
            RETURNING id, owner_id, status, text, start_date, end_date, create_date
            "#,
        )
        .bind(announcement.id)
        .bind(&announcement.text)
        .bind(announcement.start_date)
        .bind(announcement.end_date)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        from: AnnouncementStatus,
        to: AnnouncementStatus,
    ) -> Result<Option<Announcement>, StoreError> {
        let row = sqlx::query_as::<_, Announcement>(
            r#"
            UPDATE announcements
               SET status = $2
             WHERE id = $1 AND status = $3
            RETURNING id, owner_id, status, text, start_date, end_date, create_date
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(from)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
