use async_trait::async_trait;
use tracing::debug;

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{Participant, Trip},
};

/// Persistence seam for the confirmation workflow.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Loads the trip with its participants narrowed to non-owners, in the
    /// order they joined. `None` if no such trip exists.
    async fn find_trip_with_non_owner_participants(
        &self,
        trip_id: &str,
    ) -> Result<Option<Trip>, AppError>;

    /// Sets `is_confirmed` on the trip. Returns `true` only when this call
    /// changed the flag; an already confirmed or missing trip yields `false`.
    async fn mark_confirmed(&self, trip_id: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SqliteTripStore {
    db: DbPool,
}

impl SqliteTripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TripStore for SqliteTripStore {
    async fn find_trip_with_non_owner_participants(
        &self,
        trip_id: &str,
    ) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            "SELECT id, destination, starts_at, ends_at, is_confirmed FROM trips WHERE id = ?1",
        )
        .bind(trip_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(mut trip) = trip else {
            return Ok(None);
        };

        trip.participants = sqlx::query_as::<_, Participant>(
            r#"SELECT id, email, is_owner FROM participants
               WHERE trip_id = ?1 AND is_owner = 0
               ORDER BY created_at, rowid"#,
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;

        debug!(
            trip_id,
            participants = trip.participants.len(),
            "trip loaded for confirmation"
        );
        Ok(Some(trip))
    }

    async fn mark_confirmed(&self, trip_id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE trips SET is_confirmed = 1 WHERE id = ?1 AND is_confirmed = 0")
                .bind(trip_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::db::run_migrations;

    const TRIP_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    async fn seeded_store() -> SqliteTripStore {
        // A single connection keeps every query on the same in-memory database.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        run_migrations(&db).await.expect("migrations");

        sqlx::query(
            "INSERT INTO trips (id, destination, starts_at, ends_at, is_confirmed) VALUES (?1, ?2, ?3, ?4, 0)",
        )
        .bind(TRIP_ID)
        .bind("Florianópolis")
        .bind(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        .bind(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap())
        .execute(&db)
        .await
        .expect("insert trip");

        for (id, email, owner) in [
            ("p-owner", "a@x.com", true),
            ("p-b", "b@x.com", false),
            ("p-c", "c@x.com", false),
        ] {
            sqlx::query(
                "INSERT INTO participants (id, trip_id, email, is_owner) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id)
            .bind(TRIP_ID)
            .bind(email)
            .bind(owner)
            .execute(&db)
            .await
            .expect("insert participant");
        }

        SqliteTripStore::new(db)
    }

    #[tokio::test]
    async fn loads_trip_without_owners() {
        let store = seeded_store().await;
        let trip = store
            .find_trip_with_non_owner_participants(TRIP_ID)
            .await
            .expect("query")
            .expect("trip exists");

        assert_eq!(trip.destination, "Florianópolis");
        assert!(!trip.is_confirmed);
        let emails: Vec<_> = trip.participants.iter().map(|p| p.email.as_str()).collect();
        assert_eq!(emails, ["b@x.com", "c@x.com"]);
    }

    #[tokio::test]
    async fn unknown_trip_is_none() {
        let store = seeded_store().await;
        let trip = store
            .find_trip_with_non_owner_participants("00000000-0000-0000-0000-000000000000")
            .await
            .expect("query");
        assert!(trip.is_none());
    }

    #[tokio::test]
    async fn mark_confirmed_flips_only_once() {
        let store = seeded_store().await;
        assert!(store.mark_confirmed(TRIP_ID).await.expect("first write"));
        assert!(!store.mark_confirmed(TRIP_ID).await.expect("second write"));

        let trip = store
            .find_trip_with_non_owner_participants(TRIP_ID)
            .await
            .expect("query")
            .expect("trip exists");
        assert!(trip.is_confirmed);
    }
}
