use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: String,
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_confirmed: bool,
    /// Filled by the store after the trip row is loaded; only non-owners when
    /// loaded for confirmation.
    #[sqlx(skip)]
    pub participants: Vec<Participant>,
}

impl Trip {
    pub fn guests(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.is_owner)
    }
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub email: String,
    pub is_owner: bool,
}
