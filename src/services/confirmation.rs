use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::trip::Trip,
    services::{dates::DateFormatter, mail::Mailer, notice::TripNotice, trip_store::TripStore},
};

/// Tally of one fan-out. Failures are counted here and logged, never returned
/// as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The trip was confirmed before this call, either earlier or by a
    /// concurrent request that won the write.
    AlreadyConfirmed,
    /// This call flipped the flag and notified the guests.
    Confirmed(DispatchReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripConfirmation {
    pub redirect_url: String,
    pub outcome: ConfirmationOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTripResponse {
    pub redirect_url: String,
}

impl From<TripConfirmation> for ConfirmTripResponse {
    fn from(confirmation: TripConfirmation) -> Self {
        Self {
            redirect_url: confirmation.redirect_url,
        }
    }
}

#[derive(Clone)]
pub struct TripConfirmationService {
    store: Arc<dyn TripStore>,
    mailer: Arc<dyn Mailer>,
    dates: DateFormatter,
    web_base_url: String,
}

impl TripConfirmationService {
    pub fn new(
        store: Arc<dyn TripStore>,
        mailer: Arc<dyn Mailer>,
        dates: DateFormatter,
        web_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            dates,
            web_base_url: web_base_url.into(),
        }
    }

    pub fn redirect_url(&self, trip_id: &str) -> String {
        format!("{}/trips/{}", self.web_base_url, trip_id)
    }

    /// Confirms the trip and mails every non-owner participant.
    ///
    /// Mails go out only from the call whose write flips `is_confirmed`;
    /// repeated or concurrent calls return the same redirect without sending
    /// anything. Delivery failures never fail the confirmation.
    #[tracing::instrument(name = "confirm_trip", skip(self))]
    pub async fn confirm_trip(&self, trip_id: &str) -> Result<TripConfirmation, AppError> {
        let trip_id = parse_trip_id(trip_id)?;

        let trip = self
            .store
            .find_trip_with_non_owner_participants(&trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found.".into()))?;

        let redirect_url = self.redirect_url(&trip_id);

        if trip.is_confirmed {
            info!("trip already confirmed, nothing to send");
            return Ok(TripConfirmation {
                redirect_url,
                outcome: ConfirmationOutcome::AlreadyConfirmed,
            });
        }

        // The write runs on its own task so a dropped request cannot leave it
        // half way; awaiting the handle does not tie its lifetime to ours.
        let store = Arc::clone(&self.store);
        let write_id = trip_id.clone();
        let flipped = tokio::spawn(async move { store.mark_confirmed(&write_id).await })
            .await
            .map_err(|err| AppError::Other(err.into()))??;

        if !flipped {
            info!("trip confirmed by a concurrent request, skipping notifications");
            return Ok(TripConfirmation {
                redirect_url,
                outcome: ConfirmationOutcome::AlreadyConfirmed,
            });
        }

        let report = self.notify_guests(&trip).await;
        Ok(TripConfirmation {
            redirect_url,
            outcome: ConfirmationOutcome::Confirmed(report),
        })
    }

    async fn notify_guests(&self, trip: &Trip) -> DispatchReport {
        let notice = TripNotice::new(trip, &self.web_base_url, &self.dates);
        let mut report = DispatchReport::default();
        let mut sends = JoinSet::new();

        for participant in trip.guests() {
            let mail = match notice.render_for(participant) {
                Ok(mail) => mail,
                Err(err) => {
                    warn!(participant_id = %participant.id, "could not render confirmation mail: {err}");
                    report.failed += 1;
                    continue;
                }
            };
            let mailer = Arc::clone(&self.mailer);
            sends.spawn(async move {
                let result = mailer.send(&mail).await;
                (mail.to, result)
            });
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.sent += 1,
                Ok((to, Err(err))) => {
                    warn!(to = %to, "confirmation mail failed: {err}");
                    report.failed += 1;
                }
                Err(err) => {
                    warn!("confirmation mail task did not finish: {err}");
                    report.failed += 1;
                }
            }
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            "confirmation mails dispatched"
        );
        report
    }
}

/// Accepts only the 8-4-4-4-12 hyphenated form, in either case, and returns it
/// lowercased for the store. Braced, URN, simple and padded ids are rejected.
fn parse_trip_id(raw: &str) -> Result<String, AppError> {
    let invalid = || AppError::InvalidArgument(format!("Invalid trip id: {raw:?}"));
    if raw.len() != 36 {
        return Err(invalid());
    }
    Uuid::try_parse(raw)
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| invalid())
}
