use askama::Template;

use crate::{
    error::AppError,
    models::trip::{Participant, Trip},
    services::{dates::DateFormatter, mail::OutgoingMail},
};

#[derive(Template)]
#[template(path = "mail/trip_confirmation.html")]
struct TripConfirmationTemplate<'a> {
    destination: &'a str,
    starts_on: &'a str,
    ends_on: &'a str,
    confirmation_link: &'a str,
}

/// Per-trip rendering context: the dates are formatted once and reused for
/// every guest.
pub struct TripNotice<'a> {
    trip: &'a Trip,
    web_base_url: &'a str,
    starts_on: String,
    ends_on: String,
}

impl<'a> TripNotice<'a> {
    pub fn new(trip: &'a Trip, web_base_url: &'a str, dates: &DateFormatter) -> Self {
        Self {
            trip,
            web_base_url,
            starts_on: dates.long_date(trip.starts_at),
            ends_on: dates.long_date(trip.ends_at),
        }
    }

    pub fn confirmation_link(&self, participant: &Participant) -> String {
        format!(
            "{}/participants/{}/confirm",
            self.web_base_url, participant.id
        )
    }

    pub fn render_for(&self, participant: &Participant) -> Result<OutgoingMail, AppError> {
        let confirmation_link = self.confirmation_link(participant);
        let html_body = TripConfirmationTemplate {
            destination: &self.trip.destination,
            starts_on: &self.starts_on,
            ends_on: &self.ends_on,
            confirmation_link: &confirmation_link,
        }
        .render()
        .map_err(|err| AppError::Other(err.into()))?;

        Ok(OutgoingMail {
            to: participant.email.clone(),
            subject: format!(
                "Confirme sua presença na viagem para {} em {}",
                self.trip.destination, self.starts_on
            ),
            html_body: html_body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn trip(destination: &str) -> Trip {
        Trip {
            id: "3f1c1a54-5f0f-4a4c-9a3b-2a3c4d5e6f70".into(),
            destination: destination.into(),
            starts_at: Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
            is_confirmed: false,
            participants: Vec::new(),
        }
    }

    fn guest() -> Participant {
        Participant {
            id: "guest-1".into(),
            email: "b@x.com".into(),
            is_owner: false,
        }
    }

    #[test]
    fn mail_carries_destination_dates_and_link() {
        let dates = DateFormatter::new("en_US", "%B %-d, %Y").expect("formatter");
        let trip = trip("Lisbon");
        let notice = TripNotice::new(&trip, "https://plann.er", &dates);

        let mail = notice.render_for(&guest()).expect("render");

        assert_eq!(mail.to, "b@x.com");
        assert_eq!(
            mail.subject,
            "Confirme sua presença na viagem para Lisbon em March 10, 2024"
        );
        assert!(mail.html_body.contains("<strong>Lisbon</strong>"));
        assert!(mail.html_body.contains("March 10, 2024"));
        assert!(mail.html_body.contains("March 15, 2024"));
        assert!(mail
            .html_body
            .contains(r#"href="https://plann.er/participants/guest-1/confirm""#));
    }

    #[test]
    fn destination_is_html_escaped() {
        let dates = DateFormatter::new("en_US", "%Y").expect("formatter");
        let trip = trip("<script>");
        let mail = TripNotice::new(&trip, "https://plann.er", &dates)
            .render_for(&guest())
            .expect("render");
        assert!(!mail.html_body.contains("<script>"));
        assert!(mail.html_body.contains("&lt;script&gt;"));
    }
}
