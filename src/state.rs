use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    error::AppError,
    services::{
        confirmation::TripConfirmationService, dates::DateFormatter, mail::Mailer,
        trip_store::SqliteTripStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub confirmation: TripConfirmationService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, mailer: Arc<dyn Mailer>) -> Result<Self, AppError> {
        let dates = DateFormatter::new(&config.date_locale, config.date_pattern.clone())?;
        let store = Arc::new(SqliteTripStore::new(db.clone()));
        let confirmation =
            TripConfirmationService::new(store, mailer, dates, config.web_base_url.clone());
        Ok(Self {
            config,
            db,
            confirmation,
        })
    }
}
