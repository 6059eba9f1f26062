pub mod confirmation;
pub mod dates;
pub mod mail;
pub mod notice;
pub mod trip_store;
