pub mod cache;
pub mod health;
pub mod i18n;
pub mod images;
