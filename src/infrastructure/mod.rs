pub mod auth;
pub mod database;
pub mod openlibrary;
pub mod repositories;
