pub mod books;
pub mod categories;
pub mod comments;
pub mod errors;
pub mod external;
pub mod ids;
pub mod listing;
pub mod ratings;
pub mod repositories;
pub mod saved_books;
pub mod users;

// Re-exports
pub use errors::RepositoryError;
