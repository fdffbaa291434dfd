pub mod books;
pub mod categories;
pub mod comments;
pub mod ratings;
pub mod saved_books;
pub mod users;

pub use books::SqlBookRepository;
pub use categories::SqlCategoryRepository;
pub use comments::SqlCommentRepository;
pub use ratings::SqlRatingRepository;
pub use saved_books::SqlSavedBookRepository;
pub use users::{SqlTokenRepository, SqlUserRepository};
