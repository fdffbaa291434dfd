use std::sync::Arc;

use crate::application::services::{CatalogService, RatingService, RecommendationService};
use crate::domain::external::ExternalCatalog;
use crate::domain::repositories::{
    BookRepository, CategoryRepository, CommentRepository, RatingRepository, SavedBookRepository,
    TokenRepository, UserRepository,
};
use crate::infrastructure::database::Database;
use crate::infrastructure::repositories::{
    SqlBookRepository, SqlCategoryRepository, SqlCommentRepository, SqlRatingRepository,
    SqlSavedBookRepository, SqlTokenRepository, SqlUserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub book_repo: Arc<dyn BookRepository>,
    pub rating_repo: Arc<dyn RatingRepository>,
    pub saved_book_repo: Arc<dyn SavedBookRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub token_repo: Arc<dyn TokenRepository>,
    pub catalog_service: CatalogService,
    pub rating_service: RatingService,
    pub recommendation_service: RecommendationService,
}

impl AppState {
    /// Build the full application state from a database connection and an
    /// external catalog. Repositories and services are created internally.
    pub fn from_database(database: &Database, catalog: Arc<dyn ExternalCatalog>) -> Self {
        let pool = database.clone_pool();

        let book_repo: Arc<dyn BookRepository> = Arc::new(SqlBookRepository::new(pool.clone()));
        let rating_repo: Arc<dyn RatingRepository> =
            Arc::new(SqlRatingRepository::new(pool.clone()));
        let saved_book_repo: Arc<dyn SavedBookRepository> =
            Arc::new(SqlSavedBookRepository::new(pool.clone()));
        let comment_repo: Arc<dyn CommentRepository> =
            Arc::new(SqlCommentRepository::new(pool.clone()));
        let category_repo: Arc<dyn CategoryRepository> =
            Arc::new(SqlCategoryRepository::new(pool.clone()));
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqlUserRepository::new(pool.clone()));
        let token_repo: Arc<dyn TokenRepository> = Arc::new(SqlTokenRepository::new(pool));

        let catalog_service = CatalogService::new(Arc::clone(&book_repo), catalog);
        let rating_service = RatingService::new(Arc::clone(&rating_repo));
        let recommendation_service = RecommendationService::new(
            Arc::clone(&book_repo),
            Arc::clone(&rating_repo),
            Arc::clone(&saved_book_repo),
            Arc::clone(&comment_repo),
            catalog_service.clone(),
        );

        Self {
            book_repo,
            rating_repo,
            saved_book_repo,
            comment_repo,
            category_repo,
            user_repo,
            token_repo,
            catalog_service,
            rating_service,
            recommendation_service,
        }
    }
}
