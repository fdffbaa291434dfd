use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::books::{Book, NewBook};
use crate::domain::categories::{Category, NewCategory};
use crate::domain::comments::{BookComment, NewComment};
use crate::domain::errors::RepositoryError;
use crate::domain::ids::{BookId, UserId};
use crate::domain::listing::PageRequest;
use crate::domain::ratings::UserRating;
use crate::domain::saved_books::SavedBook;
use crate::domain::users::{NewToken, NewUser, Token, User};

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError>;
    async fn get(&self, id: BookId) -> Result<Book, RepositoryError>;
    async fn get_by_external_id(&self, external_id: &str) -> Result<Book, RepositoryError>;
    /// Insert an externally-sourced book unless a row with the same
    /// external id already exists; the surviving row is returned either way
    /// and an existing row is never overwritten.
    async fn find_or_create_external(&self, book: NewBook) -> Result<Book, RepositoryError>;
    /// One page plus the exact local total matching the filter.
    async fn list(&self, request: PageRequest) -> Result<(Vec<Book>, u64), RepositoryError>;
    /// Case-insensitive genre match.
    async fn list_by_genre(
        &self,
        genre: &str,
        request: PageRequest,
    ) -> Result<(Vec<Book>, u64), RepositoryError>;
    /// Substring match over title, author, description, and genre.
    async fn search(
        &self,
        query: &str,
        request: PageRequest,
    ) -> Result<(Vec<Book>, u64), RepositoryError>;
    async fn top_rated(&self, limit: u32) -> Result<Vec<Book>, RepositoryError>;
    async fn most_rated(&self, limit: u32) -> Result<Vec<Book>, RepositoryError>;
    async fn get_many(&self, ids: &HashSet<BookId>) -> Result<Vec<Book>, RepositoryError>;
    /// Candidate query for recommendations: genre or author matches,
    /// excluding the given ids, best-rated first.
    async fn list_by_genres_or_authors(
        &self,
        genres: &[String],
        authors: &[String],
        exclude: &HashSet<BookId>,
        limit: u32,
    ) -> Result<Vec<Book>, RepositoryError>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Upsert the user's rating and recompute the book's aggregate from the
    /// full rating set, all inside one transaction.
    async fn rate(
        &self,
        user_id: UserId,
        book_id: BookId,
        value: i32,
    ) -> Result<(UserRating, Book), RepositoryError>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<UserRating>, RepositoryError>;
}

#[async_trait]
pub trait SavedBookRepository: Send + Sync {
    async fn insert(&self, user_id: UserId, book_id: BookId)
    -> Result<SavedBook, RepositoryError>;
    async fn delete(&self, user_id: UserId, book_id: BookId) -> Result<(), RepositoryError>;
    async fn book_ids_for_user(&self, user_id: UserId) -> Result<HashSet<BookId>, RepositoryError>;
    async fn books_for_user(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<BookComment, RepositoryError>;
    async fn list_by_book(&self, book_id: BookId) -> Result<Vec<BookComment>, RepositoryError>;
    async fn book_ids_for_user(&self, user_id: UserId) -> Result<HashSet<BookId>, RepositoryError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: NewCategory) -> Result<Category, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Category>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn get(&self, id: UserId) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: NewToken) -> Result<Token, RepositoryError>;
    async fn get_by_token_hash(&self, token_hash: &str) -> Result<Token, RepositoryError>;
}
