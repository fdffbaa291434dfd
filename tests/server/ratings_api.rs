use bookscout::domain::repositories::{BookRepository, RatingRepository, TokenRepository};
use serde_json::{Value, json};

use crate::helpers::{create_user_token, seed_book, spawn_app, spawn_app_with_auth};

#[tokio::test]
async fn rating_a_book_requires_authentication() {
    let app = spawn_app().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    let response = app
        .post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 4 }))
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn rating_a_book_returns_the_updated_aggregate() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    let response = app
        .post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 4 }))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["rating"]["value"], 4);
    assert_eq!(body["book"]["rating"], 4.0);
    assert_eq!(body["book"]["ratingCount"], 1);
}

#[tokio::test]
async fn out_of_range_ratings_return_a_400_and_write_nothing() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    for value in [0, 6, -1] {
        let response = app
            .post_json(
                &format!("/books/{}/rate", book.id),
                &json!({ "rating": value }),
            )
            .await;
        assert_eq!(response.status(), 400, "rating {value} should be rejected");
    }

    let stored = app.book_repo.get(book.id).await.expect("book missing");
    assert_eq!(stored.rating, 0.0);
    assert_eq!(stored.rating_count, 0);
}

#[tokio::test]
async fn rating_an_unknown_book_returns_a_404() {
    let app = spawn_app_with_auth().await;

    let response = app
        .post_json("/books/999999/rate", &json!({ "rating": 3 }))
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn two_users_rating_four_and_two_average_to_three() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    app.post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 4 }))
        .await;

    let second_token = create_user_token(&app, "second").await;
    let response = reqwest::Client::new()
        .post(app.api_url(&format!("/books/{}/rate", book.id)))
        .bearer_auth(&second_token)
        .json(&json!({ "rating": 2 }))
        .send()
        .await
        .expect("Failed to rate book");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["rating"], 3.0);
    assert_eq!(body["book"]["ratingCount"], 2);
}

#[tokio::test]
async fn rerating_overwrites_instead_of_adding_a_row() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    app.post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 2 }))
        .await;
    let response = app
        .post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 5 }))
        .await;

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["rating"], 5.0);
    assert_eq!(body["book"]["ratingCount"], 1);
}

#[tokio::test]
async fn aggregates_round_to_one_decimal_place() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    // 5, 4, 4 -> 13/3 = 4.333... -> 4.3
    app.post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 5 }))
        .await;
    let client = reqwest::Client::new();
    for (username, value) in [("second", 4), ("third", 4)] {
        let token = create_user_token(&app, username).await;
        client
            .post(app.api_url(&format!("/books/{}/rate", book.id)))
            .bearer_auth(&token)
            .json(&json!({ "rating": value }))
            .send()
            .await
            .expect("Failed to rate book");
    }

    let stored = app.book_repo.get(book.id).await.expect("book missing");
    assert_eq!(stored.rating, 4.3);
    assert_eq!(stored.rating_count, 3);
}

#[tokio::test]
async fn first_real_rating_replaces_provisional_values() {
    let app = spawn_app_with_auth().await;
    app.catalog.set_search_results(vec![crate::helpers::external_book(
        "OL8W",
        "Imported",
        None,
    )]);
    app.get("/books/search?q=imported&limit=1").await;

    let imported = app
        .book_repo
        .get_by_external_id("OL8W")
        .await
        .expect("imported book missing");
    assert_eq!(imported.rating, 3.8);
    assert_eq!(imported.rating_count, 120);

    let response = app
        .post_json(
            &format!("/books/{}/rate", imported.id),
            &json!({ "rating": 2 }),
        )
        .await;

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["rating"], 2.0);
    assert_eq!(body["book"]["ratingCount"], 1);
}

#[tokio::test]
async fn ratings_survive_a_repo_level_read() {
    let app = spawn_app_with_auth().await;
    let book = seed_book(&app, "Test Book", "Author", None).await;

    app.post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": 3 }))
        .await;

    let token_hash = bookscout::infrastructure::auth::hash_token(
        app.auth_token.as_ref().expect("auth token required"),
    );
    let token = app
        .token_repo
        .get_by_token_hash(&token_hash)
        .await
        .expect("token missing");

    let ratings = app
        .rating_repo
        .list_by_user(token.user_id)
        .await
        .expect("Failed to list ratings");
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].value, 3);
    assert_eq!(ratings[0].book_id, book.id);
}
