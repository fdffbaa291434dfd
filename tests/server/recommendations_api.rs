use serde_json::{Value, json};

use crate::helpers::{external_book, seed_book, spawn_app, spawn_app_with_auth};

#[tokio::test]
async fn recommendations_require_authentication() {
    let app = spawn_app().await;

    let response = app.get("/recommendations").await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn users_without_signals_get_trending_books() {
    let app = spawn_app_with_auth().await;
    app.catalog
        .set_trending_results(vec![external_book("OL1W", "Bestseller", None)]);

    let response = app.get("/recommendations?limit=5").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Bestseller"));
}

#[tokio::test]
async fn recommendations_follow_the_dominant_genre() {
    let app = spawn_app_with_auth().await;

    let fantasy_a = seed_book(&app, "Fantasy A", "Author One", Some("Fantasy")).await;
    let fantasy_b = seed_book(&app, "Fantasy B", "Author Two", Some("Fantasy")).await;
    let scifi = seed_book(&app, "Sci-Fi A", "Author Three", Some("Sci-Fi")).await;
    seed_book(&app, "Fantasy C", "Author Four", Some("Fantasy")).await;
    seed_book(&app, "Romance A", "Author Five", Some("Romance")).await;

    // Strong fantasy signal, weak sci-fi signal.
    for (book, value) in [(&fantasy_a, 5), (&fantasy_b, 4), (&scifi, 2)] {
        let response = app
            .post_json(&format!("/books/{}/rate", book.id), &json!({ "rating": value }))
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = app.get("/recommendations?limit=10").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let books = body.as_array().unwrap();

    let titles: Vec<&str> = books
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();

    // Rated books never come back; the unrated fantasy title does.
    assert!(titles.contains(&"Fantasy C"));
    assert!(!titles.contains(&"Fantasy A"));
    assert!(!titles.contains(&"Fantasy B"));
    assert!(!titles.contains(&"Sci-Fi A"));
}

#[tokio::test]
async fn saved_books_count_as_interaction_signals() {
    let app = spawn_app_with_auth().await;

    let saved = seed_book(&app, "Saved Mystery", "Author One", Some("Mystery")).await;
    seed_book(&app, "Another Mystery", "Author Two", Some("Mystery")).await;

    let response = app.post_empty(&format!("/books/{}/save", saved.id)).await;
    assert_eq!(response.status(), 201);

    let response = app.get("/recommendations?limit=10").await;
    let body: Value = response.json().await.expect("Failed to parse response");

    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Another Mystery"));
    assert!(!titles.contains(&"Saved Mystery"));
}

#[tokio::test]
async fn commented_books_count_as_interaction_signals() {
    let app = spawn_app_with_auth().await;

    let commented = seed_book(&app, "Discussed Horror", "Author One", Some("Horror")).await;
    seed_book(&app, "Quiet Horror", "Author Two", Some("Horror")).await;

    let response = app
        .post_json(
            &format!("/books/{}/comments", commented.id),
            &json!({ "text": "scared me silly" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app.get("/recommendations?limit=10").await;
    let body: Value = response.json().await.expect("Failed to parse response");

    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Quiet Horror"));
    assert!(!titles.contains(&"Discussed Horror"));
}

#[tokio::test]
async fn author_matches_are_recommended_too() {
    let app = spawn_app_with_auth().await;

    let rated = seed_book(&app, "First Novel", "Prolific Author", None).await;
    seed_book(&app, "Second Novel", "Prolific Author", None).await;

    app.post_json(&format!("/books/{}/rate", rated.id), &json!({ "rating": 5 }))
        .await;

    let response = app.get("/recommendations?limit=10").await;
    let body: Value = response.json().await.expect("Failed to parse response");

    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Second Novel"));
    assert!(!titles.contains(&"First Novel"));
}

#[tokio::test]
async fn short_results_are_topped_up_from_trending() {
    let app = spawn_app_with_auth().await;

    let rated = seed_book(&app, "Only Western", "Author One", Some("Western")).await;
    app.post_json(&format!("/books/{}/rate", rated.id), &json!({ "rating": 5 }))
        .await;

    // No other westerns locally; a well-rated book from another reader
    // supplies the trending top-up.
    let crowd_pick = seed_book(&app, "Crowd Pick", "Author Two", Some("Thriller")).await;
    let other_token = crate::helpers::create_user_token(&app, "other").await;
    let response = reqwest::Client::new()
        .post(app.api_url(&format!("/books/{}/rate", crowd_pick.id)))
        .bearer_auth(&other_token)
        .json(&json!({ "rating": 4 }))
        .send()
        .await
        .expect("Failed to rate book");
    assert_eq!(response.status(), 200);

    let response = app.get("/recommendations?limit=5").await;
    let body: Value = response.json().await.expect("Failed to parse response");

    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Crowd Pick"));
    assert!(!titles.contains(&"Only Western"));
}
