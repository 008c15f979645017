use axum::http::StatusCode;
use serde_json::json;

use crate::integration::common::{PNG, TestApp, setup_test_app};

async fn create_recipe(
    app: &TestApp,
    token: &str,
    name: &str,
    tags: &[i64],
    ingredients: &[(i64, i32)],
) -> serde_json::Value {
    let ingredients: Vec<_> = ingredients
        .iter()
        .map(|(id, amount)| json!({"id": id, "amount": amount}))
        .collect();
    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(token),
            Some(json!({
                "name": name,
                "text": format!("How to make {name}."),
                "cooking_time": 15,
                "tags": tags,
                "ingredients": ingredients,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let (status, json) = app.call("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn register_login_and_logout() {
    let app = setup_test_app().await;
    let (id, token) = app.sign_up("alice").await;

    let (status, me) = app.call("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id);
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["is_subscribed"], false);

    let (status, _) = app
        .call("POST", "/api/auth/token/logout/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn anonymous_me_returns_401() {
    let app = setup_test_app().await;

    let (status, _) = app.call("GET", "/api/users/me/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_names_the_field() {
    let app = setup_test_app().await;
    app.sign_up("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "alice@example.com",
                "username": "alice2",
                "first_name": "A",
                "last_name": "B",
                "password": "another-pass-1",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = setup_test_app().await;
    app.sign_up("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(json!({"email": "alice@example.com", "password": "nope-nope"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "non_field_errors");
}

#[tokio::test]
async fn malformed_json_is_invalid_body() {
    let app = setup_test_app().await;
    let (_, token) = app.sign_up("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(json!({"tags": "dinner"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn numeric_strings_in_recipe_body() {
    let app = setup_test_app().await;
    let (_, token) = app.sign_up("alice").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;

    let (status, recipe) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(json!({
                "name": "Soup",
                "text": "Boil.",
                "cooking_time": "30",
                "tags": [dinner],
                "ingredients": [{"id": salt, "amount": "5"}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{recipe}");
    assert_eq!(recipe["cooking_time"], 30);
    assert_eq!(recipe["ingredients"][0]["amount"], 5);

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(json!({
                "name": "Stew",
                "text": "Simmer.",
                "cooking_time": "soon",
                "tags": [dinner],
                "ingredients": [{"id": salt, "amount": 5}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "cooking_time");
}

#[tokio::test]
async fn malformed_query_names_the_parameter() {
    let app = setup_test_app().await;
    let (_, token) = app.sign_up("alice").await;
    let (bob_id, _) = app.sign_up("bob").await;

    let (status, body) = app.call("GET", "/api/users/?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "page");

    let (status, body) = app
        .call("GET", "/api/users/subscriptions/?limit=x", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "limit");

    let uri = format!("/api/users/{bob_id}/subscribe/?recipes_limit=-1");
    let (status, body) = app.call("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "recipes_limit");

    let uri = format!("/api/users/{bob_id}/");
    let (_, body) = app.call("GET", &uri, Some(&token), None).await;
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn unparsable_id_is_not_found() {
    let app = setup_test_app().await;

    for uri in ["/api/recipes/abc/", "/api/users/abc/", "/api/tags/x/", "/api/ingredients/1.5/"] {
        let (status, body) = app.call("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "not_found", "{uri}");
    }
}

#[tokio::test]
async fn create_recipe_with_image() {
    let app = setup_test_app().await;
    let (alice_id, token) = app.sign_up("alice").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;

    let (status, recipe) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(json!({
                "name": "Soup",
                "text": "Boil.",
                "cooking_time": 30,
                "tags": [dinner],
                "ingredients": [{"id": salt, "amount": 5}],
                "image": PNG,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{recipe}");
    assert_eq!(recipe["author"]["id"], alice_id);
    assert_eq!(recipe["tags"][0]["slug"], "dinner");
    assert_eq!(recipe["ingredients"][0]["name"], "Salt");
    assert_eq!(recipe["ingredients"][0]["amount"], 5);
    assert_eq!(recipe["is_favorited"], false);

    let image = recipe["image"].as_str().unwrap();
    assert!(image.starts_with("/media/recipes/"), "{image}");

    let (status, bytes) = app.call_raw("GET", image, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[1..4], b"PNG");
}

#[tokio::test]
async fn invalid_recipe_keeps_no_image() {
    let app = setup_test_app().await;
    let (_, token) = app.sign_up("alice").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(json!({
                "name": "Soup",
                "text": "Boil.",
                "cooking_time": 30,
                "tags": [dinner],
                "ingredients": [{"id": salt, "amount": 5}, {"id": salt, "amount": 3}],
                "image": PNG,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");

    let recipes_dir = app.media.path().join("recipes");
    let leftover = std::fs::read_dir(&recipes_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn only_author_may_edit_or_delete() {
    let app = setup_test_app().await;
    let (_, alice) = app.sign_up("alice").await;
    let (_, bob) = app.sign_up("bob").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;

    let recipe = create_recipe(&app, &alice, "Soup", &[dinner], &[(salt, 5)]).await;
    let uri = format!("/api/recipes/{}/", recipe["id"]);
    let update = json!({
        "name": "Stolen soup",
        "text": "Mine now.",
        "cooking_time": 5,
        "tags": [dinner],
        "ingredients": [{"id": salt, "amount": 1}],
    });

    let (status, _) = app
        .call("PATCH", &uri, Some(&bob), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app.call("PUT", &uri, Some(&alice), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Stolen soup");
    assert_eq!(updated["ingredients"][0]["amount"], 1);

    let (status, _) = app.call("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_reject_repeats() {
    let app = setup_test_app().await;
    let (_, alice) = app.sign_up("alice").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;
    let recipe = create_recipe(&app, &alice, "Soup", &[dinner], &[(salt, 5)]).await;
    let uri = format!("/api/recipes/{}/favorite/", recipe["id"]);

    let (status, short) = app.call("POST", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(short["name"], "Soup");
    assert!(short.get("text").is_none());

    let (status, _) = app.call("POST", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = app
        .call("GET", "/api/recipes/?is_favorited=1", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["is_favorited"], true);

    let (status, _) = app.call("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("POST", "/api/recipes/9999/favorite/", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shopping_cart_download_sums_ingredients() {
    let app = setup_test_app().await;
    let (_, alice) = app.sign_up("alice").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;
    let sugar = app.insert_ingredient("Sugar", "g").await;

    let soup = create_recipe(&app, &alice, "Soup", &[dinner], &[(salt, 10)]).await;
    let cake = create_recipe(&app, &alice, "Cake", &[dinner], &[(salt, 5), (sugar, 200)]).await;
    for recipe in [&soup, &cake] {
        let uri = format!("/api/recipes/{}/shopping_cart/", recipe["id"]);
        let (status, _) = app.call("POST", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, bytes) = app
        .call_raw(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "Shopping list:\nSalt - 15 g.\nSugar - 200 g."
    );

    let (status, _) = app
        .call("GET", "/api/recipes/download_shopping_cart/", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn subscriptions_flow() {
    let app = setup_test_app().await;
    let (alice_id, alice) = app.sign_up("alice").await;
    let (bob_id, bob) = app.sign_up("bob").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;
    for name in ["Soup", "Stew", "Broth"] {
        create_recipe(&app, &bob, name, &[dinner], &[(salt, 1)]).await;
    }

    let (status, body) = app
        .call("POST", &format!("/api/users/{alice_id}/subscribe/"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "author");

    let subscribe = format!("/api/users/{bob_id}/subscribe/?recipes_limit=2");
    let (status, sub) = app.call("POST", &subscribe, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sub["is_subscribed"], true);
    assert_eq!(sub["recipes_count"], 3);
    assert_eq!(sub["recipes"].as_array().unwrap().len(), 2);

    let (status, _) = app.call("POST", &subscribe, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = app
        .call(
            "GET",
            "/api/users/subscriptions/?recipes_limit=1",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["username"], "bob");
    assert_eq!(page["results"][0]["recipes"].as_array().unwrap().len(), 1);

    let (status, profile) = app
        .call("GET", &format!("/api/users/{bob_id}/"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["is_subscribed"], true);

    let (status, _) = app
        .call("DELETE", &format!("/api/users/{bob_id}/subscribe/"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn recipe_list_filters_and_paginates() {
    let app = setup_test_app().await;
    let (_, alice) = app.sign_up("alice").await;
    let (bob_id, bob) = app.sign_up("bob").await;
    let breakfast = app.insert_tag("Breakfast", "breakfast").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    let salt = app.insert_ingredient("Salt", "g").await;

    create_recipe(&app, &alice, "Toast", &[breakfast], &[(salt, 1)]).await;
    create_recipe(&app, &alice, "Soup", &[dinner], &[(salt, 2)]).await;
    create_recipe(&app, &bob, "Stew", &[dinner], &[(salt, 3)]).await;

    let (status, page) = app.call("GET", "/api/recipes/?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 3);
    assert_eq!(page["results"][0]["name"], "Stew");
    assert_eq!(page["next"], "/api/recipes/?limit=2&page=2");
    assert!(page["previous"].is_null());

    let (_, page) = app
        .call("GET", "/api/recipes/?tags=breakfast&tags=lunch", None, None)
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["name"], "Toast");

    let (_, page) = app
        .call("GET", &format!("/api/recipes/?author={bob_id}"), None, None)
        .await;
    assert_eq!(page["count"], 1);

    // Membership filters are ignored for anonymous requests.
    let (_, page) = app
        .call("GET", "/api/recipes/?is_in_shopping_cart=1", None, None)
        .await;
    assert_eq!(page["count"], 3);

    let (status, _) = app
        .call("GET", "/api/recipes/?author=bob", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_endpoints() {
    let app = setup_test_app().await;
    app.insert_tag("Breakfast", "breakfast").await;
    let dinner = app.insert_tag("Dinner", "dinner").await;
    app.insert_ingredient("Salt", "g").await;
    app.insert_ingredient("Sugar", "g").await;
    app.insert_ingredient("Flour", "g").await;

    let (status, tags) = app.call("GET", "/api/tags/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags[0]["slug"], "dinner");
    assert_eq!(tags[1]["slug"], "breakfast");

    let (status, tag) = app
        .call("GET", &format!("/api/tags/{dinner}/"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["color"], "#E26C2D");

    let (_, found) = app.call("GET", "/api/ingredients/?name=s", None, None).await;
    let names: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Salt", "Sugar"]);

    let (status, _) = app.call("GET", "/api/ingredients/9999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
