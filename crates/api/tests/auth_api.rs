//! Login, refresh, and `/auth/me`.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json, PASSWORD};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = false)]
async fn login_returns_token_pair_and_profile(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "Seller@CRM.test", "seller").await;

    let response = post_json(
        &app,
        "/auth/login",
        None,
        json!({ "email": "seller@crm.test", "password": PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 900);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["role"], "seller");
    assert!(json["user"].get("password_hash").is_none());

    assert_eq!(
        common::wait_for_audit(&pool, "auth.login", Some(user.id)).await,
        1
    );
}

#[sqlx::test(migrations = false)]
async fn wrong_password_and_unknown_email_look_the_same(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    common::create_user(&pool, "seller@crm.test", "seller").await;

    let wrong = post_json(
        &app,
        "/auth/login",
        None,
        json!({ "email": "seller@crm.test", "password": "not-the-password" }),
    )
    .await;
    let unknown = post_json(
        &app,
        "/auth/login",
        None,
        json!({ "email": "ghost@crm.test", "password": PASSWORD }),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let wrong = body_json(wrong).await;
    let unknown = body_json(unknown).await;
    assert_eq!(wrong["message"], unknown["message"]);
}

#[sqlx::test(migrations = false)]
async fn deactivated_account_is_forbidden(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "gone@crm.test", "customer").await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json(
        &app,
        "/auth/login",
        None,
        json!({ "email": "gone@crm.test", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = false)]
async fn refresh_reloads_role(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "rs@crm.test", "reseller").await;

    let login = body_json(
        post_json(
            &app,
            "/auth/login",
            None,
            json!({ "email": "rs@crm.test", "password": PASSWORD }),
        )
        .await,
    )
    .await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    sqlx::query("UPDATE users SET role = 'seller' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json(
        &app,
        "/auth/refresh",
        None,
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["role"], "seller");
}

#[sqlx::test(migrations = false)]
async fn access_token_is_not_a_refresh_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;

    let response = post_json(
        &app,
        "/auth/refresh",
        None,
        json!({ "refresh_token": common::token_for(&user) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = false)]
async fn me_requires_and_reflects_the_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "me@crm.test", "customer").await;

    let anonymous = common::get(&app, "/auth/me", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let response = common::get(&app, "/auth/me", Some(&common::token_for(&user))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "me@crm.test");
    assert_eq!(json["data"]["code11"], user.code11.as_str());
}

#[sqlx::test(migrations = false)]
async fn scopes_with_non_string_values_survive_login(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "tiered@crm.test", "reseller").await;
    sqlx::query("UPDATE users SET scopes = '{\"tier\": 2, \"regions\": [\"emea\"]}' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json(
        &app,
        "/auth/login",
        None,
        json!({ "email": "tiered@crm.test", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["scopes"]["tier"], 2);

    let token = json["access_token"].as_str().unwrap().to_string();
    let referral = post_json(&app, "/referrals", Some(&token), json!({ "code": "TIER-TWO" })).await;
    assert_eq!(referral.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = false)]
async fn issued_access_token_opens_resource_routes(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;

    let response = common::get(&app, "/referrals", Some(&common::token_for(&user))).await;
    assert_eq!(response.status(), StatusCode::OK);
}
