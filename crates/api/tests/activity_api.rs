//! `/activities` CRUD, ownership, and cursor paging.

mod common;

use axum::http::StatusCode;
use common::{body_json, patch_json, post_json};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create(app: &axum::Router, token: &str, body: Value) -> Value {
    let response = post_json(app, "/activities", Some(token), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = false)]
async fn create_then_get_round_trips_fields(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;
    let token = common::token_for(&user);

    let created = create(
        &app,
        &token,
        json!({
            "type": "call",
            "contact_id": 12,
            "content": "Discussed renewal",
            "metadata": { "direction": "outbound", "duration_minutes": 25 },
            "occurred_at": "2026-03-01T10:00:00Z"
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let response = common::get(&app, &format!("/activities/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await["data"].clone();

    assert_eq!(fetched["type"], "call");
    assert_eq!(fetched["contact_id"], 12);
    assert_eq!(fetched["content"], "Discussed renewal");
    assert_eq!(fetched["owner_id"], user.id);
    assert_eq!(fetched["metadata"]["direction"], "outbound");
    assert_eq!(fetched["metadata"]["duration_minutes"], 25);
    assert_eq!(fetched["occurred_at"], created["occurred_at"]);

    assert_eq!(
        common::wait_for_audit(&pool, "activity.create", Some(id)).await,
        1
    );
}

#[sqlx::test(migrations = false)]
async fn other_sellers_cannot_see_or_change_it(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let owner = common::create_user(&pool, "owner@crm.test", "seller").await;
    let other = common::create_user(&pool, "other@crm.test", "seller").await;
    let admin = common::create_user(&pool, "admin@crm.test", "admin").await;

    let created = create(
        &app,
        &common::token_for(&owner),
        json!({ "type": "note", "content": "private" }),
    )
    .await;
    let uri = format!("/activities/{}", created["id"]);
    let other_token = common::token_for(&other);

    let read = common::get(&app, &uri, Some(&other_token)).await;
    assert_eq!(read.status(), StatusCode::NOT_FOUND);
    let patch = patch_json(&app, &uri, Some(&other_token), json!({ "content": "x" })).await;
    assert_eq!(patch.status(), StatusCode::NOT_FOUND);
    let delete = common::delete(&app, &uri, Some(&other_token)).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let as_admin = common::get(&app, &uri, Some(&common::token_for(&admin))).await;
    assert_eq!(as_admin.status(), StatusCode::OK);
}

#[sqlx::test(migrations = false)]
async fn patch_updates_and_audits_before_and_after(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;
    let token = common::token_for(&user);
    let created = create(&app, &token, json!({ "type": "note", "content": "draft" })).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/activities/{id}");

    let empty = patch_json(&app, &uri, Some(&token), json!({})).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let response = patch_json(&app, &uri, Some(&token), json!({ "content": "final" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["content"], "final");
    assert_eq!(updated["type"], "note");

    assert_eq!(
        common::wait_for_audit(&pool, "activity.update", Some(id)).await,
        1
    );
    let (before, after): (Value, Value) = sqlx::query_as(
        "SELECT before_state, after_state FROM audit_log \
         WHERE action = 'activity.update' AND entity_id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(before["content"], "draft");
    assert_eq!(after["content"], "final");
}

#[sqlx::test(migrations = false)]
async fn delete_removes_and_audits(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;
    let token = common::token_for(&user);
    let created = create(&app, &token, json!({ "type": "email", "content": "sent" })).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/activities/{id}");

    let response = common::delete(&app, &uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let gone = common::get(&app, &uri, Some(&token)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        common::wait_for_audit(&pool, "activity.delete", Some(id)).await,
        1
    );
}

#[sqlx::test(migrations = false)]
async fn list_pages_newest_first_and_filters_by_type(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;
    let token = common::token_for(&user);

    for (day, kind) in [(1, "note"), (2, "call"), (3, "note"), (4, "note")] {
        create(
            &app,
            &token,
            json!({
                "type": kind,
                "content": format!("day {day}"),
                "occurred_at": format!("2026-01-0{day}T09:00:00Z")
            }),
        )
        .await;
    }

    let first = body_json(common::get(&app, "/activities?limit=3", Some(&token)).await).await;
    let contents: Vec<_> = first["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, ["day 4", "day 3", "day 2"]);
    let cursor = first["next_cursor"].as_str().unwrap();

    let second = body_json(
        common::get(
            &app,
            &format!("/activities?limit=3&cursor={cursor}"),
            Some(&token),
        )
        .await,
    )
    .await;
    assert_eq!(second["data"].as_array().unwrap().len(), 1);
    assert_eq!(second["data"][0]["content"], "day 1");
    assert!(second["next_cursor"].is_null());

    let notes = body_json(common::get(&app, "/activities?type=note", Some(&token)).await).await;
    assert_eq!(notes["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = false)]
async fn patch_with_explicit_null_unlinks(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let user = common::create_user(&pool, "seller@crm.test", "seller").await;
    let token = common::token_for(&user);
    let created = create(
        &app,
        &token,
        json!({ "type": "meeting", "content": "Kickoff", "company_id": 3, "contact_id": 12 }),
    )
    .await;
    let uri = format!("/activities/{}", created["id"]);

    let response = patch_json(&app, &uri, Some(&token), json!({ "contact_id": null })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert!(updated["contact_id"].is_null());
    assert_eq!(updated["company_id"], 3);
    assert_eq!(updated["content"], "Kickoff");
}
