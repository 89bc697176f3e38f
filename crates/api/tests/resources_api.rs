//! Resource catalogue, availability probes and occupancy maintenance.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use sqlx::PgPool;

async fn confirm_stay(app: &TestApp, room: i64, check_in: &str, check_out: &str) -> i64 {
    let response = post_json_auth(
        app.app(),
        "/api/v1/bookings/room",
        room_request(Some(room), check_in, check_out, "Self", "Self"),
        &app.admin(),
    )
    .await;
    expect_data(response, StatusCode::CREATED).await["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_resource_requires_admin(pool: PgPool) {
    let app = build_test_app(pool);
    let body = json!({
        "kind": "room",
        "label": "301",
        "category": "Deluxe",
        "site": "SPORTI-2",
        "self_rate": 2200,
        "guest_rate": 2600,
        "facilities": ["AC", "TV"]
    });

    let response = post_json(app.app(), "/api/v1/resources", body.clone()).await;
    assert_eq!(expect_error(response, StatusCode::UNAUTHORIZED).await, "UNAUTHORIZED");

    let response = post_json_auth(app.app(), "/api/v1/resources", body.clone(), &app.member()).await;
    assert_eq!(expect_error(response, StatusCode::FORBIDDEN).await, "FORBIDDEN");

    let created = expect_data(
        post_json_auth(app.app(), "/api/v1/resources", body.clone(), &app.admin()).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(created["label"], "301");
    assert_eq!(created["is_occupied"], false);
    assert_eq!(created["facilities"], json!(["AC", "TV"]));

    // Same label at the same site.
    let response = post_json_auth(app.app(), "/api/v1/resources", body.clone(), &app.admin()).await;
    assert_eq!(expect_error(response, StatusCode::CONFLICT).await, "CONFLICT");

    let mut negative = body;
    negative["label"] = json!("302");
    negative["guest_rate"] = json!(-1);
    let response = post_json_auth(app.app(), "/api/v1/resources", negative, &app.admin()).await;
    assert_eq!(expect_error(response, StatusCode::BAD_REQUEST).await, "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_and_get_resources(pool: PgPool) {
    let room = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    create_room(&pool, "201", "VIP", (3000, 3500)).await;
    create_service(&pool, "Main Hall", 80).await;
    let app = build_test_app(pool);

    let all = expect_data(get(app.app(), "/api/v1/resources").await, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let rooms = expect_data(
        get(app.app(), "/api/v1/resources?kind=room&category=Standard").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["id"], room.id);

    let fetched = expect_data(get(app.app(), &format!("/api/v1/resources/{}", room.id)).await, StatusCode::OK).await;
    assert_eq!(fetched["self_rate"], 1500);

    let response = get(app.app(), "/api/v1/resources/999999").await;
    assert_eq!(expect_error(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_resource(pool: PgPool) {
    let room = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    let app = build_test_app(pool);
    let uri = format!("/api/v1/resources/{}", room.id);

    let updated = expect_data(
        put_json_auth(app.app(), &uri, json!({ "guest_rate": 2400, "description": "Garden view" }), &app.admin()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["guest_rate"], 2400);
    assert_eq!(updated["self_rate"], 1500);
    assert_eq!(updated["description"], "Garden view");

    let response = put_json_auth(app.app(), "/api/v1/resources/999999", json!({ "guest_rate": 1 }), &app.admin()).await;
    assert_eq!(expect_error(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");

    let too_high = json!({ "self_rate": clubstay_core::pricing::MAX_RATE + 1 });
    let response = put_json_auth(app.app(), &uri, too_high, &app.admin()).await;
    assert_eq!(expect_error(response, StatusCode::BAD_REQUEST).await, "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_available_resources(pool: PgPool) {
    let booked = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    let blocked = create_room(&pool, "205", "Standard", (1500, 2000)).await;
    let free = create_room(&pool, "206", "Standard", (1500, 2000)).await;
    let app = build_test_app(pool);
    confirm_stay(&app, booked.id, "2030-03-01", "2030-03-03").await;
    put_auth(app.app(), &format!("/api/v1/resources/{}/block", blocked.id), &app.admin()).await;

    let available = expect_data(
        get(
            app.app(),
            "/api/v1/resources/available?kind=room&site=SPORTI-1&category=Standard&check_in=2030-03-02&check_out=2030-03-04",
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let ids: Vec<i64> = available
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![free.id]);

    let response = get(
        app.app(),
        "/api/v1/resources/available?kind=room&check_in=2030-03-04&check_out=2030-03-02",
    )
    .await;
    assert_eq!(expect_error(response, StatusCode::BAD_REQUEST).await, "VALIDATION_ERROR");

    let response = get(app.app(), "/api/v1/resources/available?kind=room&check_in=soon&check_out=later").await;
    assert_eq!(expect_error(response, StatusCode::BAD_REQUEST).await, "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_availability_probe(pool: PgPool) {
    let room = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    let app = build_test_app(pool);
    confirm_stay(&app, room.id, "2030-03-01", "2030-03-03").await;
    let base = format!("/api/v1/resources/{}/availability", room.id);

    let overlapping = expect_data(
        get(app.app(), &format!("{base}?check_in=2030-03-02&check_out=2030-03-05")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(overlapping["available"], false);

    let adjacent = expect_data(
        get(app.app(), &format!("{base}?check_in=2030-03-03&check_out=2030-03-05")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(adjacent["available"], true);
    assert_eq!(adjacent["resource_id"], room.id);

    put_auth(app.app(), &format!("/api/v1/resources/{}/block", room.id), &app.admin()).await;
    let blocked = expect_data(
        get(app.app(), &format!("{base}?check_in=2030-03-03&check_out=2030-03-05")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(blocked["available"], false);
}

/// Blocking does not disturb an existing confirmed stay.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_toggle_block(pool: PgPool) {
    let room = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    let app = build_test_app(pool.clone());
    let booking = confirm_stay(&app, room.id, "2030-03-01", "2030-03-03").await;
    let uri = format!("/api/v1/resources/{}/block", room.id);

    let response = put_auth(app.app(), &uri, &app.member()).await;
    assert_eq!(expect_error(response, StatusCode::FORBIDDEN).await, "FORBIDDEN");

    let blocked = expect_data(put_auth(app.app(), &uri, &app.admin()).await, StatusCode::OK).await;
    assert_eq!(blocked["is_blocked"], true);
    assert_eq!(blocked["is_occupied"], true);

    let stored = expect_data(
        get_auth(app.app(), &format!("/api/v1/bookings/{booking}"), &app.admin()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(stored["status"], "confirmed");

    let unblocked = expect_data(put_auth(app.app(), &uri, &app.admin()).await, StatusCode::OK).await;
    assert_eq!(unblocked["is_blocked"], false);

    let response = put_auth(app.app(), "/api/v1/resources/999999/block", &app.admin()).await;
    assert_eq!(expect_error(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_seed_resources(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_auth(app.app(), "/api/v1/resources/seed", &app.member()).await;
    assert_eq!(expect_error(response, StatusCode::FORBIDDEN).await, "FORBIDDEN");

    let first = expect_data(post_auth(app.app(), "/api/v1/resources/seed", &app.admin()).await, StatusCode::OK).await;
    let rooms = clubstay_db::seed::room_count() as u64;
    let services = clubstay_db::seed::SERVICES.len() as u64;
    assert_eq!(first["rooms"], rooms);
    assert_eq!(first["services"], services);
    assert_eq!(first["inserted"], rooms + services);

    let second = expect_data(post_auth(app.app(), "/api/v1/resources/seed", &app.admin()).await, StatusCode::OK).await;
    assert_eq!(second["inserted"], 0);

    // Seeded halls carry their capacity and rates.
    let halls = expect_data(
        get(app.app(), "/api/v1/resources?kind=service&site=SPORTI-1&category=Main%20Function%20Hall").await,
        StatusCode::OK,
    )
    .await;
    let hall = &halls.as_array().unwrap()[0];
    assert_eq!(hall["capacity"], 200);
    assert_eq!(hall["self_rate"], 5000);
    assert_eq!(hall["guest_rate"], 8000);
}

/// A cache cleared behind the engine's back is reported, then repaired.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_reconcile_occupancy(pool: PgPool) {
    let room = create_room(&pool, "204", "Standard", (1500, 2000)).await;
    let app = build_test_app(pool.clone());
    confirm_stay(&app, room.id, "2030-03-01", "2030-03-03").await;

    sqlx::query(
        "UPDATE resources SET is_occupied = FALSE, occupied_from = NULL, occupied_until = NULL WHERE id = $1",
    )
    .bind(room.id)
    .execute(&pool)
    .await
    .unwrap();

    let uri = "/api/v1/admin/occupancy/reconcile";
    let response = post_auth(app.app(), uri, &app.member()).await;
    assert_eq!(expect_error(response, StatusCode::FORBIDDEN).await, "FORBIDDEN");

    let report = expect_data(post_auth(app.app(), uri, &app.admin()).await, StatusCode::OK).await;
    assert_eq!(report["checked"], 1);
    assert_eq!(report["repaired"], false);
    assert_eq!(report["drift"][0]["resource_id"], room.id);
    assert!(report["drift"][0]["cached"].is_null());
    assert!(!occupancy(&pool, room.id).await.is_occupied);

    let repaired = expect_data(
        post_auth(app.app(), &format!("{uri}?repair=true"), &app.admin()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(repaired["repaired"], true);
    assert!(occupancy(&pool, room.id).await.is_occupied);

    let clean = expect_data(post_auth(app.app(), uri, &app.admin()).await, StatusCode::OK).await;
    assert!(clean["drift"].as_array().unwrap().is_empty());
}
