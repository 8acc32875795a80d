//! Router-level smoke tests: the REST surface wired to a live in-memory
//! core, driven with `tower::ServiceExt::oneshot`.

#![allow(clippy::panic, clippy::indexing_slicing, missing_docs, missing_debug_implementations)]

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{Harness, eur};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use verbena_core::api;

fn app(h: &Harness) -> Router {
    api::build_router().with_state(h.state.clone())
}

async fn json_body(response: axum::response::Response) -> Value {
    let Ok(bytes) = response.into_body().collect().await else {
        panic!("body must collect");
    };
    let Ok(value) = serde_json::from_slice(&bytes.to_bytes()) else {
        panic!("body must be JSON");
    };
    value
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    let Ok(request) = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
    else {
        panic!("request must build");
    };
    request
}

fn get(uri: &str) -> Request<Body> {
    let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
        panic!("request must build");
    };
    request
}

#[tokio::test]
async fn health_reports_ok() {
    let h = Harness::new().await;
    let Ok(response) = app(&h).oneshot(get("/health")).await else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn fees_expose_configuration() {
    let h = Harness::new().await;
    let Ok(response) = app(&h).oneshot(get("/config/fees")).await else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["platform_fee"], "1.50");
    assert_eq!(body["currency"], "EUR");
}

#[tokio::test]
async fn full_booking_flow_over_http() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    // Create.
    let Ok(response) = app(&h)
        .oneshot(post_json(
            "/api/v1/matches",
            json!({
                "requester_id": h.requester.as_uuid(),
                "experience_id": h.experience_id,
                "participants": 2
            }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["total_price"], "90.00");
    let Some(match_id) = created["id"].as_str().map(String::from) else {
        panic!("match id must be present");
    };

    // Accept.
    let Ok(response) = app(&h)
        .oneshot(post_json(
            &format!("/api/v1/matches/{match_id}/accept"),
            json!({ "user_id": h.host.as_uuid() }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let accepted = json_body(response).await;
    assert_eq!(accepted["status"], "accepted");
    assert_eq!(accepted["fee_charged"], "1.50");

    // Balance reflects the fee.
    let Ok(response) = app(&h)
        .oneshot(get(&format!("/api/v1/wallet/{}/balance", h.requester)))
        .await
    else {
        panic!("request must succeed");
    };
    let balance = json_body(response).await;
    assert_eq!(balance["balance"], "8.50");
    assert_eq!(balance["can_operate"], true);
}

#[tokio::test]
async fn underfunded_accept_maps_to_422_with_hint() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(response) = app(&h)
        .oneshot(post_json(
            "/api/v1/matches",
            json!({
                "requester_id": h.requester.as_uuid(),
                "experience_id": h.experience_id,
                "participants": 1
            }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    let created = json_body(response).await;
    let Some(match_id) = created["id"].as_str().map(String::from) else {
        panic!("match id must be present");
    };

    // Drain the requester below the fee.
    let r = h
        .state
        .wallet_service
        .ledger()
        .debit(
            h.requester,
            eur(950),
            verbena_core::domain::transaction::TransactionKind::Payout,
            None,
        )
        .await;
    assert!(r.is_ok());

    let Ok(response) = app(&h)
        .oneshot(post_json(
            &format!("/api/v1/matches/{match_id}/accept"),
            json!({ "user_id": h.host.as_uuid() }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], 4102);
    let Some(details) = body["error"]["details"].as_str() else {
        panic!("funding failures carry an actionable hint");
    };
    assert!(details.contains("top up"));
}

#[tokio::test]
async fn top_up_below_minimum_is_400() {
    let h = Harness::new().await;
    let Ok(response) = app(&h)
        .oneshot(post_json(
            &format!("/api/v1/wallet/{}/topup", h.requester),
            json!({ "amount": "4.99" }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn dispute_resolution_requires_admin_attribution() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await
    else {
        panic!("create must succeed");
    };
    let r = h.state.match_service.accept(m.id, h.host).await;
    assert!(r.is_ok());
    let Ok(d) = h
        .state
        .dispute_service
        .open(m.id, h.requester, "no_show".into(), "".into())
        .await
    else {
        panic!("open must succeed");
    };

    // Without the header: 400.
    let Ok(response) = app(&h)
        .oneshot(post_json(
            &format!("/api/v1/disputes/{}/resolve", d.id),
            json!({ "resolution": "RESOLVED_NO_REFUND", "admin_action": "none" }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // With the header: resolved.
    let admin = uuid::Uuid::new_v4();
    let Ok(request) = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/disputes/{}/resolve", d.id))
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Admin-Id", admin.to_string())
        .body(Body::from(
            json!({ "resolution": "RESOLVED_NO_REFUND", "admin_action": "none" }).to_string(),
        ))
    else {
        panic!("request must build");
    };
    let Ok(response) = app(&h).oneshot(request).await else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "resolved");
    assert_eq!(body["resolved_by"], admin.to_string());
}

#[tokio::test]
async fn internal_push_feeds_the_catalog() {
    let h = Harness::new().await;
    let host = uuid::Uuid::new_v4();
    let experience = uuid::Uuid::new_v4();

    let Ok(request) = Request::builder()
        .method("PUT")
        .uri(format!("/internal/experiences/{experience}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "host_id": host,
                "kind": "intercambio",
                "price_per_person": null,
                "capacity": 4
            })
            .to_string(),
        ))
    else {
        panic!("request must build");
    };
    let Ok(response) = app(&h).oneshot(request).await else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The pushed experience is immediately bookable.
    let Ok(response) = app(&h)
        .oneshot(post_json(
            "/api/v1/matches",
            json!({
                "requester_id": h.requester.as_uuid(),
                "experience_id": experience,
                "participants": 2
            }),
        ))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_match_is_404() {
    let h = Harness::new().await;
    let Ok(response) = app(&h)
        .oneshot(get(&format!("/api/v1/matches/{}", uuid::Uuid::new_v4())))
        .await
    else {
        panic!("request must succeed");
    };
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], 2001);
}
