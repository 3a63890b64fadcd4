//! The demonstration scoring stub.
//!
//! Hardcoded rules, deterministic output. This route is independent of the
//! production scoring clients in `safee::scoring` and is never called by
//! the chat orchestrator.

use axum::{extract::Query, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub gender: String,
    pub age: u32,
    pub business_sector: String,
    pub region: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScoreResponse {
    pub score: u32,
    pub model: String,
    pub user_id: String,
}

fn demo_score(request: &ScoreRequest) -> ScoreResponse {
    let mut score = 300;
    if request.age >= 30 {
        score += 50;
    }
    if request.business_sector.eq_ignore_ascii_case("tech") {
        score += 100;
    }
    if request.region.eq_ignore_ascii_case("california") {
        score += 20;
    }
    if request.gender.eq_ignore_ascii_case("male") {
        score += 10;
    }

    ScoreResponse {
        score: score.min(850),
        model: "Micro Model".to_string(),
        user_id: format!("cust_{}_{}", request.gender, request.age),
    }
}

async fn score_from_body(Json(request): Json<ScoreRequest>) -> Json<ScoreResponse> {
    Json(demo_score(&request))
}

async fn score_from_query(Query(request): Query<ScoreRequest>) -> Json<ScoreResponse> {
    Json(demo_score(&request))
}

pub fn routes() -> Router {
    Router::new().route(
        "/scoring/example",
        get(score_from_query).post(score_from_body),
    )
}
