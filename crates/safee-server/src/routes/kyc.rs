use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct KycRecord {
    pub name: String,
    pub dob: String,
    pub verified: bool,
}

/// Fixed demonstration KYC record.
async fn kyc_example() -> Json<KycRecord> {
    Json(KycRecord {
        name: "John Doe".to_string(),
        dob: "1990-01-01".to_string(),
        verified: true,
    })
}

pub fn routes() -> Router {
    Router::new().route("/kyc/example", get(kyc_example))
}
