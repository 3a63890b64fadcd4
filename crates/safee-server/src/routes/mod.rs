pub mod chat;
pub mod home;
pub mod kyc;
pub mod scoring;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state))
        .merge(scoring::routes())
        .merge(kyc::routes())
        .merge(home::routes())
}
