use axum::{response::Html, routing::get, Router};

const HOME_PAGE: &str = include_str!("../../static/home.html");

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

pub fn routes() -> Router {
    Router::new().route("/home", get(home))
}
