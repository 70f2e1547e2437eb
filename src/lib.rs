pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod progress;
pub mod rejections;
pub mod scoring;
pub mod services;
pub mod utils;

use axum::Router;

use db::Db;
use services::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AuthService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: Db, secure_cookies: bool) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            db,
            secure_cookies,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::auth::routes())
        .merge(handlers::api::routes())
        .merge(handlers::admin::routes())
        .with_state(state)
}
