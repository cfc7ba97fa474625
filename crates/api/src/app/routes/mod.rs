use axum::{
    Router,
    routing::{get, patch, post},
};

pub mod items;
pub mod reports;
pub mod session;
pub mod system;
pub mod transactions;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/logout", post(session::logout))
        .nest("/items", items::router())
        .route("/receipts", get(transactions::list_receipts))
        .route("/issues", get(transactions::list_issues))
        .nest("/reports", reports::router())
        .route("/exports/:file", get(reports::export_csv))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:username",
            patch(users::update_user).delete(users::delete_user),
        )
}
