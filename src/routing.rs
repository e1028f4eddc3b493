//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState,
    customer::{
        create_customer_endpoint, get_balance_endpoint, get_customer_endpoint,
        search_customers_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, list_all_transactions_endpoint,
        list_customer_transactions_endpoint, monthly_summary_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::CUSTOMERS,
            post(create_customer_endpoint).get(search_customers_endpoint),
        )
        .route(endpoints::CUSTOMER, get(get_customer_endpoint))
        .route(endpoints::CUSTOMER_BALANCE, get(get_balance_endpoint))
        .route(
            endpoints::CUSTOMER_TRANSACTIONS,
            post(create_transaction_endpoint).get(list_customer_transactions_endpoint),
        )
        .route(
            endpoints::CUSTOMER_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::TRANSACTIONS, get(list_all_transactions_endpoint))
        .route(
            endpoints::TRANSACTIONS_SUMMARY,
            get(monthly_summary_endpoint),
        )
        .layer(middleware::from_fn(logging_middleware))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON body served for paths that match no route.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "no such resource"})),
    )
        .into_response()
}
