//! Defines the endpoints for listing transactions, per customer and globally.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::get_customer,
    database_id::CustomerId,
    transaction::core::{
        Transaction, count_transactions, list_all_transactions, list_transactions,
        parse_type_filter,
    },
};

/// The default number of transactions per page of the global list.
const DEFAULT_PER_PAGE: u32 = 10;
/// The largest page size a client may request.
const MAX_PER_PAGE: u32 = 50;

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for the transaction log.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for a customer's transaction list.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerTransactionsQuery {
    /// Keep only this transaction type. Absent or empty means all types.
    #[serde(rename = "type")]
    transaction_type: Option<String>,
}

/// The response body listing a customer's transactions in insertion order.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerTransactionsResponse {
    /// The customer's transactions, oldest first.
    pub transactions: Vec<Transaction>,
}

/// A route handler for listing a customer's transactions.
///
/// Transactions are returned in insertion order. Responds with 404 if the
/// customer does not exist, so an empty log is distinguishable from a missing
/// customer.
pub async fn list_customer_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Path(customer_id): Path<CustomerId>,
    Query(query): Query<CustomerTransactionsQuery>,
) -> Result<Json<CustomerTransactionsResponse>, Error> {
    let type_filter = parse_type_filter(query.transaction_type.as_deref())?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    get_customer(customer_id, &connection)?;
    let transactions = list_transactions(customer_id, type_filter, &connection)?;

    Ok(Json(CustomerTransactionsResponse { transactions }))
}

/// Query parameters for the global transaction list.
#[derive(Debug, Default, Deserialize)]
pub struct AllTransactionsQuery {
    /// Keep only this transaction type. Absent or empty means all types.
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    /// The zero-based page to fetch.
    page: Option<u32>,
    /// How many transactions per page, clamped to 1..=50.
    per_page: Option<u32>,
}

/// A page of the global transaction list.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionPage {
    /// The zero-based page that was fetched.
    pub page: u32,
    /// The page size actually used after clamping.
    pub per_page: u32,
    /// How many transactions match the filter across all pages.
    pub total: u32,
    /// The transactions on this page, newest first.
    pub items: Vec<Transaction>,
}

/// A route handler for listing transactions across all customers.
///
/// Results are newest first. Out-of-range paging parameters are clamped
/// rather than rejected, and a page past the end is an empty page.
pub async fn list_all_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<AllTransactionsQuery>,
) -> Result<Json<TransactionPage>, Error> {
    let type_filter = parse_type_filter(query.transaction_type.as_deref())?;
    let page = query.page.unwrap_or(0);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let total = count_transactions(type_filter, &connection)?;
    let items = list_all_transactions(type_filter, page, per_page, &connection)?;

    Ok(Json(TransactionPage {
        page,
        per_page,
        total,
        items,
    }))
}
