//! Defines the route handlers for creating and querying customers.

use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::core::{Customer, create_customer, get_customer, search_customers},
    database_id::CustomerId,
    money::format_money,
};

/// The state needed for the customer endpoints.
#[derive(Debug, Clone)]
pub struct CustomerState {
    /// The database connection for customers and their transaction logs.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a customer.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerForm {
    /// The customer's full name.
    pub name: String,
    /// Where the customer lives.
    pub address: String,
    /// A free-form label grouping customers by area.
    pub sector: String,
}

/// A customer as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerResponse {
    /// The ID of the customer.
    pub id: CustomerId,
    /// The customer's full name.
    pub name: String,
    /// Where the customer lives.
    pub address: String,
    /// A free-form label grouping customers by area.
    pub sector: String,
    /// How much the customer currently owes.
    pub balance: i64,
    /// The balance formatted for display.
    pub balance_display: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            address: customer.address,
            sector: customer.sector,
            balance: customer.balance,
            balance_display: format_money(customer.balance),
        }
    }
}

/// A route handler for creating a new customer.
///
/// Responds with 201 and the customer, whose balance starts at zero.
pub async fn create_customer_endpoint(
    State(state): State<CustomerState>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let customer = create_customer(&form.name, &form.address, &form.sector, &connection)?;

    tracing::info!("Created customer {} ({})", customer.id, customer.name);

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))).into_response())
}

/// A route handler for retrieving a customer with their derived balance.
pub async fn get_customer_endpoint(
    State(state): State<CustomerState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<CustomerResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let customer = get_customer(customer_id, &connection)?;

    Ok(Json(customer.into()))
}

/// Query parameters for the customer search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// A substring of the name to search for. Blank matches nobody.
    q: Option<String>,
}

/// The response body listing the customers matching a search.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The matching customers, ordered by name.
    pub customers: Vec<CustomerResponse>,
}

/// A route handler for searching customers by name.
pub async fn search_customers_endpoint(
    State(state): State<CustomerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let customers = search_customers(query.q.as_deref().unwrap_or(""), &connection)?
        .into_iter()
        .map(CustomerResponse::from)
        .collect();

    Ok(Json(SearchResponse { customers }))
}

/// The response body for a customer's balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// How much the customer currently owes.
    pub balance: i64,
    /// The balance formatted for display.
    pub display: String,
}

/// A route handler for a customer's current balance.
pub async fn get_balance_endpoint(
    State(state): State<CustomerState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<BalanceResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let balance = get_customer(customer_id, &connection)?.balance;

    Ok(Json(BalanceResponse {
        balance,
        display: format_money(balance),
    }))
}
