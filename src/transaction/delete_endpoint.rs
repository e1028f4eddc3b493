//! Defines the endpoint for deleting a transaction.
//!
//! Deleting a transaction must reverse its balance effect exactly, so the
//! customer's balance is recomputed from the remaining log inside the same
//! critical section as the delete.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::{CustomerId, TransactionId},
    money::format_money,
    transaction::{balance::displayed_balance, core::delete_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for the transaction log.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body after deleting a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTransactionResponse {
    /// The customer's balance after the deletion (0 if the log emptied).
    pub new_balance: i64,
    /// The new balance formatted for display.
    pub new_balance_display: String,
}

/// A route handler for deleting a transaction of a customer.
///
/// Responds with the customer's recomputed balance, or 404 if the transaction
/// does not exist for this customer.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path((customer_id, transaction_id)): Path<(CustomerId, TransactionId)>,
) -> Result<Json<DeleteTransactionResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let rows_affected = delete_transaction(customer_id, transaction_id, &connection)?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    let new_balance = displayed_balance(customer_id, &connection)?;

    tracing::info!(
        "Deleted transaction {transaction_id} of customer {customer_id}, balance is now {new_balance}"
    );

    Ok(Json(DeleteTransactionResponse {
        new_balance,
        new_balance_display: format_money(new_balance),
    }))
}
