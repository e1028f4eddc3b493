//! Defines the endpoint for recording a transaction against a customer.

use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    customer::get_customer,
    database_id::{CustomerId, TransactionId},
    money::format_money,
    transaction::{
        balance::displayed_balance,
        classify::{ForgivenessReason, SaleType, TransactionRequest, classify},
        core::{TransactionType, append_transaction},
    },
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for the transaction log.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for recording a transaction.
///
/// `amount` is accepted as text because clients may submit it with display
/// formatting, e.g. "$2.500".
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The transaction type identifier, e.g. "SALE" or "FAULT_DISCOUNT".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The raw, possibly formatted amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// A text description of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The calendar date the event happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    /// For sales, the number of items sold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<i64>,
    /// For debt forgiveness, why the debt was waived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ForgivenessReason>,
}

/// The response body after recording a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    /// The ID assigned to the new transaction.
    pub id: TransactionId,
    /// The transaction type that was recorded.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The sale tag decided at creation time, for sales only.
    pub sale_type: Option<SaleType>,
    /// The amount recorded on the ledger.
    pub amount: i64,
    /// The customer's balance after this transaction.
    pub new_balance: i64,
    /// The new balance formatted for display.
    pub new_balance_display: String,
}

/// A route handler for recording a transaction against a customer.
///
/// Responds with 201 and the new balance on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Path(customer_id): Path<CustomerId>,
    Form(form): Form<TransactionForm>,
) -> Result<Response, Error> {
    let transaction_type = TransactionType::parse(&form.transaction_type)
        .ok_or_else(|| Error::UnknownTransactionType(form.transaction_type.clone()))?;

    let request = TransactionRequest {
        amount: form.amount,
        detail: form.detail,
        date: form.date,
        items: form.items,
        reason: form.reason,
    };

    // Classification, the append, and the balance recomputation must all see
    // the same log state.
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let balance_before = get_customer(customer_id, &connection)?.balance;
    let today = OffsetDateTime::now_utc().date();
    let entry = classify(transaction_type, &request, balance_before, today)?;
    let transaction = append_transaction(customer_id, &entry, &connection)?;
    let new_balance = displayed_balance(customer_id, &connection)?;

    tracing::info!(
        "Recorded {} of {} for customer {customer_id}, balance {balance_before} -> {new_balance}",
        transaction_type.as_str(),
        transaction.amount,
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            id: transaction.id,
            transaction_type,
            sale_type: transaction.sale_type,
            amount: transaction.amount,
            new_balance,
            new_balance_display: format_money(new_balance),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, build_router,
        customer::{CustomerForm, CustomerResponse},
        endpoints,
    };

    use super::{CreateTransactionResponse, TransactionForm};

    fn new_transaction_form(transaction_type: &str) -> TransactionForm {
        TransactionForm {
            transaction_type: transaction_type.to_owned(),
            amount: None,
            detail: None,
            date: None,
            items: None,
            reason: None,
        }
    }

    async fn create_server_with_customer() -> (TestServer, i64) {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(connection).expect("Could not initialize app state.");
        let server = TestServer::new(build_router(state));

        let customer = server
            .post(endpoints::CUSTOMERS)
            .form(&CustomerForm {
                name: "Cliente de prueba".to_owned(),
                address: "Calle Falsa 123".to_owned(),
                sector: "Sector Norte".to_owned(),
            })
            .await
            .json::<CustomerResponse>();

        (server, customer.id)
    }

    fn transactions_path(customer_id: i64) -> String {
        format!("/api/customers/{customer_id}/transactions")
    }

    #[tokio::test]
    async fn sale_increases_balance_and_is_a_new_sale() {
        let (server, customer_id) = create_server_with_customer().await;

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("1000".to_owned()),
                detail: Some("Venta inicial".to_owned()),
                items: Some(1),
                ..new_transaction_form("SALE")
            })
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body = response.json::<CreateTransactionResponse>();
        assert_eq!(body.new_balance, 1000);
        assert_eq!(body.new_balance_display, "$1.000");
        assert_eq!(
            body.sale_type,
            Some(crate::transaction::SaleType::NewSale)
        );
    }

    #[tokio::test]
    async fn second_sale_is_maintenance() {
        let (server, customer_id) = create_server_with_customer().await;
        server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("1000".to_owned()),
                detail: Some("Venta inicial".to_owned()),
                items: Some(1),
                ..new_transaction_form("SALE")
            })
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("700".to_owned()),
                detail: Some("Mantención".to_owned()),
                items: Some(1),
                ..new_transaction_form("SALE")
            })
            .await;

        let body = response.json::<CreateTransactionResponse>();
        assert_eq!(
            body.sale_type,
            Some(crate::transaction::SaleType::Maintenance)
        );
        assert_eq!(body.new_balance, 1700);
    }

    #[tokio::test]
    async fn payment_decreases_balance() {
        let (server, customer_id) = create_server_with_customer().await;
        server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("1000".to_owned()),
                detail: Some("Venta".to_owned()),
                ..new_transaction_form("SALE")
            })
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("500".to_owned()),
                ..new_transaction_form("PAYMENT")
            })
            .await;

        let body = response.json::<CreateTransactionResponse>();
        assert_eq!(body.new_balance, 500);
        assert_eq!(body.new_balance_display, "$500");
    }

    #[tokio::test]
    async fn forgiveness_zeroes_the_balance() {
        let (server, customer_id) = create_server_with_customer().await;
        server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("2500".to_owned()),
                detail: Some("Venta".to_owned()),
                ..new_transaction_form("SALE")
            })
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                date: Some(time::macros::date!(2026 - 05 - 01)),
                reason: Some(crate::transaction::ForgivenessReason::CashPaymentDiscount),
                ..new_transaction_form("DEBT_FORGIVENESS")
            })
            .await;

        let body = response.json::<CreateTransactionResponse>();
        assert_eq!(body.amount, 2500);
        assert_eq!(body.new_balance, 0);
        assert_eq!(body.new_balance_display, "$0");
    }

    #[tokio::test]
    async fn accepts_formatted_amounts() {
        let (server, customer_id) = create_server_with_customer().await;

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("$2.500".to_owned()),
                detail: Some("Venta".to_owned()),
                ..new_transaction_form("SALE")
            })
            .await;

        let body = response.json::<CreateTransactionResponse>();
        assert_eq!(body.amount, 2500);
    }

    #[tokio::test]
    async fn rejects_unknown_type() {
        let (server, customer_id) = create_server_with_customer().await;

        let response = server
            .post(&transactions_path(customer_id))
            .form(&new_transaction_form("VENTA"))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn rejects_invalid_amount_without_state_change() {
        let (server, customer_id) = create_server_with_customer().await;

        let response = server
            .post(&transactions_path(customer_id))
            .form(&TransactionForm {
                amount: Some("0".to_owned()),
                detail: Some("Venta".to_owned()),
                ..new_transaction_form("SALE")
            })
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);

        let balance = server
            .get(&format!("/api/customers/{customer_id}/balance"))
            .await
            .json::<serde_json::Value>();
        assert_eq!(balance["balance"], 0);
    }

    #[tokio::test]
    async fn rejects_unknown_customer() {
        let (server, _) = create_server_with_customer().await;

        let response = server
            .post(&transactions_path(999))
            .form(&TransactionForm {
                amount: Some("1000".to_owned()),
                detail: Some("Venta".to_owned()),
                ..new_transaction_form("SALE")
            })
            .await;

        response.assert_status_not_found();
    }
}
