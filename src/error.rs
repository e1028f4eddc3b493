//! Defines the app level error type and its conversion to JSON API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount was missing, not a number, or not strictly positive.
    ///
    /// Amounts may arrive with display formatting (e.g. "$2.500"), which the
    /// boundary strips before parsing. Whatever remains must be a positive
    /// whole number.
    #[error("amount must be a positive whole number")]
    InvalidAmount,

    /// The items count on a sale was present but not a positive integer.
    #[error("items count must be a positive integer")]
    InvalidItemCount,

    /// A field required by the transaction type was missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// An unknown transaction type was used as a value or filter.
    #[error("unknown transaction type \"{0}\"")]
    UnknownTransactionType(String),

    /// Debt forgiveness was requested for a customer with no outstanding
    /// balance. There is no entry to record in that case.
    #[error("the customer has no outstanding balance to forgive")]
    NothingToForgive,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed, which
            // means the referenced customer does not exist.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::NotFound
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::InvalidAmount
            | Error::InvalidItemCount
            | Error::MissingField(_)
            | Error::UnknownTransactionType(_)
            | Error::NothingToForgive => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            Error::DatabaseLock | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An unexpected error occurred, check the server logs for more details."
                    })),
                )
                    .into_response();
            }
        };

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
