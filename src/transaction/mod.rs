//! The customer transaction log: models, balance derivation, classification
//! and validation, and the route handlers operating on it.

pub mod balance;
pub mod classify;
pub mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod summary;

pub use core::{
    Transaction, TransactionType, create_transaction_table, parse_type_filter,
};

pub use balance::{displayed_balance, signed_total};
pub use classify::{ForgivenessReason, SaleType, TransactionRequest};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use list_endpoint::{list_all_transactions_endpoint, list_customer_transactions_endpoint};
pub use summary::monthly_summary_endpoint;
