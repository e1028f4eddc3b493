//! Database initialization for the application's domain models.

use rusqlite::Connection;

use crate::{customer::create_customer_table, transaction::create_transaction_table};

/// Create the tables for the domain models in the database.
///
/// This function is idempotent and safe to call on an existing database.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Foreign keys are enforced per-connection in SQLite.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_customer_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
