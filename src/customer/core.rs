//! Defines the customer model and its database queries.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CustomerId, transaction::balance::displayed_balance};

/// Someone who buys on credit.
///
/// The balance is not stored. It is derived from the customer's transaction
/// log whenever the customer is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
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
}

/// Create the customer table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                sector TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new customer with a zero balance.
///
/// Leading and trailing whitespace is trimmed from every field.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if a field is blank after trimming,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_customer(
    name: &str,
    address: &str,
    sector: &str,
    connection: &Connection,
) -> Result<Customer, Error> {
    let name = required_field(name, "name")?;
    let address = required_field(address, "address")?;
    let sector = required_field(sector, "sector")?;

    let id = connection
        .prepare("INSERT INTO customer (name, address, sector) VALUES (?1, ?2, ?3) RETURNING id")?
        .query_one((name, address, sector), |row| row.get(0))?;

    Ok(Customer {
        id,
        name: name.to_owned(),
        address: address.to_owned(),
        sector: sector.to_owned(),
        balance: 0,
    })
}

fn required_field<'a>(value: &'a str, field: &'static str) -> Result<&'a str, Error> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        Err(Error::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Retrieve a customer by `id`, with their balance derived from the log.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_customer(id: CustomerId, connection: &Connection) -> Result<Customer, Error> {
    let (name, address, sector) = connection
        .prepare("SELECT name, address, sector FROM customer WHERE id = :id")?
        .query_one(&[(":id", &id)], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;

    let balance = displayed_balance(id, connection)?;

    Ok(Customer {
        id,
        name,
        address,
        sector,
        balance,
    })
}

/// Search customers by name, case-insensitive substring match.
///
/// A blank filter matches nobody. Results are ordered by name and carry their
/// derived balances.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn search_customers(filter: &str, connection: &Connection) -> Result<Vec<Customer>, Error> {
    let filter = filter.trim();

    if filter.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{filter}%");
    let ids: Vec<CustomerId> = connection
        .prepare("SELECT id FROM customer WHERE name LIKE :pattern ORDER BY name ASC")?
        .query_map(&[(":pattern", &pattern)], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    ids.into_iter()
        .map(|id| get_customer(id, connection))
        .collect()
}
