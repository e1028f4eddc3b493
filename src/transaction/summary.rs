//! Aggregates sales and payments into a month-by-month summary.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::{AppState, Error, money::format_money, transaction::core::TransactionType};

/// How many months the summary covers when no range is given.
const DEFAULT_MONTHS: u8 = 6;

/// The totals for one calendar month.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// The calendar year.
    pub year: i32,
    /// The calendar month, 1 through 12.
    pub month: u8,
    /// The sum of sale amounts in this month.
    pub sales: i64,
    /// The sum of payment amounts in this month.
    pub payments: i64,
    /// The sales total formatted for display.
    pub sales_display: String,
    /// The payments total formatted for display.
    pub payments_display: String,
}

impl MonthSummary {
    fn new(year: i32, month: u8, sales: i64, payments: i64) -> Self {
        Self {
            year,
            month,
            sales,
            payments,
            sales_display: format_money(sales),
            payments_display: format_money(payments),
        }
    }
}

/// The first day of the month containing `date`.
fn month_start(date: Date) -> Date {
    // Day 1 always exists, so the construction cannot fail.
    Date::from_calendar_date(date.year(), date.month(), 1)
        .unwrap_or(date)
}

/// The last day of the month containing `date`.
fn month_end(date: Date) -> Date {
    let last_day = time::util::days_in_year_month(date.year(), date.month());

    Date::from_calendar_date(date.year(), date.month(), last_day).unwrap_or(date)
}

/// The calendar month following `(year, month)`.
fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        _ => (year, month.next()),
    }
}

/// The first day of the month `months_back` months before `date`'s month.
fn months_before(date: Date, months_back: u8) -> Date {
    let mut year = date.year();
    let mut month = date.month();

    for _ in 0..months_back {
        (year, month) = match month {
            Month::January => (year - 1, Month::December),
            _ => (year, month.previous()),
        };
    }

    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

/// Summarize sales and payments per calendar month.
///
/// The range defaults to the last [DEFAULT_MONTHS] months ending today. An
/// inverted range is swapped rather than rejected, and the range is widened to
/// whole months. Months without any activity appear with zero totals.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn monthly_summary(
    start: Option<Date>,
    end: Option<Date>,
    today: Date,
    connection: &Connection,
) -> Result<Vec<MonthSummary>, Error> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| months_before(end, DEFAULT_MONTHS - 1));
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let start = month_start(start);
    let end = month_end(end);

    let rows: Vec<(TransactionType, i64, Date)> = connection
        .prepare(
            "SELECT type, amount, date FROM \"transaction\"
             WHERE date >= :start AND date <= :end AND type IN ('SALE', 'PAYMENT')",
        )?
        .query_map(
            &[(":start", &start as &dyn rusqlite::ToSql), (":end", &end)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?
        .collect::<Result<_, _>>()?;

    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while (year, month as u8) <= (end.year(), end.month() as u8) {
        let mut sales = 0;
        let mut payments = 0;

        for (transaction_type, amount, date) in &rows {
            if date.year() == year && date.month() == month {
                match transaction_type {
                    TransactionType::Sale => sales += amount,
                    TransactionType::Payment => payments += amount,
                    _ => {}
                }
            }
        }

        months.push(MonthSummary::new(year, month as u8, sales, payments));
        (year, month) = next_month(year, month);
    }

    Ok(months)
}

/// The state needed to compute the monthly summary.
#[derive(Debug, Clone)]
pub struct MonthlySummaryState {
    /// The database connection for the transaction log.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MonthlySummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for the monthly summary.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// The first day of interest. Defaults to five months before `end`.
    start: Option<Date>,
    /// The last day of interest. Defaults to today.
    end: Option<Date>,
}

/// The response body for the monthly summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlySummaryResponse {
    /// One entry per calendar month in the range, oldest first.
    pub months: Vec<MonthSummary>,
}

/// A route handler for the month-by-month sales and payments summary.
pub async fn monthly_summary_endpoint(
    State(state): State<MonthlySummaryState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<MonthlySummaryResponse>, Error> {
    let today = OffsetDateTime::now_utc().date();
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let months = monthly_summary(query.start, query.end, today, &connection)?;

    Ok(Json(MonthlySummaryResponse { months }))
}
