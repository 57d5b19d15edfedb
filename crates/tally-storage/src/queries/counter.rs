// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter operations.
//!
//! Each operation is one `BEGIN IMMEDIATE` transaction: an idempotent
//! ensure-exists insert followed by the read or the SQL-side mutation. The
//! immediate transaction takes SQLite's write lock up front, so neither a
//! second process nor a second connection can interleave between the two
//! steps.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, Transaction, TransactionBehavior, params};
use tally_core::{Counter, Increment, TallyError};
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// The counter the operations act on: the lowest id when several exist.
const FIRST_COUNTER: &str = "SELECT id, value, updated_at FROM counters ORDER BY id ASC LIMIT 1";

const SELECT_BY_ID: &str = "SELECT id, value, updated_at FROM counters WHERE id = ?1";

/// Insert a row only when the table is empty.
const ENSURE_COUNTER: &str = "INSERT INTO counters (value, updated_at)
     SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM counters)";

const RESET: &str = "UPDATE counters SET value = ?1, updated_at = ?2 WHERE id = ?3
     RETURNING id, value, updated_at";

/// `?4` is `i64::MAX - increment`; a row above it is left untouched.
const INCREMENT: &str = "UPDATE counters SET value = value + ?1, updated_at = ?2
     WHERE id = ?3 AND value <= ?4
     RETURNING id, value, updated_at";

/// Result of a mutation inside the transaction.
enum Applied {
    Counter(Counter),
    Overflow { value: i64 },
}

/// Return the counter, creating it with value 0 if the table is empty.
pub async fn get_or_create(db: &Database) -> Result<Counter, TallyError> {
    db.connection()
        .call(|conn| -> Result<Counter, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let counter = match ensure_counter(&tx, 0, now_millis())? {
                Some(created) => created,
                None => first_counter(&tx)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?,
            };
            tx.commit()?;
            Ok(counter)
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically add `by` to the counter. An empty table gets a row holding `by`.
pub async fn increment(db: &Database, by: Increment) -> Result<Counter, TallyError> {
    let amount = by.get();
    let applied = db
        .connection()
        .call(move |conn| -> Result<Applied, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = now_millis();
            let applied = match ensure_counter(&tx, amount, now)? {
                Some(created) => Applied::Counter(created),
                None => {
                    let current =
                        first_counter(&tx)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                    let stamp = next_timestamp(current.updated_at, now);
                    tx.query_row(
                        INCREMENT,
                        params![amount, format_timestamp(stamp), current.id, i64::MAX - amount],
                        row_to_counter,
                    )
                    .optional()?
                    .map_or(Applied::Overflow { value: current.value }, Applied::Counter)
                }
            };
            tx.commit()?;
            Ok(applied)
        })
        .await
        .map_err(map_tr_err)?;

    match applied {
        Applied::Counter(counter) => {
            debug!(id = counter.id, value = counter.value, amount, "counter incremented");
            Ok(counter)
        }
        Applied::Overflow { value } => Err(TallyError::Overflow {
            value,
            increment: amount,
        }),
    }
}

/// Overwrite the counter value. An empty table gets a row holding `value`.
pub async fn reset(db: &Database, value: i64) -> Result<Counter, TallyError> {
    let counter = db
        .connection()
        .call(move |conn| -> Result<Counter, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = now_millis();
            let counter = match ensure_counter(&tx, value, now)? {
                Some(created) => created,
                None => {
                    let current =
                        first_counter(&tx)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                    let stamp = next_timestamp(current.updated_at, now);
                    tx.query_row(
                        RESET,
                        params![value, format_timestamp(stamp), current.id],
                        row_to_counter,
                    )?
                }
            };
            tx.commit()?;
            Ok(counter)
        })
        .await
        .map_err(map_tr_err)?;
    debug!(id = counter.id, value = counter.value, "counter reset");
    Ok(counter)
}

/// Insert the counter when none exists. Returns the new row, or `None` when
/// a counter was already present.
fn ensure_counter(
    tx: &Transaction<'_>,
    initial: i64,
    now: DateTime<Utc>,
) -> Result<Option<Counter>, rusqlite::Error> {
    let inserted = tx.execute(ENSURE_COUNTER, params![initial, format_timestamp(now)])?;
    if inserted == 0 {
        return Ok(None);
    }
    let id = tx.last_insert_rowid();
    tx.query_row(SELECT_BY_ID, params![id], row_to_counter).map(Some)
}

fn first_counter(tx: &Transaction<'_>) -> Result<Option<Counter>, rusqlite::Error> {
    tx.query_row(FIRST_COUNTER, [], row_to_counter).optional()
}

fn row_to_counter(row: &Row<'_>) -> Result<Counter, rusqlite::Error> {
    let updated_at: String = row.get(2)?;
    Ok(Counter {
        id: row.get(0)?,
        value: row.get(1)?,
        updated_at: parse_timestamp(&updated_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
    })
}

/// Current time truncated to the millisecond precision the column stores.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// The timestamp for a mutation: `now`, but never at or before `previous`.
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + TimeDelta::milliseconds(1))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn insert_raw(db: &Database, value: i64) -> i64 {
        db.connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute("INSERT INTO counters (value) VALUES (?1)", params![value])?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .unwrap()
    }

    async fn row_count(db: &Database) -> i64 {
        db.connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM counters", [], |row| row.get(0))
            })
            .await
            .unwrap()
    }

    fn inc(amount: i64) -> Increment {
        Increment::new(amount).unwrap()
    }

    #[tokio::test]
    async fn get_on_empty_store_creates_single_zero_row() {
        let (db, _dir) = setup_db().await;

        let first = get_or_create(&db).await.unwrap();
        assert_eq!(first.value, 0);
        assert_eq!(row_count(&db).await, 1);

        let second = get_or_create(&db).await.unwrap();
        assert_eq!(second, first, "second get must return the same record");
        assert_eq!(row_count(&db).await, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn increment_on_empty_store_starts_at_amount() {
        let (db, _dir) = setup_db().await;
        let counter = increment(&db, inc(5)).await.unwrap();
        assert_eq!(counter.value, 5);
        assert_eq!(row_count(&db).await, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reset_on_empty_store_starts_at_value() {
        let (db, _dir) = setup_db().await;
        let counter = reset(&db, -4).await.unwrap();
        assert_eq!(counter.value, -4);
        assert_eq!(row_count(&db).await, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn increment_then_reset_then_get_scenario() {
        let (db, _dir) = setup_db().await;
        let id = insert_raw(&db, 7).await;

        let after_inc = increment(&db, inc(4)).await.unwrap();
        assert_eq!((after_inc.id, after_inc.value), (id, 11));

        let after_reset = reset(&db, 0).await.unwrap();
        assert_eq!((after_reset.id, after_reset.value), (id, 0));

        let fetched = get_or_create(&db).await.unwrap();
        assert_eq!(fetched, after_reset);
        assert_eq!(row_count(&db).await, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reset_accepts_negative_values() {
        let (db, _dir) = setup_db().await;
        insert_raw(&db, 99).await;
        assert_eq!(reset(&db, -10).await.unwrap().value, -10);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mutations_strictly_advance_updated_at() {
        let (db, _dir) = setup_db().await;
        let mut previous = get_or_create(&db).await.unwrap().updated_at;

        for round in 0..20 {
            let counter = if round % 2 == 0 {
                increment(&db, Increment::ONE).await.unwrap()
            } else {
                reset(&db, round).await.unwrap()
            };
            assert!(
                counter.updated_at > previous,
                "round {round}: {} not after {previous}",
                counter.updated_at
            );
            previous = counter.updated_at;
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn future_timestamp_is_still_advanced() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO counters (value, updated_at) VALUES (1, '2999-01-01T00:00:00.000Z')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let counter = increment(&db, Increment::ONE).await.unwrap();
        assert_eq!(counter.updated_at.to_rfc3339(), "2999-01-01T00:00:00.001+00:00");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn overflowing_increment_is_refused_and_row_kept() {
        let (db, _dir) = setup_db().await;
        insert_raw(&db, i64::MAX - 1).await;

        assert_eq!(increment(&db, inc(1)).await.unwrap().value, i64::MAX);
        let err = increment(&db, inc(1)).await.unwrap_err();
        assert!(matches!(
            err,
            TallyError::Overflow { value: i64::MAX, increment: 1 }
        ));
        assert_eq!(get_or_create(&db).await.unwrap().value, i64::MAX);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn multiple_rows_act_on_lowest_id() {
        let (db, _dir) = setup_db().await;
        let first = insert_raw(&db, 1).await;
        let second = insert_raw(&db, 100).await;
        assert!(first < second);

        let counter = increment(&db, inc(2)).await.unwrap();
        assert_eq!((counter.id, counter.value), (first, 3));
        assert_eq!(reset(&db, 8).await.unwrap().id, first);
        assert_eq!(get_or_create(&db).await.unwrap().id, first);
        assert_eq!(row_count(&db).await, 2);
        db.close().await.unwrap();
    }

    #[test]
    fn next_timestamp_never_goes_backwards() {
        let previous: DateTime<Utc> = "2026-01-01T00:00:00.500Z".parse().unwrap();
        let earlier: DateTime<Utc> = "2026-01-01T00:00:00.100Z".parse().unwrap();
        let later: DateTime<Utc> = "2026-01-01T00:00:01.000Z".parse().unwrap();

        assert_eq!(
            format_timestamp(next_timestamp(previous, earlier)),
            "2026-01-01T00:00:00.501Z"
        );
        assert_eq!(next_timestamp(previous, previous), previous + TimeDelta::milliseconds(1));
        assert_eq!(next_timestamp(previous, later), later);
    }

    #[test]
    fn default_column_format_parses() {
        let parsed = parse_timestamp("2026-03-04T05:06:07.089Z").unwrap();
        assert_eq!(format_timestamp(parsed), "2026-03-04T05:06:07.089Z");
    }
}
