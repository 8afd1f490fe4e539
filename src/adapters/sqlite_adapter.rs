//! SQLite observation store.

use crate::domain::acquisition::Company;
use crate::domain::error::IndexError;
use crate::domain::observation::{Observation, RawObservation, RawValue};
use crate::ports::config_port::ConfigPort;
use crate::ports::observation_port::{DataRange, ObservationPort};
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rusqlite::types::Value;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn value_to_raw(value: Value) -> RawValue {
    match value {
        Value::Null | Value::Blob(_) => RawValue::Missing,
        Value::Integer(i) => RawValue::Number(i as f64),
        Value::Real(f) => RawValue::Number(f),
        Value::Text(s) => RawValue::from(s.as_str()),
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Null | Value::Blob(_) => String::new(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, IndexError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| IndexError::missing("sqlite", "path"))?;

        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4)?)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| IndexError::invalid("sqlite", "pool_size", "pool_size must be positive"))?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, IndexError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), IndexError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS companies (
                ticker TEXT PRIMARY KEY,
                company_name TEXT
            );
            CREATE TABLE IF NOT EXISTS market_data (
                date TEXT NOT NULL,
                ticker TEXT NOT NULL,
                close_price REAL,
                market_cap INTEGER,
                PRIMARY KEY (date, ticker)
            );
            CREATE INDEX IF NOT EXISTS idx_market_data_date ON market_data(date);",
        )
        .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Existing tickers are left untouched.
    pub fn insert_companies(&self, companies: &[Company]) -> Result<(), IndexError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for company in companies {
            tx.execute(
                "INSERT OR IGNORE INTO companies (ticker, company_name) VALUES (?1, ?2)",
                params![company.ticker, company.name],
            )
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Rows with an existing (date, ticker) key are replaced.
    pub fn insert_observations(&self, observations: &[Observation]) -> Result<(), IndexError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for obs in observations {
            tx.execute(
                "INSERT OR REPLACE INTO market_data (date, ticker, close_price, market_cap)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    obs.date.format("%Y-%m-%d").to_string(),
                    obs.ticker,
                    obs.price,
                    i64::try_from(obs.market_cap).unwrap_or(i64::MAX)
                ],
            )
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn companies(&self) -> Result<Vec<Company>, IndexError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT ticker, company_name FROM companies ORDER BY ticker")
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                let ticker: String = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                Ok(Company {
                    name: name.unwrap_or_else(|| ticker.clone()),
                    ticker,
                })
            })
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut companies = Vec::new();
        for row in rows {
            companies.push(row.map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }
        Ok(companies)
    }
}

impl ObservationPort for SqliteAdapter {
    fn fetch_observations(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, IndexError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        let start_str = start_date.map(|d| d.format("%Y-%m-%d").to_string());
        let end_str = end_date.map(|d| d.format("%Y-%m-%d").to_string());

        let query = "SELECT date, ticker, market_cap, close_price
                     FROM market_data
                     WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
                     ORDER BY date ASC, ticker ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![start_str, end_str], |row| {
                Ok(RawObservation {
                    date: value_to_string(row.get(0)?),
                    ticker: value_to_string(row.get(1)?),
                    market_cap: value_to_raw(row.get(2)?),
                    price: value_to_raw(row.get(3)?),
                })
            })
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row.map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(observations)
    }

    fn get_data_range(&self) -> Result<Option<DataRange>, IndexError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| IndexError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT MIN(date), MAX(date), COUNT(*), COUNT(DISTINCT ticker) FROM market_data";

        let result: (Option<String>, Option<String>, i64, i64) = conn
            .query_row(query, [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(|e: rusqlite::Error| IndexError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), rows, tickers) if rows > 0 => {
                let first_date = NaiveDate::parse_from_str(&min_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| IndexError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let last_date = NaiveDate::parse_from_str(&max_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| IndexError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some(DataRange {
                    first_date,
                    last_date,
                    rows: rows as usize,
                    tickers: tickers as usize,
                }))
            }
            _ => Ok(None),
        }
    }
}
