use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::error::Result;
use crate::timer::Timestamp;

/// One wrong keystroke, kept across runs so the heat map can span sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMistake {
    pub expected: char,
    pub typed: char,
    pub dictionary: String,
    pub timestamp: Timestamp,
}

/// SQLite-backed mistake history
#[derive(Debug)]
pub struct MistakeDb {
    conn: Connection,
}

impl MistakeDb {
    /// Open (or create) the database file, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS key_mistakes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                expected TEXT NOT NULL,
                typed TEXT NOT NULL,
                dictionary TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_key_mistakes_expected ON key_mistakes(expected)",
            [],
        )?;

        Ok(MistakeDb { conn })
    }

    pub fn record_mistake(&self, mistake: &KeyMistake) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO key_mistakes (expected, typed, dictionary, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                mistake.expected.to_string(),
                mistake.typed.to_string(),
                mistake.dictionary,
                mistake.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Record a run's mistakes in one transaction.
    pub fn record_mistakes_batch(&mut self, mistakes: &[KeyMistake]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for mistake in mistakes {
            tx.execute(
                r#"
                INSERT INTO key_mistakes (expected, typed, dictionary, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    mistake.expected.to_string(),
                    mistake.typed.to_string(),
                    mistake.dictionary,
                    mistake.timestamp.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Mistake count per expected character, most missed first.
    pub fn heat_map(&self) -> Result<Vec<(char, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT expected, COUNT(*) AS misses
            FROM key_mistakes
            GROUP BY expected
            ORDER BY misses DESC, expected ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let expected: String = row.get(0)?;
            Ok((expected.chars().next().unwrap_or('\0'), row.get(1)?))
        })?;

        let mut heat = Vec::new();
        for row in rows {
            heat.push(row?);
        }
        Ok(heat)
    }

    /// What is most often typed instead of `expected`.
    pub fn top_confusions(&self, expected: char, limit: usize) -> Result<Vec<(char, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT typed, COUNT(*) AS hits
            FROM key_mistakes
            WHERE expected = ?1
            GROUP BY typed
            ORDER BY hits DESC, typed ASC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![expected.to_string(), limit as i64], |row| {
            let typed: String = row.get(0)?;
            Ok((typed.chars().next().unwrap_or('\0'), row.get(1)?))
        })?;

        let mut confusions = Vec::new();
        for row in rows {
            confusions.push(row?);
        }
        Ok(confusions)
    }

    pub fn mistakes_since(&self, since: Timestamp) -> Result<Vec<KeyMistake>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT expected, typed, dictionary, timestamp
            FROM key_mistakes
            WHERE timestamp >= ?1
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map([since.to_rfc3339()], |row| {
            let expected: String = row.get(0)?;
            let typed: String = row.get(1)?;
            let timestamp: String = row.get(3)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        3,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Utc);

            Ok(KeyMistake {
                expected: expected.chars().next().unwrap_or('\0'),
                typed: typed.chars().next().unwrap_or('\0'),
                dictionary: row.get(2)?,
                timestamp,
            })
        })?;

        let mut mistakes = Vec::new();
        for row in rows {
            mistakes.push(row?);
        }
        Ok(mistakes)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM key_mistakes", [])?;
        Ok(())
    }
}
