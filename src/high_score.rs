use chrono::Local;
use log::{debug, warn};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("high score database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("high score storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for the single best score
pub trait HighScoreStore {
    /// Stored value, or 0 when nothing usable is stored
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

impl<T: HighScoreStore + ?Sized> HighScoreStore for Box<T> {
    fn load(&self) -> u32 {
        (**self).load()
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        (**self).save(score)
    }
}

/// Best score seen by this process, seeded from the store at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    pub fn new(best: u32) -> Self {
        Self { best }
    }

    pub fn value(&self) -> u32 {
        self.best
    }

    /// Fold a finished session's score in; true when it set a new record
    pub fn submit(&mut self, final_score: u32) -> bool {
        if final_score > self.best {
            self.best = final_score;
            true
        } else {
            false
        }
    }
}

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS high_score (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        score INTEGER NOT NULL,
        achieved_at TEXT NOT NULL
    )
"#;

/// SQLite-backed store under the user's state directory
#[derive(Debug)]
pub struct SqliteHighScoreStore {
    conn: Connection,
}

impl SqliteHighScoreStore {
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::high_score_path().unwrap_or_else(|| PathBuf::from("whack_highscore.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("opening high score database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self { conn })
    }
}

impl HighScoreStore for SqliteHighScoreStore {
    fn load(&self) -> u32 {
        let stored = self
            .conn
            .query_row("SELECT score FROM high_score WHERE id = 1", [], |row| {
                row.get::<_, i64>(0)
            });
        match stored {
            Ok(score) => u32::try_from(score).unwrap_or_else(|_| {
                warn!("ignoring out of range stored high score {score}");
                0
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => 0,
            Err(e) => {
                warn!("unreadable stored high score, starting from 0: {e}");
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO high_score (id, score, achieved_at) VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET score = excluded.score, achieved_at = excluded.achieved_at
            "#,
            params![score, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-process store; keeps a log of writes so callers can assert on them
#[derive(Debug, Default)]
pub struct MemoryHighScoreStore {
    pub stored: Option<u32>,
    pub writes: Vec<u32>,
    pub fail_writes: bool,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u32) -> Self {
        Self {
            stored: Some(score),
            ..Self::default()
        }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> u32 {
        self.stored.unwrap_or(0)
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "writes disabled").into());
        }
        self.stored = Some(score);
        self.writes.push(score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_submit_keeps_maximum() {
        let mut hs = HighScore::new(50);
        assert!(!hs.submit(40));
        assert_eq!(hs.value(), 50);
        assert!(!hs.submit(50));
        assert!(hs.submit(60));
        assert_eq!(hs.value(), 60);
    }

    #[test]
    fn test_empty_database_loads_zero() {
        let store = SqliteHighScoreStore::open_in_memory().unwrap();
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = SqliteHighScoreStore::open_in_memory().unwrap();
        store.save(120).unwrap();
        assert_eq!(store.load(), 120);
        store.save(130).unwrap();
        assert_eq!(store.load(), 130);

        let rows: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM high_score", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_unparseable_value_loads_zero() {
        let store = SqliteHighScoreStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO high_score (id, score, achieved_at) VALUES (1, 'lots', 'never')",
                [],
            )
            .unwrap();
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_negative_value_loads_zero() {
        let store = SqliteHighScoreStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO high_score (id, score, achieved_at) VALUES (1, -5, 'never')",
                [],
            )
            .unwrap();
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("highscore.db");
        {
            let mut store = SqliteHighScoreStore::open(&path).unwrap();
            store.save(70).unwrap();
        }
        let store = SqliteHighScoreStore::open(&path).unwrap();
        assert_eq!(store.load(), 70);
    }

    #[test]
    fn test_memory_store_records_writes() {
        let mut store = MemoryHighScoreStore::with_score(10);
        assert_eq!(store.load(), 10);
        store.save(20).unwrap();
        assert_eq!(store.load(), 20);
        assert_eq!(store.writes, vec![20]);
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryHighScoreStore {
            fail_writes: true,
            ..MemoryHighScoreStore::default()
        };
        assert_matches!(store.save(5), Err(StoreError::Io(_)));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn HighScoreStore> = Box::new(MemoryHighScoreStore::with_score(3));
        assert_eq!(store.load(), 3);
        store.save(4).unwrap();
        assert_eq!(store.load(), 4);
    }
}
