//! Day-file persistence for the history log

use chrono::{NaiveDate, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::turn::{HistoryLog, Turn};
use crate::{Error, Result};

/// Format of the date key naming each day file
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Stores one JSON file per calendar day inside a history directory
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Create a store rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// History directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Date key for the current UTC day
    pub fn today_key() -> String {
        Self::date_key(Utc::now().date_naive())
    }

    /// Date key for an arbitrary day
    pub fn date_key(date: NaiveDate) -> String {
        date.format(DATE_KEY_FORMAT).to_string()
    }

    /// Path of the artifact holding `date_key`'s turns
    pub fn path_for(&self, date_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", date_key))
    }

    /// Create the history directory if it is missing.
    ///
    /// Safe to call repeatedly; an existing directory is left untouched.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Load the turns recorded for `date_key`.
    ///
    /// A missing day file yields an empty sequence. An unreadable or
    /// malformed file is an error.
    pub async fn load(&self, date_key: &str) -> Result<Vec<Turn>> {
        let path = self.path_for(date_key);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::History(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let turns: Vec<Turn> = serde_json::from_str(&content).map_err(|e| {
            Error::History(format!("malformed history file {}: {}", path.display(), e))
        })?;

        info!("Loaded {} turns from {}", turns.len(), path.display());
        Ok(turns)
    }

    /// Ensure the directory exists and load the log for `date_key`
    pub async fn open_day(&self, date_key: &str) -> Result<HistoryLog> {
        self.ensure_dir().await?;
        let turns = self.load(date_key).await?;
        Ok(HistoryLog::with_turns(date_key, turns))
    }

    /// Record `turn` in memory, then rewrite the whole day file.
    ///
    /// The in-memory log keeps the turn even when the write fails.
    pub async fn append(&self, log: &mut HistoryLog, turn: Turn) -> Result<()> {
        log.push(turn);
        self.save(log).await
    }

    /// Replace the day file with the full contents of `log`.
    ///
    /// The array is written to a sibling temp file, synced and renamed over
    /// the artifact, so readers never observe a partial file.
    pub async fn save(&self, log: &HistoryLog) -> Result<()> {
        let path = self.path_for(log.date());
        let content = serde_json::to_string_pretty(log.turns())?;

        let tmp_path = self.dir.join(format!(".{}.json.tmp", log.date()));
        if let Err(e) = replace_via(&tmp_path, &path, content.as_bytes()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
                }
            }
            return Err(e.into());
        }

        debug!("Saved {} turns to {}", log.len(), path.display());
        Ok(())
    }
}

/// Write `content` to `tmp_path`, flush it to disk and move it onto `path`
async fn replace_via(tmp_path: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp_path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TokenUsage;
    use tempfile::TempDir;

    const DAY: &str = "2026-10-19";

    fn store_in(temp_dir: &TempDir) -> HistoryStore {
        HistoryStore::new(temp_dir.path().join("history"))
    }

    #[tokio::test]
    async fn test_missing_day_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.ensure_dir().await.unwrap();

        let turns = store.load(DAY).await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.ensure_dir().await.unwrap();
        store.ensure_dir().await.unwrap();

        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_keeps_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.ensure_dir().await.unwrap();
        std::fs::write(store.path_for(DAY), "[]").unwrap();

        store.ensure_dir().await.unwrap();

        assert_eq!(std::fs::read_to_string(store.path_for(DAY)).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_save_then_reload_reproduces_turns() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let mut log = store.open_day(DAY).await.unwrap();

        store
            .append(
                &mut log,
                Turn::new("Hello", "Hi there").with_usage(Some(TokenUsage::new(3, 2))),
            )
            .await
            .unwrap();
        store.append(&mut log, Turn::new("A", "B")).await.unwrap();

        let reloaded = store.open_day(DAY).await.unwrap();
        assert_eq!(reloaded, log);
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_artifact_is_pretty_printed_array() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let mut log = store.open_day(DAY).await.unwrap();

        store
            .append(&mut log, Turn::new("Hello", "Hi there"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path_for(DAY)).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"input\": \"Hello\""));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"input": "Hello", "output": "Hi there"}])
        );
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let mut log = store.open_day(DAY).await.unwrap();

        store.append(&mut log, Turn::new("x", "y")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![format!("{}.json", DAY)]);
    }

    #[tokio::test]
    async fn test_malformed_day_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.ensure_dir().await.unwrap();
        std::fs::write(store.path_for(DAY), "{ definitely not an array").unwrap();

        let err = store.load(DAY).await.unwrap_err();
        assert!(matches!(err, Error::History(_)));
        assert!(err.to_string().contains(DAY));
    }

    #[tokio::test]
    async fn test_append_keeps_turn_in_memory_when_write_fails() {
        let temp_dir = TempDir::new().unwrap();
        // never created, so the temp file cannot be opened
        let store = store_in(&temp_dir);
        let mut log = HistoryLog::new(DAY);

        let result = store.append(&mut log, Turn::new("A", "B")).await;

        assert!(result.is_err());
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_replace_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.ensure_dir().await.unwrap();
        // a non-empty directory where the day file belongs makes the rename fail
        let blocker = store.path_for(DAY);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();
        let mut log = HistoryLog::new(DAY);

        let result = store.append(&mut log, Turn::new("A", "B")).await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!store.dir().join(format!(".{}.json.tmp", DAY)).exists());
        assert!(blocker.join("keep").exists());
    }

    #[tokio::test]
    async fn test_append_leaves_earlier_turns_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.ensure_dir().await.unwrap();
        let earlier = serde_json::to_string_pretty(&serde_json::json!([
            {"input": "Hello", "output": "Hi there", "usage": {"tokens": 5}},
            {
                "input": "A",
                "output": "B",
                "usage": {
                    "prompt_tokens": 9,
                    "completion_tokens": 1,
                    "total_tokens": 10,
                    "prompt_tokens_details": {"cached_tokens": 0}
                }
            }
        ]))
        .unwrap();
        std::fs::write(store.path_for(DAY), &earlier).unwrap();

        let mut log = store.open_day(DAY).await.unwrap();
        store.append(&mut log, Turn::new("C", "D")).await.unwrap();

        let raw = std::fs::read_to_string(store.path_for(DAY)).unwrap();
        let prefix = earlier.strip_suffix("\n]").unwrap();
        assert!(raw.starts_with(prefix), "earlier turns rewritten:\n{}", raw);
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["usage"], serde_json::json!({"tokens": 5}));
        assert_eq!(value[2], serde_json::json!({"input": "C", "output": "D"}));
    }

    #[test]
    fn test_date_keys() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(HistoryStore::date_key(date), "2026-01-05");
        let today = HistoryStore::today_key();
        assert!(NaiveDate::parse_from_str(&today, DATE_KEY_FORMAT).is_ok());

        let store = HistoryStore::new("history");
        assert_eq!(store.path_for("2026-01-05"), Path::new("history/2026-01-05.json"));
    }
}
