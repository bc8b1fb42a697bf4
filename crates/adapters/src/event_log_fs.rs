//! JSON Lines event log on the local filesystem

use async_trait::async_trait;
use postcraft_domain::{EventLog, LogEntry, LogError};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// Append-only log, one JSON object per line
///
/// Appends are serialized by an async mutex shared between clones. Each
/// append opens the file, writes the full line in one call, then flushes and
/// syncs before releasing the lock. A failed write is rolled back to the
/// previous length, and a torn tail left by a crash is closed off with a
/// newline before the next record. Readers take no lock: a line that is still
/// being written has no trailing newline yet and is skipped.
#[derive(Debug, Clone)]
pub struct JsonlEventLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlEventLog {
    pub async fn new(path: PathBuf) -> Result<Self, LogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        Ok(Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse complete lines, skipping blank and malformed ones
fn parse_log(contents: &str, path: &Path) -> Vec<LogEntry> {
    let mut entries = Vec::new();

    for (index, line) in contents.split_inclusive('\n').enumerate() {
        let Some(line) = line.strip_suffix('\n') else {
            tracing::debug!(path = %path.display(), "Ignoring partial trailing line");
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed log line"
                );
            }
        }
    }

    entries
}

/// Whether a non-empty file lacks a trailing newline
async fn ends_mid_line(file: &mut File, len: u64) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

async fn write_synced(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

#[async_trait]
impl EventLog for JsonlEventLog {
    async fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut line =
            serde_json::to_string(entry).map_err(|e| LogError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        // A torn tail from an earlier failed write must not swallow this record
        let len = file.metadata().await?.len();
        if ends_mid_line(&mut file, len).await? {
            tracing::warn!(path = %self.path.display(), "Log ends mid-line, starting a new line");
            line.insert(0, '\n');
        }

        if let Err(e) = write_synced(&mut file, line.as_bytes()).await {
            if let Err(rollback) = file.set_len(len).await {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial log write"
                );
            }
            return Err(e.into());
        }

        tracing::debug!(job_id = %entry.job_id, path = %self.path.display(), "Log entry appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(parse_log(&String::from_utf8_lossy(&bytes), &self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postcraft_domain::{JobStatus, PublishMode, payload_digest};
    use serde_json::Value;
    use tempfile::TempDir;
    use time::macros::datetime;
    use uuid::Uuid;

    fn sample_entry(payload: &str) -> LogEntry {
        LogEntry {
            v: LogEntry::SCHEMA_VERSION,
            job_id: Uuid::new_v4(),
            mode: PublishMode::Schedule,
            dry_run: true,
            status: JobStatus::Executed,
            created_at: datetime!(2025-01-31 12:00 UTC),
            scheduled_at: Some(datetime!(2025-01-31 14:30 UTC)),
            executed_at: datetime!(2025-01-31 14:30:01 UTC),
            preview_url: Some("https://preview.postcraft.invalid/p/abc".to_string()),
            payload_digest: payload_digest(payload),
            payload: Some(payload.to_string()),
            attachments: vec!["media/1.png".to_string()],
        }
    }

    #[tokio::test]
    async fn writes_one_json_object_per_line() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("log.jsonl");
        let log = JsonlEventLog::new(path.clone()).await.expect("log");

        log.append(&sample_entry("first")).await.expect("append");
        log.append(&sample_entry("second")).await.expect("append");

        let contents = tokio::fs::read_to_string(&path).await.expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(contents.ends_with('\n'));

        let value: Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(value["v"], 1);
        assert_eq!(value["mode"], "schedule");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["status"], "executed");
        assert_eq!(value["scheduled_at"], "2025-01-31T14:30:00Z");
        assert_eq!(value["executed_at"], "2025-01-31T14:30:01Z");
        assert_eq!(value["payload"], "first");
        assert_eq!(value["attachments"][0], "media/1.png");
    }

    #[tokio::test]
    async fn replays_in_append_order() {
        let dir = TempDir::new().expect("temp dir");
        let log = JsonlEventLog::new(dir.path().join("log.jsonl"))
            .await
            .expect("log");

        let entries: Vec<LogEntry> = (0..5).map(|i| sample_entry(&format!("p{}", i))).collect();
        for entry in &entries {
            log.append(entry).await.expect("append");
        }

        assert_eq!(log.read_all().await.expect("read"), entries);
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let log = JsonlEventLog::new(dir.path().join("absent.jsonl"))
            .await
            .expect("log");
        assert!(log.read_all().await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn skips_partial_and_malformed_lines() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log.jsonl");
        let log = JsonlEventLog::new(path.clone()).await.expect("log");

        let good = sample_entry("kept");
        log.append(&good).await.expect("append");

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .expect("open");
        file.write_all(b"{not json}\n\n").await.expect("write");
        file.write_all(b"{\"v\":1,\"job_id\":\"").await.expect("write");
        file.flush().await.expect("flush");

        let entries = log.read_all().await.expect("read");
        assert_eq!(entries, vec![good]);
    }

    #[tokio::test]
    async fn append_after_torn_tail_is_still_readable() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log.jsonl");
        let log = JsonlEventLog::new(path.clone()).await.expect("log");

        let first = sample_entry("before the crash");
        log.append(&first).await.expect("append");
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .expect("open");
        file.write_all(b"{\"v\":1,\"job_id\":\"").await.expect("write");
        file.flush().await.expect("flush");

        let second = sample_entry("after the crash");
        log.append(&second).await.expect("append");

        assert_eq!(log.read_all().await.expect("read"), vec![first, second]);
        let contents = tokio::fs::read_to_string(&path).await.expect("read log");
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.ends_with('\n'));
    }

    #[tokio::test]
    async fn torn_tail_alone_is_recovered_on_first_append() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log.jsonl");
        tokio::fs::write(&path, b"{\"v\":1").await.expect("write");

        let log = JsonlEventLog::new(path).await.expect("log");
        assert!(log.read_all().await.expect("read").is_empty());

        let entry = sample_entry("recovered");
        log.append(&entry).await.expect("append");
        assert_eq!(log.read_all().await.expect("read"), vec![entry]);
    }

    #[tokio::test]
    async fn tolerates_unknown_fields_and_missing_optionals() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log.jsonl");
        let job_id = Uuid::new_v4();
        let line = format!(
            "{{\"job_id\":\"{}\",\"mode\":\"now\",\"dry_run\":true,\"status\":\"executed\",\
             \"created_at\":\"2025-01-31T12:00:00Z\",\"executed_at\":\"2025-01-31T12:00:00Z\",\
             \"payload_digest\":\"abc\",\"future_field\":42}}\n",
            job_id
        );
        tokio::fs::write(&path, line).await.expect("write");

        let log = JsonlEventLog::new(path).await.expect("log");
        let entries = log.read_all().await.expect("read");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job_id, job_id);
        assert_eq!(entries[0].v, LogEntry::SCHEMA_VERSION);
        assert_eq!(entries[0].payload, None);
        assert!(entries[0].attachments.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().expect("temp dir");
        let log = JsonlEventLog::new(dir.path().join("log.jsonl"))
            .await
            .expect("log");

        let long_payload = "x".repeat(4096);
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let log = log.clone();
            let entry = sample_entry(&long_payload);
            tasks.push(tokio::spawn(async move { log.append(&entry).await }));
        }
        for task in tasks {
            task.await.expect("join").expect("append");
        }

        let contents = tokio::fs::read_to_string(log.path()).await.expect("read");
        assert_eq!(contents.lines().count(), 32);
        assert_eq!(log.read_all().await.expect("read").len(), 32);
    }
}
