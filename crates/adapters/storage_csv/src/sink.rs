use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use knxhub_app::ports::StateChangeSink;
use knxhub_domain::device::DeviceId;
use knxhub_domain::error::HubError;
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::StateChange;

use crate::error::CsvError;

const DELIMITER: u8 = b';';

/// Appends every state change to a `;`-delimited file.
///
/// The file is opened, written and closed for each row so that an external
/// rotation never leaves the sink writing to a stale handle.
pub struct CsvStateChangeSink {
    path: PathBuf,
    // serialises appends so rows never interleave
    lock: Mutex<()>,
}

impl CsvStateChangeSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row back, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError`] when the file cannot be read or a row does not
    /// describe a known state change.
    pub async fn read_all(&self) -> Result<Vec<HistoryEntry>, CsvError> {
        let content = {
            let _guard = self.lock.lock().await;
            match tokio::fs::read(&self.path).await {
                Ok(content) => content,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => return Err(err.into()),
            }
        };
        parse_rows(&content)
    }

    async fn append_row(&self, entry: &HistoryEntry) -> Result<(), CsvError> {
        let row = encode_row(entry)?;
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&row).await?;
        file.flush().await?;
        Ok(())
    }
}

impl StateChangeSink for CsvStateChangeSink {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), HubError> {
        self.append_row(entry).await?;
        Ok(())
    }
}

fn encode_row(entry: &HistoryEntry) -> Result<Vec<u8>, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::CRLF)
        .has_headers(false)
        .from_writer(Vec::new());
    let timestamp = entry.timestamp_millis.to_string();
    let value = entry.change.value_text();
    writer.write_record([
        entry.device_id.as_str(),
        timestamp.as_str(),
        entry.change.field_name(),
        value.as_str(),
    ])?;
    writer
        .into_inner()
        .map_err(|err| CsvError::Io(err.into_error()))
}

fn parse_rows(content: &[u8]) -> Result<Vec<HistoryEntry>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::CRLF)
        .has_headers(false)
        .from_reader(content);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let malformed = || CsvError::Malformed { line };
        let (Some(device_id), Some(timestamp), Some(field), Some(value)) =
            (record.get(0), record.get(1), record.get(2), record.get(3))
        else {
            return Err(malformed());
        };
        let device_id = DeviceId::new(device_id).map_err(|_| malformed())?;
        let timestamp_millis: i64 = timestamp.parse().map_err(|_| malformed())?;
        let change = StateChange::from_persisted(field, value).ok_or_else(malformed)?;
        entries.push(HistoryEntry::new(device_id, timestamp_millis, change));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knxhub_domain::state::PowerState;

    fn temp_file() -> PathBuf {
        std::env::temp_dir().join(format!("knxhub-history-{}.csv", uuid::Uuid::new_v4()))
    }

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    #[tokio::test]
    async fn should_write_semicolon_rows_with_crlf() {
        let path = temp_file();
        let sink = CsvStateChangeSink::new(&path);

        sink.append(&HistoryEntry::new(
            id("lamp"),
            1_767_225_600_000,
            StateChange::PowerState(PowerState::On),
        ))
        .await
        .unwrap();
        sink.append(&HistoryEntry::new(
            id("heating"),
            1_767_225_600_001,
            StateChange::TargetTemperature(21.5),
        ))
        .await
        .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "lamp;1767225600000;powerState;1\r\nheating;1767225600001;targetTemperature;21.5\r\n"
        );
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn should_read_back_appended_rows() {
        let path = temp_file();
        let sink = CsvStateChangeSink::new(&path);
        let entries = [
            HistoryEntry::new(id("d1"), 10, StateChange::Percentage(50)),
            HistoryEntry::new(id("d1"), 11, StateChange::Locked(true)),
            HistoryEntry::new(id("weather"), 12, StateChange::Rainfall(false)),
        ];
        for entry in &entries {
            sink.append(entry).await.unwrap();
        }

        let stored = sink.read_all().await.unwrap();

        assert_eq!(stored, entries);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn should_read_nothing_when_file_absent() {
        let sink = CsvStateChangeSink::new(temp_file());
        assert!(sink.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_flag_malformed_rows() {
        let path = temp_file();
        tokio::fs::write(&path, "lamp;12;colour;blue\r\n").await.unwrap();

        let result = CsvStateChangeSink::new(&path).read_all().await;

        assert!(matches!(result, Err(CsvError::Malformed { line: 1 })));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn should_report_storage_error_when_directory_missing() {
        let sink = CsvStateChangeSink::new(temp_file().join("nested").join("history.csv"));

        let result = sink
            .append(&HistoryEntry::new(id("lamp"), 1, StateChange::Locked(false)))
            .await;

        assert!(matches!(result, Err(HubError::Storage(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_not_interleave_concurrent_appends() {
        let path = temp_file();
        let sink = std::sync::Arc::new(CsvStateChangeSink::new(&path));
        let mut tasks = Vec::new();
        for n in 0..16_i64 {
            let sink = std::sync::Arc::clone(&sink);
            tasks.push(tokio::spawn(async move {
                sink.append(&HistoryEntry::new(id("d"), n, StateChange::Percentage(7)))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(sink.read_all().await.unwrap().len(), 16);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
