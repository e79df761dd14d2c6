use crate::error::FlowResult;
use crate::flow_log;
use crate::logger::LogLevel;
use crate::pipeline::{Consumer, ItemStream};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Result of a JSON lines drain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonLinesSummary {
    pub path: PathBuf,
    pub items_written: u64,
}

/// Writes every item as one line of JSON
///
/// The file is created (or truncated) when the drain starts; parent
/// directories are created as needed. If the stream fails, the lines written
/// so far stay in the file.
#[derive(Debug, Clone)]
pub struct JsonLinesConsumer {
    path: PathBuf,
    written: u64,
}

impl JsonLinesConsumer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize> Consumer<T> for JsonLinesConsumer {
    type Output = JsonLinesSummary;

    fn reset(&mut self) {
        self.written = 0;
    }

    fn consume(&mut self, items: ItemStream<'_, T>) -> FlowResult<JsonLinesSummary> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        for item in items {
            let item = item?;
            serde_json::to_writer(&mut writer, &item)?;
            writer.write_all(b"\n")?;
            self.written += 1;
        }
        writer.flush()?;

        flow_log!(
            LogLevel::Debug,
            "consumer",
            "Wrote {} items to {}",
            self.written,
            self.path.display()
        );

        Ok(JsonLinesSummary {
            path: self.path.clone(),
            items_written: self.written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use tempfile::TempDir;

    #[test]
    fn test_writes_one_line_per_item() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("numbers.jsonl");
        let mut consumer = JsonLinesConsumer::new(&path);

        let items: ItemStream<'static, i32> = Box::new(vec![1, 2, 3].into_iter().map(Ok));
        let summary = consumer.consume(items).unwrap();

        assert_eq!(summary.items_written, 3);
        assert_eq!(summary.path, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn test_partial_output_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.jsonl");
        let mut consumer = JsonLinesConsumer::new(&path);

        let items: ItemStream<'static, &str> = Box::new(
            vec![Ok("a"), Err(FlowError::Source("lost".to_string())), Ok("c")].into_iter(),
        );
        let result = consumer.consume(items);

        assert!(matches!(result, Err(FlowError::Source(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "\"a\"\n");
    }
}
