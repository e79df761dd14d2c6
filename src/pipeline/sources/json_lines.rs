use crate::error::{FlowError, FlowResult};
use crate::pipeline::{ItemStream, Producer};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Reads one JSON value per line from a file
///
/// The file is opened when a traversal starts and read line by line as items
/// are pulled. Blank lines are skipped. A missing file, an unreadable line or a
/// line that does not parse ends the traversal with that error.
pub struct JsonLinesSource<T> {
    path: PathBuf,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonLinesSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _item: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Clone for JsonLinesSource<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T: DeserializeOwned + 'static> Producer for JsonLinesSource<T> {
    type Item = T;

    fn produce_raw(&self) -> ItemStream<'_, T> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                let error = FlowError::Source(format!(
                    "Failed to open {}: {}",
                    self.path.display(),
                    e
                ));
                return Box::new(std::iter::once(Err(error)));
            }
        };

        Box::new(
            BufReader::new(file)
                .lines()
                .enumerate()
                .filter_map(|(index, line)| parse_line::<T>(index + 1, line)),
        )
    }
}

fn parse_line<T: DeserializeOwned>(
    line_number: usize,
    line: std::io::Result<String>,
) -> Option<FlowResult<T>> {
    let line = match line {
        Ok(line) => line,
        Err(e) => return Some(Err(FlowError::Io(e))),
    };
    if line.trim().is_empty() {
        return None;
    }

    Some(serde_json::from_str(&line).map_err(|e| {
        FlowError::Source(format!("Invalid JSON on line {}: {}", line_number, e))
    }))
}
