use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use parking_lot::Mutex;

use crate::{Fact, Observer};

/// An observer that records facts to a file in JSON Lines format.
///
/// Each fact is written as a JSON object on its own line, tagged with a
/// `fact` field naming its variant. Lines are flushed immediately for
/// reliability (not optimized for high-throughput).
///
/// # Example
///
/// ```ignore
/// let recorder = Recorder::new("facts.jsonl")?;
/// let config = TestConfig::default().with_observer(recorder);
/// ```
#[derive(Debug)]
pub struct Recorder {
    writer: Mutex<BufWriter<File>>,
}

impl Recorder {
    /// Create a new recorder that writes to the specified path.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the file cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Observer for Recorder {
    fn notify(&self, fact: &Fact) {
        let mut writer = self.writer.lock();
        if let Err(e) = serde_json::to_writer(&mut *writer, fact) {
            tracing::warn!("Recorder failed to serialize fact: {}", e);
        }
        if let Err(e) = writer.write_all(b"\n").and_then(|()| writer.flush()) {
            tracing::warn!("Recorder failed to write fact: {}", e);
        }
    }
}
