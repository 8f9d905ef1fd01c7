//! Append-only sample store.
//!
//! Every emitted sample is written as one JSON line, so the file order is the
//! insertion order. Records are never updated or deleted.

use motor_core::SensorSample;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct SampleStore {
    path: PathBuf,
    writer: BufWriter<File>,
    appended: u64,
}

impl SampleStore {
    /// Open the store at `path`, creating it and its parent directories if
    /// needed. Existing records are kept.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(8192, file),
            appended: 0,
        })
    }

    pub fn append(&mut self, sample: &SensorSample) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, sample)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.appended += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples appended through this handle.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Read every record back in insertion order.
    pub fn read_all(path: &Path) -> io::Result<Vec<SensorSample>> {
        let reader = BufReader::new(File::open(path)?);
        let mut samples = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample = serde_json::from_str(&line)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            samples.push(sample);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motor_core::MotorSimulator;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn store_appends_jsonl_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("samples.jsonl");

        let mut sim = MotorSimulator::seeded(42);
        let mut written = Vec::new();
        {
            let mut store = SampleStore::open(&path).unwrap();
            for _ in 0..60 {
                let sample = sim.step(chrono::Utc::now()).sample;
                store.append(&sample).unwrap();
                written.push(sample);
            }
            assert_eq!(store.appended(), 60);
        }

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.trim().split('\n').count(), 60);

        assert_eq!(SampleStore::read_all(&path).unwrap(), written);
    }

    #[test]
    fn reopening_keeps_existing_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.jsonl");
        let mut sim = MotorSimulator::seeded(1);

        let first = sim.step(chrono::Utc::now()).sample;
        SampleStore::open(&path).unwrap().append(&first).unwrap();
        let second = sim.step(chrono::Utc::now()).sample;
        SampleStore::open(&path).unwrap().append(&second).unwrap();

        assert_eq!(SampleStore::read_all(&path).unwrap(), vec![first, second]);
    }

    #[test]
    fn corrupt_line_is_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.jsonl");
        std::fs::write(&path, "{\"timestamp\":\n").unwrap();
        let err = SampleStore::read_all(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
