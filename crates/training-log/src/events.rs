use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::{BufMut, BytesMut};
use crc32fast::Hasher as Crc32;
use prost::Message;

use crate::error::Result;

/// Version string TensorBoard expects in the first record of an event file.
const FILE_VERSION: &str = "brain.Event:2";
const CRC_MASK_DELTA: u32 = 0xa282_ead8;

/// Appends scalar summaries to a TensorBoard `events.out.tfevents.*` file.
///
/// The file opens with a version record, followed by one record per scalar.
/// Each record is framed as TFRecord: length, masked crc of the length,
/// payload, masked crc of the payload.
pub struct EventFileWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    flush_every: usize,
    pending: usize,
}

impl EventFileWriter {
    pub fn create(dir: &Path, flush_every: usize) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let opened_at = SystemTime::now();
        let path = dir.join(event_file_name(opened_at));
        let file = File::create(&path)?;
        log::debug!("Writing tensorboard events to {}", path.display());

        let mut writer = Self {
            writer: BufWriter::new(file),
            path,
            flush_every: flush_every.max(1),
            pending: 0,
        };
        writer.append(&Event {
            wall_time: epoch_seconds(opened_at),
            step: 0,
            what: Some(event::What::FileVersion(FILE_VERSION.to_string())),
        })?;
        writer.flush()?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `value` under `tag` at `step`. Values are stored as `f32`.
    pub fn write_scalar(&mut self, tag: &str, step: i64, value: f64) -> Result<()> {
        let summary = Summary {
            value: vec![summary::Value {
                tag: tag.to_string(),
                simple_value: Some(value as f32),
            }],
        };
        self.append(&Event {
            wall_time: epoch_seconds(SystemTime::now()),
            step,
            what: Some(event::What::Summary(summary)),
        })?;

        self.pending += 1;
        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.pending = 0;
        Ok(())
    }

    fn append(&mut self, event: &Event) -> Result<()> {
        let mut payload = BytesMut::with_capacity(event.encoded_len());
        event.encode(&mut payload)?;
        self.writer.write_all(&frame_record(&payload))?;
        Ok(())
    }
}

impl Drop for EventFileWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn frame_record(payload: &[u8]) -> BytesMut {
    let mut record = BytesMut::with_capacity(payload.len() + 16);
    record.put_u64_le(payload.len() as u64);
    let length_crc = masked_crc(&record[..8]);
    record.put_u32_le(length_crc);
    record.put_slice(payload);
    record.put_u32_le(masked_crc(payload));
    record
}

fn masked_crc(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher
        .finalize()
        .rotate_right(15)
        .wrapping_add(CRC_MASK_DELTA)
}

/// `events.out.tfevents.<secs>.<host>.<pid>`; the pid keeps two writers
/// opened within the same second apart.
fn event_file_name(opened_at: SystemTime) -> String {
    let secs = opened_at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("events.out.tfevents.{secs}.{host}.{}", std::process::id())
}

fn epoch_seconds(at: SystemTime) -> f64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Clone, PartialEq, Message)]
struct Event {
    #[prost(double, tag = "1")]
    wall_time: f64,
    #[prost(int64, tag = "2")]
    step: i64,
    #[prost(oneof = "event::What", tags = "3, 5")]
    what: Option<event::What>,
}

mod event {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub(super) enum What {
        #[prost(string, tag = "3")]
        FileVersion(String),
        #[prost(message, tag = "5")]
        Summary(super::Summary),
    }
}

#[derive(Clone, PartialEq, Message)]
struct Summary {
    #[prost(message, repeated, tag = "1")]
    value: Vec<summary::Value>,
}

mod summary {
    #[derive(Clone, PartialEq, prost::Message)]
    pub(super) struct Value {
        #[prost(string, tag = "1")]
        pub tag: String,
        #[prost(float, optional, tag = "2")]
        pub simple_value: Option<f32>,
    }
}
