//! TFRecord files of detection examples.
//!
//! # Framing
//!
//! Each record is stored as:
//!
//! ```text
//! u64  length            (little endian)
//! u32  masked_crc(length bytes)
//! [u8] data              (serialized tf.train.Example)
//! u32  masked_crc(data)
//! ```
//!
//! where `masked_crc` is CRC32C rotated right by 15 bits plus
//! `0xa282ead8`. Readers verify both checksums.

pub mod example;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use crate::error::RecordgenError;
use crate::manifest::NormalizedExample;

pub use example::{decode_example, encode_example, Example};

const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC32C of `data`, masked the way TFRecord stores it.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Writes one framed record.
pub fn write_frame<W: Write>(out: &mut W, data: &[u8]) -> io::Result<()> {
    let len = (data.len() as u64).to_le_bytes();
    out.write_all(&len)?;
    out.write_all(&masked_crc32c(&len).to_le_bytes())?;
    out.write_all(data)?;
    out.write_all(&masked_crc32c(data).to_le_bytes())?;
    Ok(())
}

/// Appends detection examples to a TFRecord stream.
///
/// The underlying handle is owned by the writer, so it is closed when the
/// writer is finished or dropped, including on error paths.
pub struct RecordWriter<W: Write = BufWriter<File>> {
    inner: W,
    path: PathBuf,
    written: usize,
}

impl RecordWriter<BufWriter<File>> {
    /// Creates (or truncates) a `.records` file.
    pub fn create(path: &Path) -> Result<Self, RecordgenError> {
        let file = File::create(path).map_err(|source| RecordgenError::RecordWrite {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wraps any writer. `path` is only used in error messages.
    pub fn new(inner: W, path: &Path) -> Self {
        Self {
            inner,
            path: path.to_path_buf(),
            written: 0,
        }
    }

    /// Serializes the example and appends it as one record.
    pub fn write_example(&mut self, example: &NormalizedExample) -> Result<(), RecordgenError> {
        let data = encode_example(example).encode_to_vec();
        self.write_record(&data)
    }

    /// Appends already-serialized bytes as one record.
    pub fn write_record(&mut self, data: &[u8]) -> Result<(), RecordgenError> {
        write_frame(&mut self.inner, data).map_err(|source| self.write_error(source))?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes the stream and returns how many records were written.
    pub fn finish(self) -> Result<usize, RecordgenError> {
        let written = self.written;
        self.into_inner()?;
        Ok(written)
    }

    /// Flushes the stream and hands back the underlying writer.
    pub fn into_inner(mut self) -> Result<W, RecordgenError> {
        self.inner
            .flush()
            .map_err(|source| self.write_error(source))?;
        Ok(self.inner)
    }

    fn write_error(&self, source: io::Error) -> RecordgenError {
        RecordgenError::RecordWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Reads and verifies TFRecord frames.
pub struct RecordReader<R: Read = BufReader<File>> {
    inner: R,
    path: PathBuf,
    offset: u64,
    index: usize,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, RecordgenError> {
        let file = File::open(path).map_err(|source| RecordgenError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wraps any reader. `path` is only used in error messages.
    pub fn new(inner: R, path: &Path) -> Self {
        Self {
            inner,
            path: path.to_path_buf(),
            offset: 0,
            index: 0,
        }
    }

    /// Returns the payload of the next record, or `None` at a clean end of
    /// stream.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>, RecordgenError> {
        let start = self.offset;

        let mut header = [0u8; 12];
        if !self.fill(&mut header, start)? {
            return Ok(None);
        }

        let (len_bytes, len_crc) = header.split_at(8);
        if masked_crc32c(len_bytes) != le_u32(len_crc) {
            return Err(self.corrupt(start, "length checksum mismatch".to_string()));
        }
        let len = u64::from_le_bytes(len_bytes.try_into().unwrap_or_default());

        // Read through `take` so a bogus length cannot force a huge allocation.
        let mut data = Vec::new();
        (&mut self.inner)
            .take(len)
            .read_to_end(&mut data)
            .map_err(RecordgenError::Io)?;
        if data.len() as u64 != len {
            return Err(self.corrupt(
                start,
                format!("truncated payload: expected {len} bytes, found {}", data.len()),
            ));
        }
        self.offset += len;

        let mut footer = [0u8; 4];
        if !self.fill(&mut footer, start)? {
            return Err(self.corrupt(start, "missing payload checksum".to_string()));
        }
        if masked_crc32c(&data) != le_u32(&footer) {
            return Err(self.corrupt(start, "payload checksum mismatch".to_string()));
        }

        self.index += 1;
        Ok(Some(data))
    }

    /// Decodes the next record as a detection example.
    pub fn next_example(&mut self) -> Result<Option<NormalizedExample>, RecordgenError> {
        let Some(data) = self.next_record()? else {
            return Ok(None);
        };
        let index = self.index - 1;

        let example = Example::decode(data.as_slice()).map_err(|source| {
            RecordgenError::RecordDecode {
                path: self.path.clone(),
                index,
                source,
            }
        })?;

        decode_example(&example)
            .map(Some)
            .map_err(|message| RecordgenError::RecordSchema {
                path: self.path.clone(),
                index,
                message,
            })
    }

    /// Fills `buf` completely. Returns `false` if the stream ended before
    /// the first byte; a partial fill is corruption.
    fn fill(&mut self, buf: &mut [u8], record_start: u64) -> Result<bool, RecordgenError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(RecordgenError::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(false);
        }
        if filled < buf.len() {
            return Err(self.corrupt(
                record_start,
                format!("truncated frame: expected {} bytes, found {filled}", buf.len()),
            ));
        }
        self.offset += filled as u64;
        Ok(true)
    }

    fn corrupt(&self, offset: u64, message: String) -> RecordgenError {
        RecordgenError::RecordCorrupt {
            path: self.path.clone(),
            offset,
            message,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<NormalizedExample, RecordgenError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_example().transpose()
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Reads every example of a `.records` file.
pub fn read_records(path: &Path) -> Result<Vec<NormalizedExample>, RecordgenError> {
    RecordReader::open(path)?.collect()
}

/// Reads every example from TFRecord bytes.
///
/// Useful for fuzzing and tests without file I/O.
pub fn from_records_slice(bytes: &[u8]) -> Result<Vec<NormalizedExample>, RecordgenError> {
    RecordReader::new(bytes, Path::new("<bytes>")).collect()
}

/// Serializes examples into TFRecord bytes.
pub fn to_records_vec(examples: &[NormalizedExample]) -> Result<Vec<u8>, RecordgenError> {
    let mut writer = RecordWriter::new(Vec::new(), Path::new("<memory>"));
    for example in examples {
        writer.write_example(example)?;
    }
    writer.into_inner()
}
