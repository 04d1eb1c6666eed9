//! Reverse line reading in fixed-size blocks.
//!
//! Reads a text file from its end toward its start without loading the
//! whole file, yielding lines last-first. After each yielded line the
//! reader exposes the byte offset of that line's start in the forward
//! file, which a caller can seek to for a forward read.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Default backward read block, in bytes.
pub const DEFAULT_BLOCK_SIZE: u64 = 8192;

/// Lazy, finite, non-restartable reverse line iterator.
///
/// Invariant: `buf` holds the contiguous byte span
/// `[buf_start, buf_start + buf.len())` of the file, sitting directly
/// below everything already yielded. Bytes below `buf_start` have not
/// been read yet.
pub struct ReverseLineReader {
    file: File,
    block_size: u64,
    buf: Vec<u8>,
    buf_start: u64,
    /// Offset of the first byte of the most recently yielded line.
    line_offset: u64,
    started: bool,
    finished: bool,
}

impl ReverseLineReader {
    /// Open `path` for reverse reading with the default block size.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::with_block_size(path, DEFAULT_BLOCK_SIZE)
    }

    /// Open with an explicit block size. Small blocks exercise the
    /// fragment-stitching path; anything below 1 is treated as 1.
    pub fn with_block_size(path: impl AsRef<Path>, block_size: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            block_size: block_size.max(1),
            buf: Vec::new(),
            buf_start: len,
            line_offset: len,
            started: false,
            finished: false,
        })
    }

    /// Byte offset of the start of the most recently yielded line.
    ///
    /// Seeking a forward reader to this offset resumes exactly at that
    /// line. Meaningless before the first yield.
    pub fn offset(&self) -> u64 {
        self.line_offset
    }

    /// Pull the previous block into the front of the buffer.
    /// Returns false when the file start has already been reached.
    fn refill(&mut self) -> io::Result<bool> {
        if self.buf_start == 0 {
            return Ok(false);
        }
        let new_start = self.buf_start.saturating_sub(self.block_size);
        let mut block = vec![0u8; (self.buf_start - new_start) as usize];
        self.file.seek(SeekFrom::Start(new_start))?;
        self.file.read_exact(&mut block)?;
        block.extend_from_slice(&self.buf);
        self.buf = block;
        self.buf_start = new_start;
        Ok(true)
    }

    /// Decode a raw line span: strip one trailing `\r`, replace invalid
    /// UTF-8 rather than failing. Parsing is the caller's responsibility.
    fn decode(mut bytes: Vec<u8>) -> String {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Iterator for ReverseLineReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            match self.refill() {
                Ok(true) => {}
                Ok(false) => {
                    // Empty file.
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
            // A single trailing separator does not delimit an empty
            // final line.
            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
            }
        }

        loop {
            if let Some(i) = self.buf.iter().rposition(|&b| b == b'\n') {
                let line = self.buf.split_off(i + 1);
                self.buf.pop(); // the separator itself
                self.line_offset = self.buf_start + i as u64 + 1;
                return Some(Ok(Self::decode(line)));
            }

            if self.buf_start == 0 {
                // Whole remaining buffer is the first (chronologically)
                // line, newline-terminated or not.
                let line = std::mem::take(&mut self.buf);
                self.line_offset = 0;
                self.finished = true;
                return Some(Ok(Self::decode(line)));
            }

            if let Err(e) = self.refill() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
