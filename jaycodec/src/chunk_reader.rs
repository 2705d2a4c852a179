// SPDX-License-Identifier: Apache-2.0

//! An [`io::Read`] over a byte slice that hands data out in bounded chunks.
//!
//! Real sources (sockets, pipes, files) rarely deliver a whole document in a
//! single read. [`ChunkReader`] reproduces that on in-memory data so streaming
//! decoders can be exercised at every possible split point.
//!
//! # Examples
//!
//! ```rust
//! use jaycodec::{ChunkReader, Decoder};
//!
//! let json = br#"{"name": "Alice", "age": 30}"#;
//! // At most 3 bytes per read() call.
//! let mut dec = Decoder::new(ChunkReader::new(json, 3));
//! let mut age = 0u32;
//! dec.object(&mut jaycodec::ObjectFn::new(|d: &mut Decoder<'_>, key: &str| {
//!     if key == "age" {
//!         d.decode(&mut age)?;
//!     }
//!     Ok(())
//! }))
//! .unwrap();
//! assert_eq!(age, 30);
//! ```

use std::io;

/// Reads from a byte slice, returning at most `chunk_size` bytes per call.
#[derive(Debug)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    chunk_size: usize,
}

impl<'a> ChunkReader<'a> {
    /// Each `read()` returns at most `chunk_size` bytes (minimum 1).
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// A reader that hands over as much as the destination buffer allows.
    pub fn full_slice(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: usize::MAX,
        }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl io::Read for ChunkReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_copy = self.remaining().min(buf.len()).min(self.chunk_size);
        buf[..to_copy].copy_from_slice(&self.data[self.pos..self.pos + to_copy]);
        self.pos += to_copy;
        Ok(to_copy)
    }
}
