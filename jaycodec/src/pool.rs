// SPDX-License-Identifier: Apache-2.0

//! Lock-free free-lists of decoder and encoder storage.
//!
//! Borrowing pops previously used buffers off a bounded
//! [`ArrayQueue`](crossbeam_queue::ArrayQueue), or allocates when the queue
//! is empty. Releasing resets the storage and pushes it back; when the
//! queue is full the storage is dropped. The released session is poisoned
//! and panics on any further use. Sessions remember the pool they were
//! borrowed from, so their own `release` returns storage there.

use std::io::{Read, Write};
use std::sync::OnceLock;

use crossbeam_queue::ArrayQueue;
use log::debug;

use crate::config::Config;
use crate::decoder::{Decoder, DecoderStorage};
use crate::encoder::Encoder;

/// A bounded pool of reusable decoder and encoder storage.
///
/// # Example
/// ```
/// use jaycodec::{Config, Pool};
///
/// let pool = Pool::new(Config::default().with_pool_capacity(2));
/// let mut dec = pool.borrow_decoder_slice(b"[1, 2]");
/// let mut sum = 0i64;
/// dec.array(&mut jaycodec::ArrayFn::new(|d: &mut jaycodec::Decoder<'_>| {
///     sum += d.i64()?;
///     Ok(())
/// }))
/// .unwrap();
/// pool.release_decoder(&mut dec);
/// assert_eq!(sum, 3);
/// assert_eq!(pool.idle_decoders(), 1);
/// ```
#[derive(Debug)]
pub struct Pool {
    decoders: ArrayQueue<DecoderStorage>,
    encoders: ArrayQueue<Vec<u8>>,
    config: Config,
}

impl Pool {
    pub fn new(config: Config) -> Self {
        Self {
            decoders: ArrayQueue::new(config.pool_capacity.max(1)),
            encoders: ArrayQueue::new(config.pool_capacity.max(1)),
            config,
        }
    }

    /// The process-wide pool used by [`Decoder::release`], [`Encoder::release`]
    /// and the whole-buffer entry points.
    pub fn global() -> &'static Pool {
        static GLOBAL: OnceLock<Pool> = OnceLock::new();
        GLOBAL.get_or_init(|| Pool::new(Config::default()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn take_decoder_storage(&self) -> DecoderStorage {
        self.decoders.pop().unwrap_or_else(|| {
            debug!("decoder pool empty, allocating");
            DecoderStorage::with_capacity(self.config.buffer_size)
        })
    }

    /// Borrow a decoder pulling from `source`.
    pub fn borrow_decoder<'r, R: Read + 'r>(&'r self, source: R) -> Decoder<'r> {
        let mut dec = Decoder::from_storage(self.take_decoder_storage(), self.config.buffer_size);
        dec.input.attach_source(Box::new(source));
        dec.home = Some(self);
        dec
    }

    /// Borrow a decoder over a complete document. The bytes are copied into
    /// the pooled buffer.
    pub fn borrow_decoder_slice(&self, data: &[u8]) -> Decoder<'_> {
        let mut dec = Decoder::from_storage(self.take_decoder_storage(), self.config.buffer_size);
        dec.input.load_slice(data);
        dec.home = Some(self);
        dec
    }

    fn take_encoder_buffer(&self) -> Vec<u8> {
        self.encoders.pop().unwrap_or_else(|| {
            debug!("encoder pool empty, allocating");
            Vec::with_capacity(self.config.encoder_capacity)
        })
    }

    /// Borrow an encoder bound to `sink`.
    pub fn borrow_encoder<'w, W: Write + 'w>(&'w self, sink: W) -> Encoder<'w> {
        let mut enc = Encoder::from_storage(self.take_encoder_buffer(), Some(Box::new(sink)));
        enc.home = Some(self);
        enc
    }

    /// Borrow an encoder that only writes into its buffer.
    pub fn borrow_buffer_encoder(&self) -> Encoder<'_> {
        let mut enc = Encoder::from_storage(self.take_encoder_buffer(), None);
        enc.home = Some(self);
        enc
    }

    /// Return a decoder's storage. Panics if it was already released.
    pub fn release_decoder(&self, dec: &mut Decoder<'_>) {
        let storage = dec.take_storage();
        if self.decoders.push(storage).is_err() {
            debug!("decoder pool full, dropping storage");
        }
    }

    /// Return an encoder's buffer. Panics if it was already released.
    pub fn release_encoder(&self, enc: &mut Encoder<'_>) {
        let buf = enc.take_storage();
        if self.encoders.push(buf).is_err() {
            debug!("encoder pool full, dropping buffer");
        }
    }

    pub fn idle_decoders(&self) -> usize {
        self.decoders.len()
    }

    pub fn idle_encoders(&self) -> usize {
        self.encoders.len()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
