// SPDX-License-Identifier: Apache-2.0

//! Runtime tuning knobs shared by decoders, encoders and pools.

/// Sizing configuration for codec sessions and the pools that recycle them.
///
/// # Example
/// ```
/// use jaycodec::{Config, Pool};
///
/// let config = Config::default()
///     .with_buffer_size(4096)
///     .with_pool_capacity(64);
/// let pool = Pool::new(config);
/// assert_eq!(pool.config().buffer_size, 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Initial decoder buffer size, and the minimum growth step when a
    /// streaming decoder needs room for more input.
    pub buffer_size: usize,
    /// Initial encoder buffer capacity.
    pub encoder_capacity: usize,
    /// Maximum number of idle decoders and, separately, idle encoders a
    /// [`Pool`](crate::Pool) keeps. Releases beyond this are dropped.
    pub pool_capacity: usize,
}

impl Config {
    pub const DEFAULT_BUFFER_SIZE: usize = 512;
    pub const DEFAULT_ENCODER_CAPACITY: usize = 512;
    pub const DEFAULT_POOL_CAPACITY: usize = 16;

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn with_encoder_capacity(mut self, capacity: usize) -> Self {
        self.encoder_capacity = capacity;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            encoder_capacity: Self::DEFAULT_ENCODER_CAPACITY,
            pool_capacity: Self::DEFAULT_POOL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.encoder_capacity, 512);
        assert_eq!(config.pool_capacity, 16);
    }

    #[test]
    fn test_buffer_size_never_zero() {
        let config = Config::default().with_buffer_size(0);
        assert_eq!(config.buffer_size, 1);
    }
}
