//! Arena configuration parameters.

use crate::error::ArenaError;

/// Largest alignment any allocation may request, in bytes.
///
/// Every block is allocated at this alignment, so an offset aligned
/// to `align <= MAX_ALIGN` inside a block is also an aligned address.
pub const MAX_ALIGN: usize = 16;

/// Configuration for a [`ScratchAllocator`](crate::ScratchAllocator).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Minimum size of each growth block in bytes.
    ///
    /// Requests larger than this get a dedicated block sized to fit.
    /// Default: 64 KiB. Must be at least [`ArenaConfig::MIN_BLOCK_SIZE`].
    pub block_size: usize,

    /// Upper bound on the total bytes reserved across all blocks.
    ///
    /// `None` (the default) means unbounded. With a bound, a request that
    /// would need a block beyond it fails with
    /// [`ArenaError::CapacityExceeded`] instead of growing.
    pub max_bytes: Option<usize>,
}

impl ArenaConfig {
    /// Default block size: 64 KiB.
    pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

    /// Smallest accepted block size.
    pub const MIN_BLOCK_SIZE: usize = 256;

    /// A config with a fixed total budget in bytes.
    pub fn bounded(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
            ..Self::default()
        }
    }

    /// Check the invariants documented on each field.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.block_size < Self::MIN_BLOCK_SIZE {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "block_size {} is below the minimum of {}",
                    self.block_size,
                    Self::MIN_BLOCK_SIZE
                ),
            });
        }
        if let Some(max) = self.max_bytes {
            if max < Self::MIN_BLOCK_SIZE {
                return Err(ArenaError::InvalidConfig {
                    reason: format!(
                        "max_bytes {max} is below the minimum block size of {}",
                        Self::MIN_BLOCK_SIZE
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            max_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ArenaConfig::default().validate().is_ok());
        assert_eq!(ArenaConfig::default().block_size, 64 * 1024);
    }

    #[test]
    fn tiny_block_size_rejected() {
        let config = ArenaConfig {
            block_size: 16,
            max_bytes: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn tiny_budget_rejected() {
        assert!(ArenaConfig::bounded(8).validate().is_err());
        assert!(ArenaConfig::bounded(4096).validate().is_ok());
    }
}
