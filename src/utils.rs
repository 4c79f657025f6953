use crate::error::ConfigError;

/// Largest supported number of set-index bits. Every set is allocated when the
/// cache is built, so this bounds the up-front allocation.
pub const MAX_SET_BITS: u32 = 20;

pub fn calculate_num_sets(set_bits: u32) -> usize {
    1usize << set_bits
}

pub fn calculate_block_size(block_bits: u32) -> u64 {
    1u64 << block_bits
}

pub fn calculate_set_mask(set_bits: u32) -> u64 {
    (1u64 << set_bits) - 1
}

/// Cache geometry resolved from `s`, `E` and `b`.
///
/// A `Geometry` can only be built through [`Geometry::new`], so every value in
/// circulation describes a cache that can actually be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    set_bits: u32,
    associativity: usize,
    block_bits: u32,
}

impl Geometry {
    pub fn new(set_bits: u32, associativity: usize, block_bits: u32) -> Result<Self, ConfigError> {
        if associativity == 0 {
            return Err(ConfigError::ZeroAssociativity);
        }
        if set_bits > MAX_SET_BITS {
            return Err(ConfigError::TooManySets {
                set_bits,
                max: MAX_SET_BITS,
            });
        }
        if u64::from(set_bits) + u64::from(block_bits) > u64::from(u64::BITS) {
            return Err(ConfigError::AddressTooWide {
                set_bits,
                block_bits,
            });
        }
        Ok(Self {
            set_bits,
            associativity,
            block_bits,
        })
    }

    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    pub fn num_sets(&self) -> usize {
        calculate_num_sets(self.set_bits)
    }

    pub fn block_size(&self) -> u64 {
        calculate_block_size(self.block_bits)
    }

    /// `(address / block_size) mod num_sets`.
    pub fn set_index(&self, address: u64) -> usize {
        // block_bits may be 64 when set_bits is 0
        let block = address.checked_shr(self.block_bits).unwrap_or(0);
        (block & calculate_set_mask(self.set_bits)) as usize
    }

    /// Address bits above the set index and block offset.
    pub fn tag(&self, address: u64) -> u64 {
        address
            .checked_shr(self.set_bits + self.block_bits)
            .unwrap_or(0)
    }

    pub fn decode(&self, address: u64) -> (usize, u64) {
        (self.set_index(address), self.tag(address))
    }
}
