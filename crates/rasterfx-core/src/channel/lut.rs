//! 256-entry lookup tables for per-channel functions.

/// A `u8 -> u8` function evaluated once for every possible input.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelLut {
    table: [u8; 256],
}

impl ChannelLut {
    /// Tabulate `function` over `0..=255`.
    pub fn build(function: impl Fn(u8) -> u8) -> Self {
        let mut table = [0u8; 256];
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = function(value as u8);
        }
        Self { table }
    }

    #[inline]
    pub fn get(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    /// True when the table maps every value to itself.
    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| i == v as usize)
    }

    #[inline]
    pub fn as_array(&self) -> &[u8; 256] {
        &self.table
    }
}

impl std::fmt::Debug for ChannelLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLut")
            .field("identity", &self.is_identity())
            .finish_non_exhaustive()
    }
}
