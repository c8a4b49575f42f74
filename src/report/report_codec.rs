//! Fixed-layout report encoding
//!
//! A report is the tight (`abi.encodePacked`) packing of its fields followed
//! by runs of zero nibbles spliced in at fixed character offsets of the
//! `0x`-prefixed hex string. The verifier reads those offsets as reserved
//! header regions, so they are part of the wire format:
//!
//! | layout              | packed                         | zero nibbles       |
//! |---------------------|--------------------------------|--------------------|
//! | `Short`             | `(int192, bytes32)`            | 16 @ 3             |
//! | `TimestampedIndex`  | `(int192, uint8, uint256)`     | 16 @ 3, then 62 @ 46 |
//! | `TimestampedLegacy` | `(int192, bytes32, uint256)`   | 16 @ 3             |
//!
//! The second offset applies to the already patched string.

use std::fmt;

use alloy_primitives::aliases::I192;
use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::{sol_data, SolType};

use super::report_errors::{ReportError, ReportResult};

/// Length of the `0x` prefix the character offsets are counted from
const HEX_PREFIX_LEN: usize = 2;

/// Header padding applied to every layout
const HEADER_PAD_OFFSET: usize = 3;
const HEADER_PAD_NIBBLES: usize = 16;

/// Extra padding for the timestamped small-index layout
const INDEX_PAD_OFFSET: usize = 46;
const INDEX_PAD_NIBBLES: usize = 62;

type ShortPacking = (sol_data::Int<192>, sol_data::FixedBytes<32>);
type IndexPacking = (sol_data::Int<192>, sol_data::Uint<8>, sol_data::Uint<256>);
type LegacyPacking = (sol_data::Int<192>, sol_data::FixedBytes<32>, sol_data::Uint<256>);

/// Asset the report prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedId {
    /// Small registry index
    Index(u8),
    /// Full 32-byte feed identifier
    Id(B256),
}

impl FeedId {
    /// Index feed, rejecting values that do not fit in a `uint8`
    pub fn index(index: u64) -> ReportResult<Self> {
        u8::try_from(index).map(FeedId::Index).map_err(|_| {
            ReportError::malformed("feed_id", format!("index {} exceeds uint8", index))
        })
    }

    /// Identifier as a bytes32 word, widening indexes with left zero padding
    pub fn as_word(&self) -> B256 {
        match *self {
            FeedId::Index(index) => B256::with_last_byte(index),
            FeedId::Id(id) => id,
        }
    }
}

impl From<u8> for FeedId {
    fn from(index: u8) -> Self {
        FeedId::Index(index)
    }
}

impl From<B256> for FeedId {
    fn from(id: B256) -> Self {
        FeedId::Id(id)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedId::Index(index) => write!(f, "#{}", index),
            FeedId::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLayout {
    Short,
    TimestampedIndex,
    TimestampedLegacy,
}

/// A validated report, ready to encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    price: I192,
    feed: FeedId,
    timestamp: Option<U256>,
}

impl Report {
    /// Build a report from a price already scaled by 1e18, e.g.
    /// `"2310000000000000000000"` for 2310.
    pub fn new(price: &str, feed: FeedId, timestamp: Option<U256>) -> ReportResult<Self> {
        Ok(Self {
            price: parse_price(price)?,
            feed,
            timestamp,
        })
    }

    pub fn price(&self) -> I192 {
        self.price
    }

    pub fn feed(&self) -> FeedId {
        self.feed
    }

    pub fn timestamp(&self) -> Option<U256> {
        self.timestamp
    }

    pub fn layout(&self) -> ReportLayout {
        match (self.feed, self.timestamp) {
            (_, None) => ReportLayout::Short,
            (FeedId::Index(_), Some(_)) => ReportLayout::TimestampedIndex,
            (FeedId::Id(_), Some(_)) => ReportLayout::TimestampedLegacy,
        }
    }

    /// Tightly packed fields, before any padding
    pub fn packed(&self) -> Vec<u8> {
        match (self.feed, self.timestamp) {
            (feed, None) => ShortPacking::abi_encode_packed(&(self.price, feed.as_word())),
            (FeedId::Index(index), Some(ts)) => {
                IndexPacking::abi_encode_packed(&(self.price, index, ts))
            }
            (FeedId::Id(id), Some(ts)) => LegacyPacking::abi_encode_packed(&(self.price, id, ts)),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut nibbles = to_nibbles(&self.packed());
        insert_zero_nibbles(&mut nibbles, HEADER_PAD_OFFSET, HEADER_PAD_NIBBLES);
        if self.layout() == ReportLayout::TimestampedIndex {
            insert_zero_nibbles(&mut nibbles, INDEX_PAD_OFFSET, INDEX_PAD_NIBBLES);
        }
        Bytes::from(from_nibbles(&nibbles))
    }
}

/// Encode a report in one step
pub fn encode_report(price: &str, feed: FeedId, timestamp: Option<U256>) -> ReportResult<Bytes> {
    Report::new(price, feed, timestamp).map(|report| report.encode())
}

fn parse_price(price: &str) -> ReportResult<I192> {
    let trimmed = price.trim();
    if trimmed.is_empty() {
        return Err(ReportError::malformed("price", "empty price"));
    }
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::malformed(
            "price",
            format!("'{}' is not a scaled decimal integer", price),
        ));
    }
    I192::from_dec_str(trimmed)
        .map_err(|e| ReportError::malformed("price", format!("'{}' does not fit int192: {}", price, e)))
}

fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

fn from_nibbles(nibbles: &[u8]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Splice `count` zero nibbles at character `offset` of the `0x`-prefixed
/// hex rendering
fn insert_zero_nibbles(nibbles: &mut Vec<u8>, offset: usize, count: usize) {
    let at = offset.saturating_sub(HEX_PREFIX_LEN).min(nibbles.len());
    nibbles.splice(at..at, std::iter::repeat(0u8).take(count));
}
