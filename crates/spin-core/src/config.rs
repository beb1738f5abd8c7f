//! Promotion configuration

use serde::{Deserialize, Serialize};

use crate::error::{PromoError, PromoResult};

/// One contiguous block of spin numbers sharing quotas and a base rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSpec {
    /// First spin number in the range (inclusive, 1-based)
    pub start: u32,
    /// Last spin number in the range (inclusive)
    pub end: u32,
    /// Named-prize units allocated to this range
    pub gift_quota: u32,
    /// Grand-prize-contestant slots allocated to this range
    pub contestant_quota: u32,
    /// Advertised flat win rate for this range. The dynamic draw formula
    /// supersedes it; kept as reference metadata.
    pub base_probability: f64,
}

impl RangeSpec {
    /// Number of spins the range spans
    pub fn span(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Does the range contain this spin number?
    pub fn contains(&self, spin_number: u32) -> bool {
        spin_number >= self.start && spin_number <= self.end
    }

    /// Spins left in the range including the current one
    pub fn remaining_slots(&self, spin_number: u32) -> u32 {
        debug_assert!(self.contains(spin_number));
        self.end - spin_number + 1
    }
}

/// Ordered, validated collection of ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeTable {
    ranges: Vec<RangeSpec>,
}

impl RangeTable {
    /// Build a table from raw specs. Order is normalized by `start`.
    pub fn new(mut ranges: Vec<RangeSpec>) -> Self {
        ranges.sort_by_key(|r| r.start);
        Self { ranges }
    }

    /// Locate the range containing a spin number
    pub fn range_for(&self, spin_number: u32) -> Option<&RangeSpec> {
        self.ranges.iter().find(|r| r.contains(spin_number))
    }

    /// All ranges in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &RangeSpec> {
        self.ranges.iter()
    }

    /// Number of ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Static promotion configuration, loaded once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Total spin budget for the promotion
    pub max_spins: u32,
    /// Global ceiling on grand-prize contestants across all ranges
    pub global_contestant_cap: u32,
    /// Range table covering `[1, max_spins]`
    pub ranges: RangeTable,
    /// Named-prize identities, shared by every range
    pub prizes: Vec<String>,
}

impl PromotionConfig {
    /// Load from JSON
    pub fn from_json(json: &str) -> PromoResult<Self> {
        serde_json::from_str(json).map_err(|e| PromoError::Config(e.to_string()))
    }

    /// Export as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Validate structural invariants: ranges contiguous from 1, jointly
    /// covering `[1, max_spins]`, quotas within each span, a non-empty prize
    /// list, and a global cap able to hold every per-range quota.
    pub fn validate(&self) -> PromoResult<()> {
        if self.max_spins == 0 {
            return Err(PromoError::Config("max_spins must be positive".into()));
        }
        if self.prizes.is_empty() {
            return Err(PromoError::Config("prize list is empty".into()));
        }
        if self.ranges.is_empty() {
            return Err(PromoError::Config("range table is empty".into()));
        }

        let mut expected_start = 1u32;
        for range in self.ranges.iter() {
            if range.start != expected_start {
                return Err(PromoError::Config(format!(
                    "range {}-{} does not start at {}",
                    range.start, range.end, expected_start
                )));
            }
            if range.end < range.start {
                return Err(PromoError::Config(format!(
                    "range {}-{} is inverted",
                    range.start, range.end
                )));
            }
            let span = range.span();
            if range.gift_quota + range.contestant_quota > span {
                return Err(PromoError::Config(format!(
                    "range {}-{} quotas exceed its {} spins",
                    range.start, range.end, span
                )));
            }
            let implied = range.gift_quota as f64 / span as f64;
            if (implied - range.base_probability).abs() > implied.max(0.0001) * 0.5 {
                log::warn!(
                    "range {}-{}: base_probability {:.6} drifts from implied rate {:.6}",
                    range.start,
                    range.end,
                    range.base_probability,
                    implied
                );
            }
            expected_start = range.end + 1;
        }

        let covered_end = expected_start - 1;
        if covered_end != self.max_spins {
            return Err(PromoError::Config(format!(
                "ranges cover [1, {}] but max_spins is {}",
                covered_end, self.max_spins
            )));
        }

        let quota_sum: u32 = self.ranges.iter().map(|r| r.contestant_quota).sum();
        if self.global_contestant_cap < quota_sum {
            log::warn!(
                "global contestant cap {} is below the per-range quota sum {}; \
                 later ranges will be starved",
                self.global_contestant_cap,
                quota_sum
            );
        }

        Ok(())
    }
}

impl Default for PromotionConfig {
    /// Production promotion: 256,000 spins across seven ranges, six named
    /// prizes, 16 grand-prize-contestant slots (4 in the launch range, 2 in
    /// each later range).
    fn default() -> Self {
        let ranges = RangeTable::new(vec![
            RangeSpec {
                start: 1,
                end: 100,
                gift_quota: 9,
                contestant_quota: 4,
                base_probability: 0.1,
            },
            RangeSpec {
                start: 101,
                end: 1_000,
                gift_quota: 10,
                contestant_quota: 2,
                base_probability: 0.0111,
            },
            RangeSpec {
                start: 1_001,
                end: 2_000,
                gift_quota: 8,
                contestant_quota: 2,
                base_probability: 0.008,
            },
            RangeSpec {
                start: 2_001,
                end: 5_000,
                gift_quota: 7,
                contestant_quota: 2,
                base_probability: 0.00233,
            },
            RangeSpec {
                start: 5_001,
                end: 10_000,
                gift_quota: 5,
                contestant_quota: 2,
                base_probability: 0.001,
            },
            RangeSpec {
                start: 10_001,
                end: 50_000,
                gift_quota: 5,
                contestant_quota: 2,
                base_probability: 0.000125,
            },
            RangeSpec {
                start: 50_001,
                end: 256_000,
                gift_quota: 5,
                contestant_quota: 2,
                base_probability: 0.0000243,
            },
        ]);

        Self {
            max_spins: 256_000,
            global_contestant_cap: 16,
            ranges,
            prizes: vec![
                "₦100,000".into(),
                "₦50,000".into(),
                "₦20,000".into(),
                "Phone".into(),
                "Artifact Hoodie".into(),
                "Premiere Invite".into(),
            ],
        }
    }
}
