//! Blast-radius sizing for candidate blocks.
//!
//! Everything here is a pure function of the address count, so the bands
//! and estimates are deterministic and directly unit-testable.

use serde::{Deserialize, Serialize};

use crate::net::NetworkRange;

/// Lower bound of the estimated-users range, per address.
const USERS_PER_ADDRESS_MIN: u128 = 2;
/// Upper bound of the estimated-users range, per address.
const USERS_PER_ADDRESS_MAX: u128 = 50;

// ---------------------------------------------------------------------------
// Scope band
// ---------------------------------------------------------------------------

/// Size classification for a block, ordered by scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeBand {
    SingleHost,
    Small,
    Moderate,
    Significant,
    Major,
    Massive,
    Catastrophic,
}

impl ScopeBand {
    pub fn for_count(count: u128) -> Self {
        match count {
            0 | 1 => ScopeBand::SingleHost,
            2..=16 => ScopeBand::Small,
            17..=256 => ScopeBand::Moderate,
            257..=4096 => ScopeBand::Significant,
            4097..=65_536 => ScopeBand::Major,
            65_537..=1_048_576 => ScopeBand::Massive,
            _ => ScopeBand::Catastrophic,
        }
    }

    /// Risk contribution for this band. Strictly increasing with scale.
    pub fn risk_score(&self) -> f64 {
        match self {
            ScopeBand::SingleHost => 0.1,
            ScopeBand::Small => 0.2,
            ScopeBand::Moderate => 0.5,
            ScopeBand::Significant => 0.6,
            ScopeBand::Major => 0.7,
            ScopeBand::Massive => 0.8,
            ScopeBand::Catastrophic => 0.95,
        }
    }

    fn scope_description(&self, count: u128) -> String {
        match self {
            ScopeBand::SingleHost => "single address, minimal impact".to_string(),
            ScopeBand::Small => format!("small group of {count} addresses"),
            ScopeBand::Moderate => {
                format!("small business or subnet network ({count} addresses)")
            }
            ScopeBand::Significant => {
                format!("medium business or local provider network ({count} addresses)")
            }
            ScopeBand::Major => {
                format!("regional ISP or large organization network ({count} addresses)")
            }
            ScopeBand::Massive => {
                format!("large provider block ({count} addresses) spanning major services")
            }
            ScopeBand::Catastrophic => format!(
                "entire /8-scale network ({count} addresses) covering major providers or whole regions"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Blast radius
// ---------------------------------------------------------------------------

/// Human-scale impact assessment for blocking a range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastRadius {
    pub band: ScopeBand,
    pub address_count: u128,
    pub scope_description: String,
    pub estimated_users_min: u128,
    pub estimated_users_max: u128,
    pub economic_impact: String,
    pub recovery_time: String,
    pub prefix_class: String,
}

/// Assess the blast radius of blocking `range`.
pub fn assess(range: &NetworkRange) -> BlastRadius {
    let count = range.address_count();
    let band = ScopeBand::for_count(count);
    BlastRadius {
        band,
        address_count: count,
        scope_description: band.scope_description(count),
        estimated_users_min: count.saturating_mul(USERS_PER_ADDRESS_MIN),
        estimated_users_max: count.saturating_mul(USERS_PER_ADDRESS_MAX),
        economic_impact: economic_impact(count).to_string(),
        recovery_time: recovery_time(count).to_string(),
        prefix_class: prefix_class(range).to_string(),
    }
}

fn economic_impact(count: u128) -> &'static str {
    if count >= 1_000_000 {
        "potentially millions in lost revenue and service disruption"
    } else if count >= 100_000 {
        "potentially hundreds of thousands in lost revenue"
    } else if count >= 10_000 {
        "potentially tens of thousands in lost revenue"
    } else if count >= 1_000 {
        "potentially thousands in lost revenue"
    } else {
        "minimal economic impact expected"
    }
}

fn recovery_time(count: u128) -> &'static str {
    if count >= 1_000_000 {
        "days to weeks to identify and resolve issues"
    } else if count >= 100_000 {
        "hours to days to resolve service issues"
    } else if count >= 10_000 {
        "hours to resolve most issues"
    } else if count >= 1_000 {
        "minutes to hours to resolve issues"
    } else {
        "minutes to resolve any issues"
    }
}

fn prefix_class(range: &NetworkRange) -> &'static str {
    let prefix = range.prefix_len();
    if range.is_ipv4() {
        match prefix {
            0..=8 => "massive network block (/8 or larger)",
            9..=12 => "very large network block (/12)",
            13..=16 => "large network block (/16)",
            17..=20 => "medium network block (/20)",
            21..=24 => "small network block (/24)",
            25..=28 => "very small subnet (/28)",
            29..=31 => "tiny subnet",
            _ => "single address (/32)",
        }
    } else {
        match prefix {
            0..=32 => "massive IPv6 network block",
            33..=48 => "large IPv6 network block",
            49..=64 => "medium IPv6 network block",
            65..=96 => "small IPv6 network block",
            97..=120 => "tiny IPv6 subnet",
            _ => "single IPv6 address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        let cases = [
            (1, ScopeBand::SingleHost),
            (2, ScopeBand::Small),
            (16, ScopeBand::Small),
            (17, ScopeBand::Moderate),
            (256, ScopeBand::Moderate),
            (257, ScopeBand::Significant),
            (4096, ScopeBand::Significant),
            (4097, ScopeBand::Major),
            (65_536, ScopeBand::Major),
            (65_537, ScopeBand::Massive),
            (1_048_576, ScopeBand::Massive),
            (1_048_577, ScopeBand::Catastrophic),
            (1u128 << 24, ScopeBand::Catastrophic),
        ];
        for (count, expected) in cases {
            assert_eq!(ScopeBand::for_count(count), expected, "count {count}");
        }
    }

    #[test]
    fn risk_scores_increase_with_scale() {
        let bands = [
            ScopeBand::SingleHost,
            ScopeBand::Small,
            ScopeBand::Moderate,
            ScopeBand::Significant,
            ScopeBand::Major,
            ScopeBand::Massive,
            ScopeBand::Catastrophic,
        ];
        for pair in bands.windows(2) {
            assert!(pair[0].risk_score() < pair[1].risk_score());
        }
    }

    #[test]
    fn slash_eight_is_catastrophic() {
        let range = NetworkRange::parse("10.0.0.0/8").unwrap();
        let radius = assess(&range);
        assert_eq!(radius.band, ScopeBand::Catastrophic);
        assert_eq!(radius.address_count, 1u128 << 24);
        assert_eq!(radius.estimated_users_min, (1u128 << 24) * 2);
        assert_eq!(radius.estimated_users_max, (1u128 << 24) * 50);
        assert!(radius.economic_impact.contains("millions"));
    }

    #[test]
    fn single_host_has_minimal_estimates() {
        let range = NetworkRange::parse("203.0.113.5").unwrap();
        let radius = assess(&range);
        assert_eq!(radius.band, ScopeBand::SingleHost);
        assert_eq!(radius.estimated_users_max, 50);
        assert!(radius.recovery_time.starts_with("minutes"));
        assert_eq!(radius.prefix_class, "single address (/32)");
    }

    #[test]
    fn v6_default_route_saturates_without_overflow() {
        let range = NetworkRange::parse("::/0").unwrap();
        let radius = assess(&range);
        assert_eq!(radius.band, ScopeBand::Catastrophic);
        assert_eq!(radius.estimated_users_max, u128::MAX);
    }
}
