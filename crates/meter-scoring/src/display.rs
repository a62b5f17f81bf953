// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Conversion from a stored raw score to what the dashboard renders.

use crate::sentinel::Sentinel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayScore {
    NotAvailable,
    Value(f64),
}

impl DisplayScore {
    pub fn value(self) -> Option<f64> {
        match self {
            DisplayScore::Value(v) => Some(v),
            DisplayScore::NotAvailable => None,
        }
    }
}

/// `note` carries the free-text annotation stored alongside a score; a note
/// mentioning "user-test" flags a legacy scoring path whose raw values were
/// on an inverted 0.8-denominated scale rather than today's direct one.
pub fn to_display_score(raw: f64, note: Option<&str>) -> DisplayScore {
    if Sentinel::from_raw(raw).is_some() {
        return DisplayScore::NotAvailable;
    }

    let is_user_test = note.map(|n| n.contains("user-test")).unwrap_or(false);
    let value = if is_user_test {
        100.0 - raw / 0.8
    } else if raw.abs() < 1.0 {
        50.0 - raw * 100.0
    } else {
        raw
    };

    DisplayScore::Value(value.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_raw_values_are_not_available() {
        for raw in [-999.0, -888.0, -777.0, -100.0] {
            assert_eq!(to_display_score(raw, None), DisplayScore::NotAvailable);
        }
    }

    #[test]
    fn ordinary_score_in_range_passes_through() {
        assert_eq!(to_display_score(72.0, None), DisplayScore::Value(72.0));
    }

    #[test]
    fn small_magnitude_raw_uses_the_fallback_transform() {
        // 50 - 0.3*100 = 20
        assert_eq!(to_display_score(0.3, None), DisplayScore::Value(20.0));
    }

    #[test]
    fn user_test_note_applies_the_legacy_scale() {
        // 100 - 40/0.8 = 50
        assert_eq!(to_display_score(40.0, Some("legacy user-test batch")), DisplayScore::Value(50.0));
    }

    #[test]
    fn result_is_always_clipped_to_zero_to_hundred() {
        assert_eq!(to_display_score(500.0, None), DisplayScore::Value(100.0));
        assert_eq!(to_display_score(-50.0, None), DisplayScore::Value(0.0));
    }

    #[test]
    fn reapplying_conversion_to_a_display_value_is_stable() {
        for raw in [42.0, 85.0, 20.0, 99.9] {
            let once = to_display_score(raw, None);
            let twice = match once {
                DisplayScore::Value(v) => to_display_score(v, None),
                DisplayScore::NotAvailable => DisplayScore::NotAvailable,
            };
            assert_eq!(once, twice, "not idempotent for raw={raw}");
        }
    }
}
