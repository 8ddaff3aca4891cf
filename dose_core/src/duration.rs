//! Permissible exposure duration from the exchange-rate formula.
//!
//! `T(L) = criterion_duration * 2^(-(L - criterion_level) / exchange_rate)`
//!
//! Values stay as exact `f64` seconds. Rounding for display lives in
//! [`crate::export`].

use crate::{Decibels, Seconds, StandardTable};

/// Allowed exposure at `level` under `table`
pub fn allowed_duration(level: Decibels, table: &StandardTable) -> Seconds {
    let halvings = (level - table.criterion_level) / table.exchange_rate;
    table.criterion_duration * (-halvings).exp2()
}

/// Allowed durations for every threshold of a table, in threshold order
pub fn allowed_durations(table: &StandardTable) -> Vec<Seconds> {
    table
        .thresholds
        .iter()
        .map(|&level| allowed_duration(level, table))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoiseStandard;

    #[test]
    fn test_niosh_durations_exact() {
        let niosh = StandardTable::for_standard(NoiseStandard::Niosh);
        let expected = [
            (85.0, 28_800.0),
            (88.0, 14_400.0),
            (91.0, 7_200.0),
            (94.0, 3_600.0),
            (97.0, 1_800.0),
            (100.0, 900.0),
        ];
        for (level, seconds) in expected {
            assert_eq!(allowed_duration(level, niosh), seconds, "level {}", level);
        }
    }

    #[test]
    fn test_niosh_short_durations() {
        let niosh = StandardTable::for_standard(NoiseStandard::Niosh);
        assert!((allowed_duration(103.0, niosh) - 450.0).abs() < 1e-9);
        assert!((allowed_duration(112.0, niosh) - 56.25).abs() < 1e-9);
        assert!((allowed_duration(115.0, niosh) - 28.125).abs() < 1e-9);
    }

    #[test]
    fn test_osha_durations() {
        let osha = StandardTable::for_standard(NoiseStandard::Osha);
        let durations = allowed_durations(osha);
        let expected = [28_800.0, 14_400.0, 7_200.0, 3_600.0, 1_800.0, 900.0];
        for (got, want) in durations.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_eu_criterion_is_eight_hours() {
        let eu = StandardTable::for_standard(NoiseStandard::Eu);
        assert_eq!(allowed_duration(87.0, eu), 28_800.0);
    }

    #[test]
    fn test_durations_strictly_decrease() {
        for standard in NoiseStandard::ALL {
            let durations = allowed_durations(StandardTable::for_standard(standard));
            assert!(durations.windows(2).all(|w| w[0] > w[1]), "{}", standard);
            assert!(durations.iter().all(|&d| d > 0.0), "{}", standard);
        }
    }
}
