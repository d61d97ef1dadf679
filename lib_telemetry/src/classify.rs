//! Production/consumption balance classification.

use std::fmt;

/// Tri-state balance signal for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    /// Consumption outpaces production; stock is draining.
    Deficit,
    /// Production outpaces consumption; stock is growing.
    Surplus,
    /// Rates are equal after flooring.
    Balanced,
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Balance::Deficit => "deficit",
            Balance::Surplus => "surplus",
            Balance::Balanced => "balanced",
        };
        f.write_str(label)
    }
}

/// Classifies a production/consumption pair.
///
/// Both rates are floored first so sub-unit jitter does not flip the
/// signal. There is no hysteresis beyond that: rates hovering at equality
/// may alternate between states on successive polls.
pub fn classify(production: f64, consumption: f64) -> Balance {
    let production = production.floor();
    let consumption = consumption.floor();
    if consumption > production {
        Balance::Deficit
    } else if production > consumption {
        Balance::Surplus
    } else {
        Balance::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_rates_are_balanced() {
        assert_eq!(classify(5.0, 5.0), Balance::Balanced);
        assert_eq!(classify(0.0, 0.0), Balance::Balanced);
    }

    #[test]
    fn higher_consumption_is_a_deficit() {
        assert_eq!(classify(5.0, 6.0), Balance::Deficit);
    }

    #[test]
    fn higher_production_is_a_surplus() {
        assert_eq!(classify(6.0, 5.0), Balance::Surplus);
    }

    #[test]
    fn fractional_jitter_is_floored_away() {
        // 5.9 vs 5.1 floors to 5 vs 5.
        assert_eq!(classify(5.9, 5.1), Balance::Balanced);
        // A full unit of difference survives the floor.
        assert_eq!(classify(5.0, 6.9), Balance::Deficit);
        assert_eq!(classify(7.2, 6.9), Balance::Surplus);
    }
}
