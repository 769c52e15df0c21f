use clap::ValueEnum;
use rust_decimal::Decimal;

use crate::constant::NATIVE_DECIMALS;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum LoggingFormat {
    #[default]
    Standard,
    Json,
}

/// Renders a minor-unit amount of the native currency for log lines, e.g.
/// `2000000` -> `0.02`.
pub fn display_amount(minor_units: u64) -> String {
    let value = Decimal::from(minor_units) / Decimal::from(10u64.pow(NATIVE_DECIMALS));
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_amount() {
        assert_eq!(display_amount(2_000_000), "0.02");
        assert_eq!(display_amount(100_000_000_000), "1000");
        assert_eq!(display_amount(1_999_999), "0.01999999");
        assert_eq!(display_amount(0), "0");
    }
}
