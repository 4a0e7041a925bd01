//! Fixed-point unit conversions.
//!
//! The contracts have no floating point: currency amounts and distances are
//! integers scaled by 10^18, star luminosity by 10^12. Conversions here are
//! exact up to the target scale and round half away from zero beyond it.

use alloy::primitives::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Fractional digits of SLW amounts.
pub const CURRENCY_DECIMALS: u32 = 18;
/// Fractional digits of travel distances.
pub const DISTANCE_DECIMALS: u32 = 18;
/// Fractional digits of star luminosity.
pub const LUMINOSITY_DECIMALS: u32 = 12;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Errors raised while converting between decimals and fixed-point integers.
#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
	/// The contracts only accept unsigned quantities.
	#[error("Negative amount {0} cannot be encoded as fixed-point")]
	Negative(Decimal),
	/// The float has no decimal representation (NaN, infinity, out of range).
	#[error("Value {0} is not representable as a decimal")]
	NotRepresentable(f64),
	/// The value does not fit the target representation.
	#[error("Fixed-point overflow: {0}")]
	Overflow(String),
}

/// Converts a decimal to its fixed-point integer with `decimals` fractional digits.
pub fn to_fixed_point(value: Decimal, decimals: u32) -> Result<U256, ConversionError> {
	if value < Decimal::ZERO {
		return Err(ConversionError::Negative(value));
	}

	let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
	let mantissa = U256::from(rounded.mantissa().unsigned_abs());
	let factor = U256::from(10u8).pow(U256::from(decimals - rounded.scale()));

	mantissa
		.checked_mul(factor)
		.ok_or_else(|| ConversionError::Overflow(format!("{} * 10^{}", value, decimals)))
}

/// Converts a fixed-point integer with `decimals` fractional digits to a decimal.
///
/// Values too wide for a `Decimal` mantissa lose trailing fractional digits;
/// values whose integer part alone exceeds it fail.
pub fn from_fixed_point(raw: U256, decimals: u32) -> Result<Decimal, ConversionError> {
	let max_mantissa = U256::from(Decimal::MAX.mantissa().unsigned_abs());
	let ten = U256::from(10u8);

	let mut value = raw;
	let mut scale = decimals;
	while scale > MAX_DECIMAL_SCALE || value > max_mantissa {
		if scale == 0 {
			return Err(ConversionError::Overflow(format!(
				"{} exceeds the decimal range",
				raw
			)));
		}
		value /= ten;
		scale -= 1;
	}

	let mantissa: u128 = value
		.try_into()
		.map_err(|_| ConversionError::Overflow(raw.to_string()))?;
	let mantissa = i128::try_from(mantissa).map_err(|_| ConversionError::Overflow(raw.to_string()))?;

	Decimal::try_from_i128_with_scale(mantissa, scale)
		.map(|d| d.normalize())
		.map_err(|e| ConversionError::Overflow(e.to_string()))
}

/// Converts a float to a decimal.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, ConversionError> {
	if !value.is_finite() {
		return Err(ConversionError::NotRepresentable(value));
	}
	Decimal::from_f64(value).ok_or(ConversionError::NotRepresentable(value))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn dec(s: &str) -> Decimal {
		Decimal::from_str(s).unwrap()
	}

	#[test]
	fn test_whole_balance() {
		let raw = U256::from(5_000_000_000_000_000_000u128);
		assert_eq!(from_fixed_point(raw, CURRENCY_DECIMALS).unwrap().to_string(), "5");
	}

	#[test]
	fn test_currency_round_trip() {
		for s in ["0", "1", "1.5", "0.000000000000000001", "12345.678901234567890123"] {
			let value = dec(s);
			let raw = to_fixed_point(value, CURRENCY_DECIMALS).unwrap();
			let back = from_fixed_point(raw, CURRENCY_DECIMALS).unwrap();
			assert_eq!(back, value.round_dp(CURRENCY_DECIMALS).normalize(), "{}", s);
		}
	}

	#[test]
	fn test_excess_precision_is_rounded() {
		let raw = to_fixed_point(dec("0.1234567890125"), LUMINOSITY_DECIMALS).unwrap();
		assert_eq!(raw, U256::from(123_456_789_013u64));

		let raw = to_fixed_point(dec("0.1234567890124"), LUMINOSITY_DECIMALS).unwrap();
		assert_eq!(raw, U256::from(123_456_789_012u64));
	}

	#[test]
	fn test_luminosity_scale() {
		let value = decimal_from_f64(1.25).unwrap();
		let raw = to_fixed_point(value, LUMINOSITY_DECIMALS).unwrap();
		assert_eq!(raw, U256::from(1_250_000_000_000u64));
		assert_eq!(from_fixed_point(raw, LUMINOSITY_DECIMALS).unwrap(), dec("1.25"));
	}

	#[test]
	fn test_distance_scale() {
		let raw = to_fixed_point(dec("42"), DISTANCE_DECIMALS).unwrap();
		assert_eq!(raw.to_string(), "42000000000000000000");
	}

	#[test]
	fn test_negative_rejected() {
		assert!(matches!(
			to_fixed_point(dec("-1"), CURRENCY_DECIMALS),
			Err(ConversionError::Negative(_))
		));
	}

	#[test]
	fn test_non_finite_rejected() {
		assert!(decimal_from_f64(f64::NAN).is_err());
		assert!(decimal_from_f64(f64::INFINITY).is_err());
	}

	#[test]
	fn test_wide_values_lose_only_fraction() {
		// 10^12 whole tokens: too wide for 18 fractional digits in a Decimal.
		let raw = U256::from(10u8).pow(U256::from(30u8)) + U256::from(1u8);
		let value = from_fixed_point(raw, CURRENCY_DECIMALS).unwrap();
		assert_eq!(value, dec("1000000000000"));
	}

	#[test]
	fn test_integer_overflow_rejected() {
		assert!(matches!(
			from_fixed_point(U256::MAX, 0),
			Err(ConversionError::Overflow(_))
		));
	}
}
