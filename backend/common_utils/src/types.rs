//! Amount types. Arithmetic is decimal with 2-dp rounding half-up; all
//! provider conversions to minor units are integer (`round(amount*100)`).
//! `MajorUnit` is the wire-facing decimal the client sends and the gateway
//! echoes back; `MinorUnit` is what drivers convert to at the provider
//! boundary.

use std::fmt;

use error_stack::ResultExt;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, ParsingError};

/// A 2-decimal-place major-unit amount, e.g. `100.50` TRY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MajorUnit(Decimal);

impl Serialize for MajorUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_major_unit_string())
    }
}

impl<'de> Deserialize<'de> for MajorUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept either a JSON number or a JSON string, since clients may
        // reasonably send either for a decimal amount.
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match &value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return Err(serde::de::Error::custom("amount must be a number or string")),
        };
        let decimal = Decimal::from_str_exact(&raw).map_err(serde::de::Error::custom)?;
        if decimal.scale() > 2 {
            return Err(serde::de::Error::custom(
                "amount must not carry more than 2 decimal places",
            ));
        }
        Ok(Self::new(decimal))
    }
}

impl MajorUnit {
    /// Construct from a decimal, rounding half-up to 2dp. Rejects
    /// negative and zero amounts at the type boundary is intentionally
    /// *not* done here — that is a `ValidationError` raised by the caller,
    /// this type only normalises precision.
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn from_str(value: &str) -> CustomResult<Self, ParsingError> {
        let decimal = Decimal::from_str_exact(value)
            .change_context(ParsingError::StructParseFailure("MajorUnit"))?;
        Ok(Self::new(decimal))
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Convert to the provider's minor-unit integer representation
    /// (`round(amount * 100)`).
    pub fn to_minor_unit(self, exponent: u32) -> MinorUnit {
        let scaled = self.0 * Decimal::from(10u64.pow(exponent));
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        MinorUnit(rounded.try_into().unwrap_or(i64::MAX))
    }

    pub fn to_major_unit_string(self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for MajorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for MajorUnit {
    type Error = std::convert::Infallible;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Ok(Self::new(value))
    }
}

impl From<MajorUnit> for Decimal {
    fn from(value: MajorUnit) -> Self {
        value.0
    }
}

/// Integer amount in the smallest currency denomination, e.g. 10050 for
/// 100.50 TRY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinorUnit(i64);

impl MinorUnit {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    pub fn to_major_unit_as_string(self, exponent: u32) -> String {
        let divisor = Decimal::from(10u64.pow(exponent));
        let major = Decimal::from(self.0) / divisor;
        format!("{:.2}", major)
    }
}

impl std::ops::Add for MinorUnit {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for MinorUnit {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_decimal_places_deserializes() {
        let value: MajorUnit = serde_json::from_str("\"100.50\"").unwrap();
        assert_eq!(value.to_major_unit_string(), "100.50");
    }

    #[test]
    fn more_than_two_decimal_places_is_rejected() {
        let result: Result<MajorUnit, _> = serde_json::from_str("\"100.505\"");
        assert!(result.is_err());
    }

    #[test]
    fn whole_amounts_deserialize() {
        let value: MajorUnit = serde_json::from_str("\"100\"").unwrap();
        assert_eq!(value.to_major_unit_string(), "100.00");
    }
}
