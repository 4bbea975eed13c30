use crate::types::errors::AmountError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::AddAssign;
use std::str::FromStr;
use tracing::error;

const DECIMAL_PLACES: u32 = 2;

/// A non-negative amount in major currency units, always carried with two decimal places.
///
/// Direction is never encoded in the sign; callers that receive signed provider values
/// use [`Amount::from_minor`] or [`Amount::parse_signed`] and keep the sign separately.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Amount(normalize(Decimal::ZERO))
    }

    /// Converts a signed minor-unit value (cents) to major units.
    ///
    /// Returns the magnitude together with whether the source value was negative.
    pub fn from_minor(minor: i64) -> (Self, bool) {
        let magnitude = Decimal::from_i128_with_scale(minor.unsigned_abs() as i128, DECIMAL_PLACES);

        (Amount(normalize(magnitude)), minor < 0)
    }

    /// Converts a signed major-unit decimal, returning the magnitude and its original sign.
    pub fn from_major(value: Decimal) -> (Self, bool) {
        (Amount(normalize(value.abs())), value.is_sign_negative() && !value.is_zero())
    }

    /// Parses a signed decimal string such as `"-10.5"` or `"1234,56"`.
    pub fn parse_signed(value: &str) -> Result<(Self, bool), AmountError> {
        let value = value.trim();

        if value.is_empty() {
            return Err(AmountError::InvalidFormat("Value is an empty string".to_string()));
        }

        //NOTE: Some rails send the Brazilian decimal comma; only accept it when no dot is present
        let normalized = if value.contains(',') && !value.contains('.') {
            value.replace(',', ".")
        } else {
            value.to_string()
        };

        let decimal = Decimal::from_str(&normalized).map_err(|error| {
            AmountError::InvalidFormat(format!("Value [{value}] is not a decimal: {error}"))
        })?;

        Ok(Amount::from_major(decimal))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(|value| Amount(normalize(value)))
    }

    /// True when `self` lies strictly within `tolerance` of `target`.
    pub fn is_within(&self, target: Decimal, tolerance: Decimal) -> bool {
        (self.0 - target).abs() < tolerance
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

fn normalize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

impl AddAssign<Amount> for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        if let Some(new_val) = self.checked_add(rhs) {
            self.0 = new_val.0;
        } else {
            error!("Amount AddAssign error: Overflow")
        }
    }
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match Amount::parse_signed(value)? {
            (_, true) => Err(AmountError::Negative(value.trim().to_string())),
            (amount, false) => Ok(amount),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Amount::from_str(&value).map_err(de::Error::custom)
    }
}
