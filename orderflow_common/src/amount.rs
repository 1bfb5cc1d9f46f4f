use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{de, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const AMOUNT_DECIMAL_PLACES: u32 = 2;
/// Total number of significant digits an amount may carry, including the decimal places.
pub const MAX_AMOUNT_DIGITS: u32 = 10;

const SCALE: i64 = 10i64.pow(AMOUNT_DECIMAL_PLACES);
const MAX_WHOLE_DIGITS: usize = (MAX_AMOUNT_DIGITS - AMOUNT_DECIMAL_PLACES) as usize;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A fixed-point currency value with two decimal places, stored as an integer number of cents.
///
/// On the wire amounts are written as decimal strings (`"99.99"`) so that no precision is lost. When reading, both
/// decimal strings and plain JSON numbers are accepted.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(unary Amount, Neg, neg);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(AmountConversionError("A valid number is required.".into()));
        }
        if fraction.len() > AMOUNT_DECIMAL_PLACES as usize {
            return Err(AmountConversionError(format!(
                "Ensure that there are no more than {AMOUNT_DECIMAL_PLACES} decimal places."
            )));
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_WHOLE_DIGITS {
            return Err(AmountConversionError(format!(
                "Ensure that there are no more than {MAX_WHOLE_DIGITS} digits before the decimal point."
            )));
        }
        let as_int = |p: &str| p.parse::<i64>().map_err(|e| AmountConversionError(e.to_string()));
        let whole_value = if whole.is_empty() { 0 } else { as_int(whole)? };
        let fraction_value = as_int(&format!("{fraction:0<2}"))?;
        let cents = whole_value * SCALE + fraction_value;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal amount, as a number or a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("A valid number is required."));
        }
        // `Display` for f64 yields the shortest representation that round-trips, so 0.1 prints as "0.1"
        self.visit_str(&v.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}
