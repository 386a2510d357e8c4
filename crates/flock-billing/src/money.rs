//! Money
//!
//! Prices arrive from the backend in major units (`50.00`); the provider
//! wants integer minor units (`5000` pesewas).

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// Supported settlement currencies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ghs,
    Ngn,
    Usd,
    Zar,
    Kes,
}

impl Currency {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ghs => "GHS",
            Self::Ngn => "NGN",
            Self::Usd => "USD",
            Self::Zar => "ZAR",
            Self::Kes => "KES",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GHS" => Ok(Self::Ghs),
            "NGN" => Ok(Self::Ngn),
            "USD" => Ok(Self::Usd),
            "ZAR" => Ok(Self::Zar),
            "KES" => Ok(Self::Kes),
            other => Err(CheckoutError::Config(format!("unsupported currency: {other}"))),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount in the smallest currency unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    minor_units: u64,
    currency: Currency,
}

impl Amount {
    pub const fn from_minor(minor_units: u64, currency: Currency) -> Self {
        Self { minor_units, currency }
    }

    /// Convert a major-unit price (e.g. `50.00`) into minor units.
    ///
    /// Negative prices and prices with sub-minor-unit precision are rejected.
    pub fn from_major(major: Decimal, currency: Currency) -> Result<Self> {
        if major.is_sign_negative() && !major.is_zero() {
            return Err(CheckoutError::Decode(format!("negative price: {major}")));
        }

        let minor = major
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| CheckoutError::Decode(format!("price out of range: {major}")))?;
        if minor.fract() != Decimal::ZERO {
            return Err(CheckoutError::Decode(format!(
                "price {major} is not representable in minor units"
            )));
        }

        let minor_units = minor
            .to_u64()
            .ok_or_else(|| CheckoutError::Decode(format!("price out of range: {major}")))?;

        Ok(Self::from_minor(minor_units, currency))
    }

    pub const fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub const fn currency(&self) -> Currency {
        self.currency
    }

    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    pub fn to_major(&self) -> Decimal {
        Decimal::from(self.minor_units) / Decimal::ONE_HUNDRED
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.to_major())
    }
}
