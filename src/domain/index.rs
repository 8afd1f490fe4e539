//! Index configuration.
//!
//! `IndexConfig` carries N and the three behaviours that the source data
//! leaves open: how equal caps are ordered, how weights are normalised and
//! which price history a ticker's daily return is measured against.

use crate::domain::error::IndexError;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Number of index constituents. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSize(NonZeroUsize);

impl IndexSize {
    /// Fails with `ConfigInvalid` for `n <= 0`, the only fatal core condition.
    pub fn new(n: i64) -> Result<Self, IndexError> {
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(IndexSize)
            .ok_or_else(|| IndexError::invalid("index", "size", "size must be a positive integer"))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Equal caps keep their input order (stable sort).
    #[default]
    RowOrder,
    /// Equal caps are ordered by ticker, ascending.
    Ticker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightScheme {
    /// Every constituent weighs 1/N, even on days with fewer than N tickers.
    #[default]
    Fixed,
    /// Every constituent weighs 1/k, k = constituents that day.
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnBasis {
    /// Return against the ticker's previous observation anywhere in the data.
    #[default]
    Observations,
    /// Return against the ticker's previous day as a constituent.
    Constituents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub size: IndexSize,
    pub tie_break: TieBreak,
    pub weighting: WeightScheme,
    pub return_basis: ReturnBasis,
}

impl IndexConfig {
    pub fn new(size: IndexSize) -> Self {
        Self {
            size,
            tie_break: TieBreak::default(),
            weighting: WeightScheme::default(),
            return_basis: ReturnBasis::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown option '{value}', expected one of: {expected}")]
pub struct UnknownOption {
    pub value: String,
    pub expected: &'static str,
}

impl FromStr for TieBreak {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "row_order" => Ok(TieBreak::RowOrder),
            "ticker" => Ok(TieBreak::Ticker),
            _ => Err(UnknownOption {
                value: s.to_string(),
                expected: "row_order, ticker",
            }),
        }
    }
}

impl FromStr for WeightScheme {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(WeightScheme::Fixed),
            "normalized" => Ok(WeightScheme::Normalized),
            _ => Err(UnknownOption {
                value: s.to_string(),
                expected: "fixed, normalized",
            }),
        }
    }
}

impl FromStr for ReturnBasis {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "observations" => Ok(ReturnBasis::Observations),
            "constituents" => Ok(ReturnBasis::Constituents),
            _ => Err(UnknownOption {
                value: s.to_string(),
                expected: "observations, constituents",
            }),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::RowOrder => write!(f, "row_order"),
            TieBreak::Ticker => write!(f, "ticker"),
        }
    }
}

impl fmt::Display for WeightScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightScheme::Fixed => write!(f, "fixed"),
            WeightScheme::Normalized => write!(f, "normalized"),
        }
    }
}

impl fmt::Display for ReturnBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnBasis::Observations => write!(f, "observations"),
            ReturnBasis::Constituents => write!(f, "constituents"),
        }
    }
}
