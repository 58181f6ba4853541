//! Products

use std::fmt;

use decimal_percentage::Percentage;

use crate::discounts::SimpleDiscount;

/// Opaque product identifier, as issued by the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a direct product discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountStatus {
    /// Running now; the discount applies.
    Active,

    /// Scheduled but not started.
    Waiting,

    /// Past its end date.
    Expired,

    /// Withdrawn by the brand.
    Cancelled,
}

/// A percentage discount set directly on a product classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductDiscount {
    /// Fraction taken off the unit price.
    pub discount: Percentage,

    /// Only [`DiscountStatus::Active`] discounts are applied.
    pub status: DiscountStatus,
}

impl ProductDiscount {
    /// Create an active product discount.
    pub fn active(discount: Percentage) -> Self {
        Self {
            discount,
            status: DiscountStatus::Active,
        }
    }

    /// The discount to apply to the unit price, if it is currently active.
    pub fn applicable<'a>(&self) -> Option<SimpleDiscount<'a>> {
        (self.status == DiscountStatus::Active)
            .then_some(SimpleDiscount::PercentageOff(self.discount))
    }
}
