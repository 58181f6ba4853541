//! Discounts
//!
//! Single-price discount primitives shared by product discounts and vouchers.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A negative price was passed where only non-negative prices are valid (minor units).
    #[error("price must not be negative, got {0} minor units")]
    NegativePrice(i64),

    /// A percentage outside of 0-100 was passed (percent points).
    #[error("percentage must be between 0 and 100, got {0}")]
    PercentOutOfRange(Decimal),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A discount applied to a single price.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SimpleDiscount<'a> {
    /// Take a fraction of the price off (e.g. 0.1 for "10% off").
    PercentageOff(Percentage),

    /// Subtract a fixed amount from the price (e.g. "£2 off").
    AmountOff(Money<'a, Currency>),
}

impl SimpleDiscount<'_> {
    /// Whether this discount leaves every price unchanged.
    pub fn is_zero(&self) -> bool {
        match self {
            SimpleDiscount::PercentageOff(percent) => (*percent * Decimal::ONE).is_zero(),
            SimpleDiscount::AmountOff(amount) => amount.to_minor_units() == 0,
        }
    }
}

/// Calculate the amount a discount takes off `price`.
///
/// An absent or zero discount takes nothing off. The result is clamped to
/// `0..=price`, so the discounted price can never go negative.
///
/// # Errors
///
/// - [`DiscountError::PercentConversion`]: the percentage could not be applied in minor units.
/// - [`DiscountError::Money`]: an amount discount is in a different currency to `price`.
pub fn discount_amount<'a>(
    price: Money<'a, Currency>,
    discount: Option<&SimpleDiscount<'a>>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = price.currency();

    let Some(discount) = discount.filter(|discount| !discount.is_zero()) else {
        return Ok(Money::from_minor(0, currency));
    };

    let price_minor = price.to_minor_units().max(0);

    let off_minor = match discount {
        SimpleDiscount::PercentageOff(percent) => percent_of_minor(percent, price_minor)?,
        SimpleDiscount::AmountOff(amount) => {
            ensure_same_currency(&price, amount)?;
            amount.to_minor_units()
        }
    };

    Ok(Money::from_minor(off_minor.clamp(0, price_minor), currency))
}

/// Calculate the price left after applying a discount, floored at zero.
///
/// # Errors
///
/// See [`discount_amount`].
pub fn discounted_price<'a>(
    price: Money<'a, Currency>,
    discount: Option<&SimpleDiscount<'a>>,
) -> Result<Money<'a, Currency>, DiscountError> {
    if discount.is_none_or(SimpleDiscount::is_zero) {
        return Ok(price);
    }

    let off = discount_amount(price, discount)?;

    Ok(price.sub(off)?)
}

/// Apply a percentage, given in percent points, to a price.
///
/// Unlike [`discounted_price`] this rejects its inputs outright instead of
/// clamping them: a negative price or a percentage outside of `0..=100` is a
/// caller bug.
///
/// # Errors
///
/// - [`DiscountError::NegativePrice`]: `price` is below zero.
/// - [`DiscountError::PercentOutOfRange`]: `percent_points` is outside `0..=100`.
/// - [`DiscountError::PercentConversion`]: the percentage could not be applied in minor units.
pub fn discounted_price_checked(
    price: Money<'_, Currency>,
    percent_points: Decimal,
) -> Result<Money<'_, Currency>, DiscountError> {
    let minor = price.to_minor_units();

    if minor < 0 {
        return Err(DiscountError::NegativePrice(minor));
    }

    if percent_points < Decimal::ZERO || percent_points > Decimal::ONE_HUNDRED {
        return Err(DiscountError::PercentOutOfRange(percent_points));
    }

    let percent = Percentage::from(percent_points / Decimal::ONE_HUNDRED);

    discounted_price(price, Some(&SimpleDiscount::PercentageOff(percent)))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or
/// cannot be represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Fail with a currency mismatch unless both amounts share a currency.
pub(crate) fn ensure_same_currency(
    expected: &Money<'_, Currency>,
    actual: &Money<'_, Currency>,
) -> Result<(), MoneyError> {
    if expected.currency() == actual.currency() {
        Ok(())
    } else {
        Err(MoneyError::CurrencyMismatch {
            expected: expected.currency().iso_alpha_code,
            actual: actual.currency().iso_alpha_code,
        })
    }
}
