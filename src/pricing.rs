//! Pricing
//!
//! Line and multi-line totals for selected cart items. Product discounts are
//! applied per unit, before multiplying by quantity.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    cart::Selection,
    discounts::{DiscountError, discount_amount, discounted_price},
    items::CartItem,
};

/// Errors that can occur while totalling cart lines.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A line or running total did not fit in minor units.
    #[error("total overflowed while pricing cart lines")]
    Overflow,

    /// Errors bubbled up from the discount primitives.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Price of a line after its product discount: discounted unit price times quantity.
///
/// # Errors
///
/// Returns a [`PricingError`] if the discount cannot be applied or the line overflows.
pub fn line_total<'a>(item: &CartItem<'a>) -> Result<Money<'a, Currency>, PricingError> {
    let unit = discounted_price(*item.price(), item.applicable_product_discount().as_ref())?;

    times(unit, item.quantity())
}

/// Price of a line before any discount.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the line overflows.
pub fn line_original_total<'a>(item: &CartItem<'a>) -> Result<Money<'a, Currency>, PricingError> {
    times(*item.price(), item.quantity())
}

/// Amount the product discount takes off a line.
///
/// # Errors
///
/// Returns a [`PricingError`] if the discount cannot be applied or the line overflows.
pub fn line_product_discount<'a>(item: &CartItem<'a>) -> Result<Money<'a, Currency>, PricingError> {
    let unit_off = discount_amount(*item.price(), item.applicable_product_discount().as_ref())?;

    times(unit_off, item.quantity())
}

/// Sum of [`line_total`] over the selected items.
///
/// # Errors
///
/// Returns a [`PricingError`] if any line cannot be priced or the sum overflows.
pub fn total_price<'a, 'i>(
    items: impl IntoIterator<Item = &'i CartItem<'a>>,
    selection: &Selection,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'i,
{
    sum_selected(items, selection, currency, line_total)
}

/// Sum of [`line_original_total`] over the selected items.
///
/// # Errors
///
/// Returns a [`PricingError`] if any line overflows or currencies differ.
pub fn total_original_price<'a, 'i>(
    items: impl IntoIterator<Item = &'i CartItem<'a>>,
    selection: &Selection,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'i,
{
    sum_selected(items, selection, currency, line_original_total)
}

/// Sum of [`line_product_discount`] over the selected items.
///
/// # Errors
///
/// Returns a [`PricingError`] if any line cannot be priced or the sum overflows.
pub fn total_product_discount<'a, 'i>(
    items: impl IntoIterator<Item = &'i CartItem<'a>>,
    selection: &Selection,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'i,
{
    sum_selected(items, selection, currency, line_product_discount)
}

fn sum_selected<'a, 'i>(
    items: impl IntoIterator<Item = &'i CartItem<'a>>,
    selection: &Selection,
    currency: &'a Currency,
    line: impl Fn(&CartItem<'a>) -> Result<Money<'a, Currency>, PricingError>,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'i,
{
    items
        .into_iter()
        .filter(|item| selection.contains(item.id()))
        .try_fold(Money::from_minor(0, currency), |acc, item| {
            checked_add(acc, line(item)?)
        })
}

/// Multiply a price by a quantity in minor units.
pub(crate) fn times(
    price: Money<'_, Currency>,
    quantity: u32,
) -> Result<Money<'_, Currency>, PricingError> {
    let minor = price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Add two amounts, failing on currency mismatch or minor unit overflow.
pub(crate) fn checked_add<'a>(
    left: Money<'a, Currency>,
    right: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, PricingError> {
    crate::discounts::ensure_same_currency(&left, &right)?;

    let minor = left
        .to_minor_units()
        .checked_add(right.to_minor_units())
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, left.currency()))
}
