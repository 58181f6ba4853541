//! Cart Totals

use rusty_money::{Money, iso::Currency};

use crate::{
    cart::{Cart, Selection},
    pricing::{PricingError, checked_add, line_original_total, line_product_discount, line_total},
};

/// Totals over the selected lines before any voucher is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals<'a> {
    /// Sum of quantity times unit price, before any discount.
    pub total_product_cost: Money<'a, Currency>,

    /// Sum of what active product discounts take off.
    pub total_product_discount: Money<'a, Currency>,

    /// Sum of product-discounted line totals.
    pub total_price: Money<'a, Currency>,
}

impl<'a> CartTotals<'a> {
    /// All-zero totals in `currency`.
    pub fn zero(currency: &'a Currency) -> Self {
        Self {
            total_product_cost: Money::from_minor(0, currency),
            total_product_discount: Money::from_minor(0, currency),
            total_price: Money::from_minor(0, currency),
        }
    }

    /// What the shopper pays once brand and platform voucher discounts are
    /// taken off [`Self::total_price`]. Never below zero.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a discount is in another currency.
    pub fn payable(
        &self,
        brand_voucher_discount: Money<'a, Currency>,
        platform_voucher_discount: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, PricingError> {
        let discounts = checked_add(brand_voucher_discount, platform_voucher_discount)?;

        crate::discounts::ensure_same_currency(&self.total_price, &discounts)?;

        let minor = self
            .total_price
            .to_minor_units()
            .saturating_sub(discounts.to_minor_units())
            .max(0);

        Ok(Money::from_minor(minor, self.total_price.currency()))
    }
}

/// Total the selected lines of a cart: original cost, product discounts, and
/// product-discounted price. Voucher discounts are not included.
///
/// # Errors
///
/// Returns a [`PricingError`] if a line cannot be priced or a total overflows.
pub fn cart_totals<'a>(
    selection: &Selection,
    cart: &Cart<'a>,
) -> Result<CartTotals<'a>, PricingError> {
    cart.brands()
        .iter()
        .flat_map(|group| group.selected(selection))
        .try_fold(CartTotals::zero(cart.currency()), |totals, item| {
            Ok::<_, PricingError>(CartTotals {
                total_product_cost: checked_add(
                    totals.total_product_cost,
                    line_original_total(item)?,
                )?,
                total_product_discount: checked_add(
                    totals.total_product_discount,
                    line_product_discount(item)?,
                )?,
                total_price: checked_add(totals.total_price, line_total(item)?)?,
            })
        })
}
