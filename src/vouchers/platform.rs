//! Platform voucher evaluation
//!
//! The platform voucher is evaluated on the order total left after brand
//! vouchers. Each brand's voucher discount is spread over the lines it was
//! computed from, in proportion to their price, so money a brand voucher
//! already took off is never discounted a second time.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
    cart::{BrandCart, Cart, Selection},
    items::CartItem,
    pricing::line_total,
    vouchers::{BrandVouchers, Voucher, VoucherError, brand},
};

/// Total of the selected lines in `voucher`'s scope, after brand voucher discounts.
///
/// Brands with no selected line in scope are skipped.
///
/// # Errors
///
/// Returns a [`VoucherError`] if a line cannot be priced, a brand voucher
/// cannot be evaluated, or the distribution overflows.
pub fn order_total_after_brand_discounts<'a>(
    cart: &Cart<'a>,
    selection: &Selection,
    voucher: &Voucher<'a>,
    brand_vouchers: &BrandVouchers<'a>,
) -> Result<Money<'a, Currency>, VoucherError> {
    let currency = cart.currency();
    let mut total = Decimal::ZERO;

    for group in cart.brands() {
        let eligible: SmallVec<[&CartItem<'a>; 8]> = group
            .selected(selection)
            .filter(|item| voucher.applies_to(item.product()))
            .collect();

        if eligible.is_empty() {
            trace!(brand = %group.brand(), "no lines eligible for platform voucher; skipping brand");
            continue;
        }

        let brand_voucher = brand_vouchers.get(group.brand());
        let ratio = brand_discount_ratio(group, selection, brand_voucher, currency)?;

        for item in eligible {
            let line = Decimal::from(line_total(item)?.to_minor_units());

            let remaining = if brand_voucher.is_some_and(|bv| bv.applies_to(item.product())) {
                line.checked_mul(Decimal::ONE - ratio)
                    .ok_or(VoucherError::Overflow)?
            } else {
                line
            };

            total = total
                .checked_add(remaining)
                .ok_or(VoucherError::Overflow)?;
        }
    }

    let minor = total
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(VoucherError::Overflow)?;

    Ok(Money::from_minor(minor, currency))
}

/// Discount the platform voucher gives on the order. No voucher gives nothing.
///
/// # Errors
///
/// See [`order_total_after_brand_discounts`]. Also fails if the voucher's
/// amounts are in another currency.
pub fn platform_voucher_discount<'a>(
    cart: &Cart<'a>,
    selection: &Selection,
    voucher: Option<&Voucher<'a>>,
    brand_vouchers: &BrandVouchers<'a>,
) -> Result<Money<'a, Currency>, VoucherError> {
    let Some(voucher) = voucher else {
        return Ok(Money::from_minor(0, cart.currency()));
    };

    let total = order_total_after_brand_discounts(cart, selection, voucher, brand_vouchers)?;
    let discount = voucher.discount_on(total)?;

    debug!(
        voucher = voucher.code(),
        order_total = %total,
        discount = %discount,
        "evaluated platform voucher"
    );

    Ok(discount)
}

/// Fraction of its eligible subtotal a brand's voucher takes off.
fn brand_discount_ratio<'a>(
    group: &BrandCart<'a>,
    selection: &Selection,
    voucher: Option<&Voucher<'a>>,
    currency: &'a Currency,
) -> Result<Decimal, VoucherError> {
    let Some(voucher) = voucher else {
        return Ok(Decimal::ZERO);
    };

    let outcome = brand::evaluate(group.items(), selection, voucher, currency)?;
    let subtotal_minor = outcome.eligible_subtotal.to_minor_units();

    if subtotal_minor == 0 {
        return Ok(Decimal::ZERO);
    }

    Decimal::from(outcome.discount.to_minor_units())
        .checked_div(Decimal::from(subtotal_minor))
        .ok_or(VoucherError::Overflow)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::VND;
    use testresult::TestResult;

    use crate::{
        cart::BrandId,
        products::ProductDiscount,
        vouchers::VoucherScope,
    };

    use super::*;

    fn single_brand_cart() -> Result<Cart<'static>, crate::cart::CartError> {
        Cart::with_brands(
            [BrandCart::new(
                "lumiere",
                [
                    CartItem::new("a", "serum", Money::from_minor(100_000, VND), 2),
                    CartItem::new("b", "toner", Money::from_minor(50_000, VND), 1)
                        .with_product_discount(ProductDiscount::active(Percentage::from(0.1))),
                ],
            )],
            VND,
        )
    }

    fn two_brand_cart() -> Result<Cart<'static>, crate::cart::CartError> {
        Cart::with_brands(
            [
                BrandCart::new(
                    "lumiere",
                    [
                        CartItem::new("a", "serum", Money::from_minor(100_000, VND), 1),
                        CartItem::new("b", "toner", Money::from_minor(100_000, VND), 1),
                    ],
                ),
                BrandCart::new(
                    "kaya",
                    [CartItem::new("c", "balm", Money::from_minor(80_000, VND), 1)],
                ),
            ],
            VND,
        )
    }

    #[test]
    fn no_platform_voucher_gives_nothing() -> TestResult {
        let cart = single_brand_cart()?;
        let selection = cart.select_all();

        let discount = platform_voucher_discount(&cart, &selection, None, &BrandVouchers::new())?;

        assert_eq!(discount, Money::from_minor(0, VND));

        Ok(())
    }

    #[test]
    fn platform_voucher_applies_after_brand_voucher() -> TestResult {
        let cart = single_brand_cart()?;
        let selection = cart.select_all();

        let brand_vouchers: BrandVouchers<'_> = [(
            BrandId::from("lumiere"),
            Voucher::percentage("LUM10", Percentage::from(0.1)),
        )]
        .into_iter()
        .collect();

        let platform = Voucher::percentage("SHOP10", Percentage::from(0.1));

        let total =
            order_total_after_brand_discounts(&cart, &selection, &platform, &brand_vouchers)?;
        let discount =
            platform_voucher_discount(&cart, &selection, Some(&platform), &brand_vouchers)?;

        assert_eq!(total, Money::from_minor(220_500, VND));
        assert_eq!(discount, Money::from_minor(22_050, VND));

        Ok(())
    }

    #[test]
    fn brand_discount_only_reduces_lines_in_its_scope() -> TestResult {
        let cart = two_brand_cart()?;
        let selection = cart.select_all();

        // 20,000 off the serum only: the serum line drops to 80,000, the toner stays at 100,000.
        let brand_vouchers: BrandVouchers<'_> = [(
            BrandId::from("lumiere"),
            Voucher::amount("SERUM20K", Money::from_minor(20_000, VND))
                .with_scope(VoucherScope::specific(["serum"])),
        )]
        .into_iter()
        .collect();

        let platform = Voucher::percentage("SHOP10", Percentage::from(0.1));

        let total =
            order_total_after_brand_discounts(&cart, &selection, &platform, &brand_vouchers)?;

        assert_eq!(total, Money::from_minor(260_000, VND));

        Ok(())
    }

    #[test]
    fn brand_with_no_eligible_lines_is_skipped() -> TestResult {
        let cart = two_brand_cart()?;
        let selection = cart.select_all();

        // Kaya has a voucher, but none of its lines are in the platform voucher's scope,
        // so it contributes nothing to the platform total.
        let brand_vouchers: BrandVouchers<'_> = [(
            BrandId::from("kaya"),
            Voucher::amount("KAYA10K", Money::from_minor(10_000, VND)),
        )]
        .into_iter()
        .collect();

        let platform = Voucher::percentage("LUMIERE-ONLY", Percentage::from(0.1))
            .with_scope(VoucherScope::specific(["serum", "toner"]));

        let total =
            order_total_after_brand_discounts(&cart, &selection, &platform, &brand_vouchers)?;
        let discount =
            platform_voucher_discount(&cart, &selection, Some(&platform), &brand_vouchers)?;

        assert_eq!(total, Money::from_minor(200_000, VND));
        assert_eq!(discount, Money::from_minor(20_000, VND));

        Ok(())
    }

    #[test]
    fn unselected_brand_is_skipped() -> TestResult {
        let cart = two_brand_cart()?;
        let selection = Selection::from_ids(["c"]);

        let platform = Voucher::amount("OFF5K", Money::from_minor(5_000, VND));

        let total = order_total_after_brand_discounts(
            &cart,
            &selection,
            &platform,
            &BrandVouchers::new(),
        )?;

        assert_eq!(total, Money::from_minor(80_000, VND));

        Ok(())
    }

    #[test]
    fn minimum_order_value_uses_post_brand_total() -> TestResult {
        let cart = single_brand_cart()?;
        let selection = cart.select_all();

        let brand_vouchers: BrandVouchers<'_> = [(
            BrandId::from("lumiere"),
            Voucher::percentage("LUM10", Percentage::from(0.1)),
        )]
        .into_iter()
        .collect();

        // 245,000 before the brand voucher clears the minimum, 220,500 after it does not.
        let platform = Voucher::amount("OFF50K", Money::from_minor(50_000, VND))
            .with_min_order_value(Money::from_minor(230_000, VND));

        let discount =
            platform_voucher_discount(&cart, &selection, Some(&platform), &brand_vouchers)?;

        assert_eq!(discount, Money::from_minor(0, VND));

        Ok(())
    }

    #[test]
    fn platform_discount_is_capped() -> TestResult {
        let cart = single_brand_cart()?;
        let selection = cart.select_all();

        let platform = Voucher::percentage("HALF", Percentage::from(0.5))
            .with_max_discount(Money::from_minor(50_000, VND));

        let discount =
            platform_voucher_discount(&cart, &selection, Some(&platform), &BrandVouchers::new())?;

        assert_eq!(discount, Money::from_minor(50_000, VND));

        Ok(())
    }
}
