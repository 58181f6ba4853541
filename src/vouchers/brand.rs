//! Brand voucher evaluation

use rusty_money::{Money, iso::Currency};
use tracing::debug;

use crate::{
    cart::Selection,
    items::CartItem,
    pricing::total_price,
    vouchers::{Voucher, VoucherError},
};

/// A brand voucher evaluated against a brand's lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandVoucherOutcome<'a> {
    /// Product-discounted total of the selected lines in the voucher's scope.
    pub eligible_subtotal: Money<'a, Currency>,

    /// Discount the voucher gives on that subtotal.
    pub discount: Money<'a, Currency>,
}

/// Product-discounted total of the selected lines in `voucher`'s scope.
///
/// # Errors
///
/// Returns a [`VoucherError`] if a line cannot be priced.
pub fn eligible_subtotal<'a>(
    items: &[CartItem<'a>],
    selection: &Selection,
    voucher: &Voucher<'a>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, VoucherError> {
    let in_scope = items
        .iter()
        .filter(|item| voucher.applies_to(item.product()));

    Ok(total_price(in_scope, selection, currency)?)
}

/// Evaluate a brand voucher against a brand's lines.
///
/// # Errors
///
/// Returns a [`VoucherError`] if a line cannot be priced or the voucher's
/// amounts are in another currency.
pub fn evaluate<'a>(
    items: &[CartItem<'a>],
    selection: &Selection,
    voucher: &Voucher<'a>,
    currency: &'a Currency,
) -> Result<BrandVoucherOutcome<'a>, VoucherError> {
    let eligible_subtotal = eligible_subtotal(items, selection, voucher, currency)?;
    let discount = voucher.discount_on(eligible_subtotal)?;

    debug!(
        voucher = voucher.code(),
        eligible_subtotal = %eligible_subtotal,
        discount = %discount,
        "evaluated brand voucher"
    );

    Ok(BrandVoucherOutcome {
        eligible_subtotal,
        discount,
    })
}

/// Discount a brand voucher gives on a brand's selected lines. No voucher gives nothing.
///
/// # Errors
///
/// See [`evaluate`].
pub fn brand_voucher_discount<'a>(
    items: &[CartItem<'a>],
    selection: &Selection,
    voucher: Option<&Voucher<'a>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, VoucherError> {
    match voucher {
        Some(voucher) => Ok(evaluate(items, selection, voucher, currency)?.discount),
        None => Ok(Money::from_minor(0, currency)),
    }
}

/// Pick the candidate that gives the largest discount on a brand's selected lines.
///
/// The earliest candidate wins a tie. Returns `None` if no candidate gives any discount.
///
/// # Errors
///
/// See [`evaluate`].
pub fn best_brand_voucher<'v, 'a>(
    items: &[CartItem<'a>],
    selection: &Selection,
    candidates: &'v [Voucher<'a>],
    currency: &'a Currency,
) -> Result<Option<(&'v Voucher<'a>, Money<'a, Currency>)>, VoucherError> {
    let mut best: Option<(&'v Voucher<'a>, Money<'a, Currency>)> = None;

    for voucher in candidates {
        let discount = evaluate(items, selection, voucher, currency)?.discount;
        let minor = discount.to_minor_units();

        if minor <= 0 {
            continue;
        }

        if best
            .as_ref()
            .is_none_or(|(_, current)| minor > current.to_minor_units())
        {
            best = Some((voucher, discount));
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::VND;
    use testresult::TestResult;

    use crate::{products::ProductDiscount, vouchers::VoucherScope};

    use super::*;

    fn test_items<'a>() -> [CartItem<'a>; 2] {
        [
            CartItem::new("a", "serum", Money::from_minor(100_000, VND), 2),
            CartItem::new("b", "toner", Money::from_minor(50_000, VND), 1)
                .with_product_discount(ProductDiscount::active(Percentage::from(0.1))),
        ]
    }

    #[test]
    fn no_voucher_gives_nothing() -> TestResult {
        let items = test_items();
        let selection = Selection::from_ids(["a", "b"]);

        assert_eq!(
            brand_voucher_discount(&items, &selection, None, VND)?,
            Money::from_minor(0, VND)
        );

        Ok(())
    }

    #[test]
    fn percentage_voucher_applies_to_product_discounted_subtotal() -> TestResult {
        let items = test_items();
        let selection = Selection::from_ids(["a", "b"]);
        let voucher = Voucher::percentage("LUM10", Percentage::from(0.1))
            .with_min_order_value(Money::from_minor(0, VND))
            .with_max_discount(Money::from_minor(100_000, VND));

        let outcome = evaluate(&items, &selection, &voucher, VND)?;

        assert_eq!(outcome.eligible_subtotal, Money::from_minor(245_000, VND));
        assert_eq!(outcome.discount, Money::from_minor(24_500, VND));

        Ok(())
    }

    #[test]
    fn out_of_scope_items_do_not_count() -> TestResult {
        let items = [CartItem::new("a", "p2", Money::from_minor(100_000, VND), 1)];
        let selection = Selection::from_ids(["a"]);
        let voucher = Voucher::percentage("P1ONLY", Percentage::from(0.5))
            .with_scope(VoucherScope::specific(["p1"]));

        assert_eq!(
            brand_voucher_discount(&items, &selection, Some(&voucher), VND)?,
            Money::from_minor(0, VND)
        );

        Ok(())
    }

    #[test]
    fn unselected_items_do_not_count_towards_minimum() -> TestResult {
        let items = test_items();
        let selection = Selection::from_ids(["b"]);
        let voucher = Voucher::amount("OFF20K", Money::from_minor(20_000, VND))
            .with_min_order_value(Money::from_minor(100_000, VND));

        assert_eq!(
            brand_voucher_discount(&items, &selection, Some(&voucher), VND)?,
            Money::from_minor(0, VND)
        );

        Ok(())
    }

    #[test]
    fn best_voucher_picks_largest_discount() -> TestResult {
        let items = test_items();
        let selection = Selection::from_ids(["a", "b"]);

        let candidates = [
            Voucher::amount("OFF20K", Money::from_minor(20_000, VND)),
            Voucher::percentage("TEN", Percentage::from(0.1)),
            Voucher::amount("OFF50K", Money::from_minor(50_000, VND))
                .with_min_order_value(Money::from_minor(500_000, VND)),
            Voucher::amount("ALSO24500", Money::from_minor(24_500, VND)),
        ];

        let (voucher, discount) =
            best_brand_voucher(&items, &selection, &candidates, VND)?.ok_or("expected a voucher")?;

        assert_eq!(voucher.code(), "TEN");
        assert_eq!(discount, Money::from_minor(24_500, VND));

        Ok(())
    }

    #[test]
    fn best_voucher_is_none_when_nothing_applies() -> TestResult {
        let items = test_items();
        let selection = Selection::default();
        let candidates = [Voucher::percentage("TEN", Percentage::from(0.1))];

        assert!(best_brand_voucher(&items, &selection, &candidates, VND)?.is_none());

        Ok(())
    }
}
