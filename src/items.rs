//! Items

use std::fmt;

use rusty_money::{Money, iso::Currency};

use crate::{
    discounts::SimpleDiscount,
    products::{ProductDiscount, ProductId},
};

/// Opaque cart line identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CartItemId(String);

impl CartItemId {
    /// Create a cart item identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CartItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CartItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The product classification a line refers to: unit price and quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<'a> {
    /// Unit price before any discount
    pub price: Money<'a, Currency>,

    /// Number of units
    pub quantity: u32,
}

/// A cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem<'a> {
    id: CartItemId,
    product: ProductId,
    classification: Classification<'a>,
    product_discount: Option<ProductDiscount>,
}

impl<'a> CartItem<'a> {
    /// Creates a new cart line without a product discount.
    pub fn new(
        id: impl Into<CartItemId>,
        product: impl Into<ProductId>,
        price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            product: product.into(),
            classification: Classification { price, quantity },
            product_discount: None,
        }
    }

    /// Attach a direct product discount to the line.
    #[must_use]
    pub fn with_product_discount(mut self, discount: ProductDiscount) -> Self {
        self.product_discount = Some(discount);
        self
    }

    /// Returns the line identifier
    pub fn id(&self) -> &CartItemId {
        &self.id
    }

    /// Returns the product identifier
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Returns the product classification
    pub fn classification(&self) -> &Classification<'a> {
        &self.classification
    }

    /// Returns the unit price before any discount
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.classification.price
    }

    /// Returns the quantity
    pub fn quantity(&self) -> u32 {
        self.classification.quantity
    }

    /// Returns the direct product discount, active or not.
    pub fn product_discount(&self) -> Option<&ProductDiscount> {
        self.product_discount.as_ref()
    }

    /// The product discount to apply to the unit price, if any is active.
    pub fn applicable_product_discount(&self) -> Option<SimpleDiscount<'a>> {
        self.product_discount
            .as_ref()
            .and_then(ProductDiscount::applicable)
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::VND;

    use crate::products::DiscountStatus;

    use super::*;

    #[test]
    fn accessors_return_constructor_values() {
        let item = CartItem::new("line-1", "serum", Money::from_minor(100_000, VND), 2);

        assert_eq!(item.id().as_str(), "line-1");
        assert_eq!(item.product().as_str(), "serum");
        assert_eq!(item.price(), &Money::from_minor(100_000, VND));
        assert_eq!(item.quantity(), 2);
        assert!(item.product_discount().is_none());
    }

    #[test]
    fn inactive_product_discount_is_not_applicable() {
        let item = CartItem::new("line-1", "serum", Money::from_minor(100_000, VND), 1)
            .with_product_discount(ProductDiscount {
                discount: Percentage::from(0.1),
                status: DiscountStatus::Expired,
            });

        assert!(item.product_discount().is_some());
        assert_eq!(item.applicable_product_discount(), None);
    }
}
