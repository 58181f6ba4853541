//! Cart
//!
//! A checkout cart: selected lines grouped by the brand that sells them.

use std::fmt;

use rustc_hash::FxHashSet;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::items::{CartItem, CartItemId};

/// Errors related to cart construction or selection.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (line id, line currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(CartItemId, &'static str, &'static str),

    /// The same line id appears more than once.
    #[error("Item {0} appears more than once in the cart")]
    DuplicateItem(CartItemId),

    /// A selected id does not refer to any line in the cart.
    #[error("Item {0} is not in the cart")]
    UnknownItem(CartItemId),
}

/// Opaque brand identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrandId(String);

impl BrandId {
    /// Create a brand identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BrandId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BrandId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The lines a single brand contributes to the cart, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandCart<'a> {
    brand: BrandId,
    items: Vec<CartItem<'a>>,
}

impl<'a> BrandCart<'a> {
    /// Group lines under a brand.
    pub fn new(brand: impl Into<BrandId>, items: impl Into<Vec<CartItem<'a>>>) -> Self {
        Self {
            brand: brand.into(),
            items: items.into(),
        }
    }

    /// Returns the brand
    pub fn brand(&self) -> &BrandId {
        &self.brand
    }

    /// Returns the brand's lines
    pub fn items(&self) -> &[CartItem<'a>] {
        &self.items
    }

    /// Iterate over the brand's lines that are part of `selection`.
    pub fn selected<'s>(
        &'s self,
        selection: &'s Selection,
    ) -> impl Iterator<Item = &'s CartItem<'a>> + 's {
        self.items
            .iter()
            .filter(move |item| selection.contains(item.id()))
    }
}

/// Cart lines grouped by brand, all priced in one currency.
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    brands: Vec<BrandCart<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            brands: Vec::new(),
            currency,
        }
    }

    /// Create a cart from brand groups.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line is priced in another currency or a
    /// line id is used twice.
    pub fn with_brands(
        brands: impl Into<Vec<BrandCart<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let brands = brands.into();
        let mut seen = FxHashSet::default();

        for item in brands.iter().flat_map(BrandCart::items) {
            let item_currency = item.price().currency();

            if item_currency != currency {
                return Err(CartError::CurrencyMismatch(
                    item.id().clone(),
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if !seen.insert(item.id()) {
                return Err(CartError::DuplicateItem(item.id().clone()));
            }
        }

        Ok(Cart { brands, currency })
    }

    /// Returns the brand groups in display order.
    pub fn brands(&self) -> &[BrandCart<'a>] {
        &self.brands
    }

    /// Look up a brand group.
    pub fn brand(&self, brand: &BrandId) -> Option<&BrandCart<'a>> {
        self.brands.iter().find(|group| group.brand() == brand)
    }

    /// Iterate over every line in the cart.
    pub fn items(&self) -> impl Iterator<Item = &CartItem<'a>> {
        self.brands.iter().flat_map(BrandCart::items)
    }

    /// Look up a line by id.
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem<'a>> {
        self.items().find(|item| item.id() == id)
    }

    /// Select every line in the cart.
    pub fn select_all(&self) -> Selection {
        self.items().map(|item| item.id().clone()).collect()
    }

    /// Build a selection, checking that every id refers to a line in this cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownItem`] for the first id not found in the cart.
    pub fn selection<I, T>(&self, ids: I) -> Result<Selection, CartError>
    where
        I: IntoIterator<Item = T>,
        T: Into<CartItemId>,
    {
        ids.into_iter()
            .map(Into::into)
            .map(|id| match self.item(&id) {
                Some(_) => Ok(id),
                None => Err(CartError::UnknownItem(id)),
            })
            .collect()
    }

    /// Number of lines across all brands.
    pub fn len(&self) -> usize {
        self.brands.iter().map(|group| group.items().len()).sum()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// The cart lines the shopper has ticked for checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: FxHashSet<CartItemId>,
}

impl Selection {
    /// Select the given line ids. Ids are not checked against any cart; see
    /// [`Cart::selection`] for that.
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CartItemId>,
    {
        ids.into_iter().map(Into::into).collect()
    }

    /// Whether a line is selected.
    pub fn contains(&self, id: &CartItemId) -> bool {
        self.ids.contains(id)
    }

    /// Add a line to the selection. Returns `false` if it was already selected.
    pub fn insert(&mut self, id: impl Into<CartItemId>) -> bool {
        self.ids.insert(id.into())
    }

    /// Remove a line from the selection. Returns `false` if it was not selected.
    pub fn remove(&mut self, id: &CartItemId) -> bool {
        self.ids.remove(id)
    }

    /// Number of selected lines.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<CartItemId> for Selection {
    fn from_iter<I: IntoIterator<Item = CartItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, VND},
    };
    use testresult::TestResult;

    use super::*;

    fn test_brands<'a>() -> [BrandCart<'a>; 2] {
        [
            BrandCart::new(
                "lumiere",
                [
                    CartItem::new("a", "serum", Money::from_minor(100_000, VND), 2),
                    CartItem::new("b", "toner", Money::from_minor(50_000, VND), 1),
                ],
            ),
            BrandCart::new(
                "kaya",
                [CartItem::new("c", "balm", Money::from_minor(80_000, VND), 1)],
            ),
        ]
    }

    #[test]
    fn with_brands_keeps_order() -> TestResult {
        let cart = Cart::with_brands(test_brands(), VND)?;

        let brands: Vec<&str> = cart.brands().iter().map(|b| b.brand().as_str()).collect();

        assert_eq!(brands, ["lumiere", "kaya"]);
        assert_eq!(cart.len(), 3);
        assert_eq!(cart.currency(), VND);

        Ok(())
    }

    #[test]
    fn with_brands_currency_mismatch_errors() {
        let brands = [BrandCart::new(
            "lumiere",
            [
                CartItem::new("a", "serum", Money::from_minor(100_000, VND), 1),
                CartItem::new("b", "toner", Money::from_minor(500, GBP), 1),
            ],
        )];

        assert_eq!(
            Cart::with_brands(brands, VND).err(),
            Some(CartError::CurrencyMismatch(
                CartItemId::from("b"),
                GBP.iso_alpha_code,
                VND.iso_alpha_code,
            ))
        );
    }

    #[test]
    fn with_brands_duplicate_item_errors() {
        let brands = [
            BrandCart::new(
                "lumiere",
                [CartItem::new("a", "serum", Money::from_minor(100_000, VND), 1)],
            ),
            BrandCart::new(
                "kaya",
                [CartItem::new("a", "balm", Money::from_minor(80_000, VND), 1)],
            ),
        ];

        assert_eq!(
            Cart::with_brands(brands, VND).err(),
            Some(CartError::DuplicateItem(CartItemId::from("a")))
        );
    }

    #[test]
    fn selection_rejects_unknown_ids() -> TestResult {
        let cart = Cart::with_brands(test_brands(), VND)?;

        let selection = cart.selection(["a", "c"])?;

        assert_eq!(selection.len(), 2);
        assert_eq!(
            cart.selection(["a", "z"]),
            Err(CartError::UnknownItem(CartItemId::from("z")))
        );

        Ok(())
    }

    #[test]
    fn select_all_covers_every_line() -> TestResult {
        let cart = Cart::with_brands(test_brands(), VND)?;
        let selection = cart.select_all();

        assert_eq!(selection.len(), cart.len());
        assert!(cart.items().all(|item| selection.contains(item.id())));

        Ok(())
    }

    #[test]
    fn brand_selected_filters_lines() -> TestResult {
        let cart = Cart::with_brands(test_brands(), VND)?;
        let selection = Selection::from_ids(["b"]);

        let lumiere = cart.brand(&BrandId::from("lumiere")).ok_or("missing brand")?;
        let selected: Vec<&str> = lumiere
            .selected(&selection)
            .map(|item| item.id().as_str())
            .collect();

        assert_eq!(selected, ["b"]);

        Ok(())
    }

    #[test]
    fn empty_cart() {
        let cart = Cart::new(GBP);

        assert!(cart.is_empty());
        assert!(cart.select_all().is_empty());
    }
}
