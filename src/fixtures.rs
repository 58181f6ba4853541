//! Fixtures
//!
//! YAML carts and vouchers for demos and tests, loaded from
//! `<base>/carts/<name>.yml` and `<base>/vouchers/<name>.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{BrandId, Cart, CartError},
    fixtures::{
        carts::CartFixture,
        vouchers::{LoadedVoucher, VouchersFixture},
    },
    vouchers::{BrandVouchers, Voucher, VoucherLevel},
};

pub mod carts;
pub mod vouchers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown product discount status
    #[error("Invalid discount status: {0}")]
    InvalidDiscountStatus(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Voucher not found
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    /// Invalid voucher data
    #[error("Invalid voucher data: {0}")]
    InvalidVoucher(String),

    /// Voucher issued at another level
    #[error("Voucher {code} is not a {expected} voucher")]
    WrongVoucherLevel {
        /// Voucher code
        code: String,
        /// Level the caller asked for
        expected: VoucherLevel,
    },

    /// Brand voucher chosen for a brand that did not issue it
    #[error("Voucher {code} was not issued by brand {brand}")]
    VoucherBrandMismatch {
        /// Voucher code
        code: String,
        /// Brand it was chosen for
        brand: BrandId,
    },

    /// Currency mismatch between prices
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Nothing priced loaded yet
    #[error("No prices loaded yet; currency unknown")]
    NoCurrency,

    /// No cart loaded
    #[error("No cart loaded")]
    NoCart,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    cart: Option<Cart<'a>>,

    /// Voucher code -> voucher
    vouchers: FxHashMap<String, LoadedVoucher<'a>>,

    /// Currency of the money-valued vouchers loaded so far
    voucher_currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cart: None,
            vouchers: FxHashMap::default(),
            voucher_currency: None,
        }
    }

    /// Load a cart from a YAML fixture file, replacing any loaded cart
    ///
    /// The replacement may be priced in a different currency, unless
    /// money-valued vouchers are already loaded in another one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if there are
    /// currency mismatches, or if the cart is empty.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        let mut currency = self.voucher_currency;
        let mut brands = Vec::with_capacity(fixture.brands.len());

        for brand in fixture.brands {
            brands.push(brand.try_into_brand_cart(&mut currency)?);
        }

        let currency = currency.ok_or(FixtureError::NoCurrency)?;
        let cart = Cart::with_brands(brands, currency)?;

        debug!(fixture = name, brands = cart.brands().len(), items = cart.len(), "loaded cart");

        self.cart = Some(cart);

        Ok(self)
    }

    /// Load vouchers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a voucher is
    /// invalid, or a voucher amount is in a different currency from the cart.
    /// Nothing is added when an error is returned.
    pub fn load_vouchers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("vouchers").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: VouchersFixture = serde_norway::from_str(&contents)?;

        let mut voucher_currency = self.voucher_currency;
        let mut loaded = Vec::with_capacity(fixture.vouchers.len());

        for (code, voucher_fixture) in fixture.vouchers {
            let voucher = voucher_fixture.try_into_voucher(&code, &mut voucher_currency)?;

            loaded.push((code, voucher));
        }

        if let (Some(cart), Some(vouchers)) = (&self.cart, voucher_currency)
            && cart.currency() != vouchers
        {
            return Err(FixtureError::CurrencyMismatch(
                cart.currency().iso_alpha_code.to_string(),
                vouchers.iso_alpha_code.to_string(),
            ));
        }

        self.vouchers.extend(loaded);
        self.voucher_currency = voucher_currency;

        debug!(fixture = name, vouchers = self.vouchers.len(), "loaded vouchers");

        Ok(self)
    }

    /// Load a complete fixture set (cart and vouchers with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_cart(name)?.load_vouchers(name)?;

        Ok(fixture)
    }

    /// Get the loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded.
    pub fn cart(&self) -> Result<&Cart<'a>, FixtureError> {
        self.cart.as_ref().ok_or(FixtureError::NoCart)
    }

    /// Get a voucher of either level by its code
    ///
    /// # Errors
    ///
    /// Returns an error if the voucher is not found.
    pub fn voucher(&self, code: &str) -> Result<&LoadedVoucher<'a>, FixtureError> {
        self.vouchers
            .get(code)
            .ok_or_else(|| FixtureError::VoucherNotFound(code.to_string()))
    }

    /// Get a brand voucher and its issuing brand by code
    ///
    /// # Errors
    ///
    /// Returns an error if the voucher is not found or is a platform voucher.
    pub fn brand_voucher(&self, code: &str) -> Result<(&BrandId, &Voucher<'a>), FixtureError> {
        match self.voucher(code)? {
            LoadedVoucher::Brand(brand, voucher) => Ok((brand, voucher)),
            LoadedVoucher::Platform(_) => Err(FixtureError::WrongVoucherLevel {
                code: code.to_string(),
                expected: VoucherLevel::Brand,
            }),
        }
    }

    /// Get a platform voucher by code
    ///
    /// # Errors
    ///
    /// Returns an error if the voucher is not found or is a brand voucher.
    pub fn platform_voucher(&self, code: &str) -> Result<&Voucher<'a>, FixtureError> {
        match self.voucher(code)? {
            LoadedVoucher::Platform(voucher) => Ok(voucher),
            LoadedVoucher::Brand(..) => Err(FixtureError::WrongVoucherLevel {
                code: code.to_string(),
                expected: VoucherLevel::Platform,
            }),
        }
    }

    /// Vouchers issued by `brand`, ordered by code
    pub fn vouchers_for_brand(&self, brand: &BrandId) -> Vec<Voucher<'a>> {
        let mut vouchers: Vec<Voucher<'a>> = self
            .vouchers
            .values()
            .filter_map(|loaded| match loaded {
                LoadedVoucher::Brand(issuer, voucher) if issuer == brand => Some(voucher.clone()),
                _ => None,
            })
            .collect();

        vouchers.sort_by(|a, b| a.code().cmp(b.code()));

        vouchers
    }

    /// Build the per-brand voucher choice from `(brand, code)` pairs
    ///
    /// # Errors
    ///
    /// Returns an error if a code is unknown, is a platform voucher, or was
    /// issued by a different brand.
    pub fn brand_vouchers<I, B, C>(&self, choices: I) -> Result<BrandVouchers<'a>, FixtureError>
    where
        I: IntoIterator<Item = (B, C)>,
        B: Into<BrandId>,
        C: AsRef<str>,
    {
        let mut chosen = BrandVouchers::new();

        for (brand, code) in choices {
            let brand = brand.into();
            let (issuer, voucher) = self.brand_voucher(code.as_ref())?;

            if issuer != &brand {
                return Err(FixtureError::VoucherBrandMismatch {
                    code: code.as_ref().to_string(),
                    brand,
                });
            }

            chosen.insert(brand, voucher.clone());
        }

        Ok(chosen)
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if nothing priced has been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.cart
            .as_ref()
            .map(Cart::currency)
            .or(self.voucher_currency)
            .ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rusty_money::iso::{GBP, USD, VND};
    use testresult::TestResult;

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_from_set_loads_cart_and_vouchers() -> TestResult {
        let fixture = Fixture::from_set("marketplace")?;
        let cart = fixture.cart()?;

        assert_eq!(cart.currency(), VND);
        assert!(!cart.is_empty());
        assert!(fixture.platform_voucher("SHOP10").is_ok());
        assert_eq!(fixture.currency()?, VND);

        Ok(())
    }

    #[test]
    fn fixture_cart_not_loaded_returns_error() {
        let fixture = Fixture::new();

        assert!(matches!(fixture.cart(), Err(FixtureError::NoCart)));
    }

    #[test]
    fn fixture_voucher_not_found_returns_error() {
        let fixture = Fixture::new();

        assert!(matches!(
            fixture.voucher("NOPE"),
            Err(FixtureError::VoucherNotFound(_))
        ));
    }

    #[test]
    fn fixture_loads_from_custom_base_path() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "carts",
            "tiny",
            "brands:\n  - brand: acme\n    items:\n      - id: a\n        product: widget\n        price: \"2.50 GBP\"\n        quantity: 2\n",
        )?;

        write_fixture(
            dir.path(),
            "vouchers",
            "tiny",
            "vouchers:\n  ACME1:\n    level: brand\n    brand: acme\n    amount: \"1.00 GBP\"\n  ALL5:\n    level: platform\n    percentage: \"5%\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_cart("tiny")?.load_vouchers("tiny")?;

        assert_eq!(fixture.cart()?.len(), 1);
        assert_eq!(fixture.brand_voucher("ACME1")?.0.as_str(), "acme");
        assert!(matches!(
            fixture.brand_voucher("ALL5"),
            Err(FixtureError::WrongVoucherLevel {
                expected: VoucherLevel::Brand,
                ..
            })
        ));
        assert!(matches!(
            fixture.platform_voucher("ACME1"),
            Err(FixtureError::WrongVoucherLevel {
                expected: VoucherLevel::Platform,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn fixture_rejects_voucher_currency_mismatch() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "carts",
            "mixed",
            "brands:\n  - brand: acme\n    items:\n      - id: a\n        product: widget\n        price: \"2.50 GBP\"\n",
        )?;

        write_fixture(
            dir.path(),
            "vouchers",
            "mixed",
            "vouchers:\n  OFF1:\n    level: platform\n    amount: \"1.00 USD\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_cart("mixed")?;

        assert!(matches!(
            fixture.load_vouchers("mixed"),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));
        assert!(matches!(
            fixture.voucher("OFF1"),
            Err(FixtureError::VoucherNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn replacing_cart_takes_the_new_cart_currency() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "carts",
            "pounds",
            "brands:\n  - brand: acme\n    items:\n      - id: a\n        product: widget\n        price: \"2.50 GBP\"\n",
        )?;

        write_fixture(
            dir.path(),
            "carts",
            "dollars",
            "brands:\n  - brand: acme\n    items:\n      - id: a\n        product: widget\n        price: \"3.10 USD\"\n",
        )?;

        write_fixture(
            dir.path(),
            "vouchers",
            "dollars",
            "vouchers:\n  OFF1:\n    level: platform\n    amount: \"1.00 USD\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_cart("pounds")?;
        assert_eq!(fixture.currency()?, GBP);

        fixture.load_cart("dollars")?.load_vouchers("dollars")?;

        assert_eq!(fixture.currency()?, USD);
        assert_eq!(fixture.cart()?.currency(), USD);
        assert!(fixture.platform_voucher("OFF1").is_ok());

        Ok(())
    }

    #[test]
    fn replacing_cart_keeps_voucher_currency() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "vouchers",
            "pounds",
            "vouchers:\n  OFF1:\n    level: platform\n    amount: \"1.00 GBP\"\n",
        )?;

        write_fixture(
            dir.path(),
            "carts",
            "dollars",
            "brands:\n  - brand: acme\n    items:\n      - id: a\n        product: widget\n        price: \"3.10 USD\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_vouchers("pounds")?;

        assert!(matches!(
            fixture.load_cart("dollars"),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));
        assert!(matches!(fixture.cart(), Err(FixtureError::NoCart)));
        assert_eq!(fixture.currency()?, GBP);

        Ok(())
    }

    #[test]
    fn brand_vouchers_rejects_voucher_from_another_brand() -> TestResult {
        let fixture = Fixture::from_set("marketplace")?;

        let result = fixture.brand_vouchers([("kaya", "LUM10")]);

        assert!(matches!(
            result,
            Err(FixtureError::VoucherBrandMismatch { .. })
        ));

        Ok(())
    }
}
