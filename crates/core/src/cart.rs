//! Session cart ledger.
//!
//! The ledger maps product IDs to positive quantities. It lives in the
//! visitor's session as a JSON object keyed by the stringified product ID
//! (`{"3": 2, "7": 1}`) and is treated as a plain value: every operation
//! consumes a ledger and returns the updated one, and the caller decides when
//! to write it back.
//!
//! Prices are never stored in the ledger. [`CartLedger::resolve`] joins the
//! entries against catalog products fetched for the current request, so
//! subtotals always reflect current prices and entries whose product has been
//! deleted simply drop out of the summary.
//!
//! Two requests from the same session each read, modify, and write the whole
//! ledger; the later write wins.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Product;
use crate::types::ProductId;
use crate::types::price::quantize;

/// Session key holding the ledger.
pub const SESSION_KEY: &str = "cart_v1";

/// Reasons a stored session value could not be read as a ledger.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("cart must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("cart key {0:?} is not a product id")]
    InvalidKey(String),
    #[error("quantity for product {0} is not an integer")]
    InvalidQuantity(String),
}

/// Reasons a cart request payload was rejected.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("quantity must be a whole number, got {0:?}")]
    NotANumber(String),
    #[error("quantity to add must be at least 1")]
    NonPositiveAdd,
}

/// Mapping of product ID to quantity. Every stored quantity is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartLedger {
    lines: BTreeMap<ProductId, NonZeroU32>,
}

impl CartLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a ledger back from its session representation.
    ///
    /// Quantities may be JSON integers, floats (truncated), or numeric
    /// strings. Entries whose quantity coerces to zero or less are dropped.
    /// `null` is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] for anything that is not an object of
    /// product-id keys and numeric quantities. Callers treat that as an empty
    /// cart.
    pub fn decode(value: &Value) -> Result<Self, LedgerError> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => return Err(LedgerError::NotAnObject(json_type(other))),
        };

        let mut lines = BTreeMap::new();
        for (key, raw_quantity) in map {
            let id: ProductId = key
                .parse()
                .map_err(|_| LedgerError::InvalidKey(key.clone()))?;
            let quantity = coerce_quantity(raw_quantity)
                .ok_or_else(|| LedgerError::InvalidQuantity(key.clone()))?;
            if let Some(quantity) = clamp_quantity(quantity) {
                lines.insert(id, quantity);
            }
        }
        Ok(Self { lines })
    }

    /// Increase the quantity of `product_id` by `quantity`, creating the entry
    /// if needed.
    #[must_use]
    pub fn add(mut self, product_id: ProductId, quantity: NonZeroU32) -> Self {
        self.lines
            .entry(product_id)
            .and_modify(|q| *q = q.saturating_add(quantity.get()))
            .or_insert(quantity);
        self
    }

    /// Replace the quantity of `product_id`. Zero or less removes the entry.
    #[must_use]
    pub fn set_quantity(mut self, product_id: ProductId, quantity: i64) -> Self {
        match clamp_quantity(quantity) {
            Some(quantity) => {
                self.lines.insert(product_id, quantity);
            }
            None => {
                self.lines.remove(&product_id);
            }
        }
        self
    }

    /// Drop the entry for `product_id` if there is one.
    #[must_use]
    pub fn remove(mut self, product_id: ProductId) -> Self {
        self.lines.remove(&product_id);
        self
    }

    #[must_use]
    pub fn apply(self, command: CartCommand) -> Self {
        match command {
            CartCommand::Add {
                product_id,
                quantity,
            } => self.add(product_id, quantity),
            CartCommand::SetQuantity {
                product_id,
                quantity,
            } => self.set_quantity(product_id, quantity),
            CartCommand::Remove { product_id } => self.remove(product_id),
        }
    }

    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
        self.lines.get(&product_id).map(|q| q.get())
    }

    /// Sum of every stored quantity, including entries whose product no
    /// longer exists. Used for the cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|q| u64::from(q.get())).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Product IDs in the ledger, in ascending order.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.lines.keys().copied()
    }

    /// Join the ledger against catalog products.
    ///
    /// Entries missing from `catalog` are skipped silently. Subtotals and the
    /// total are computed now, from the prices in `catalog`.
    #[must_use]
    pub fn resolve(&self, catalog: &impl ProductLookup) -> CartSummary {
        let lines: Vec<CartLine> = self
            .lines
            .iter()
            .filter_map(|(id, quantity)| {
                let product = catalog.lookup(*id)?;
                Some(CartLine {
                    subtotal: product.price.times(quantity.get()),
                    quantity: quantity.get(),
                    product: product.clone(),
                })
            })
            .collect();

        let total = quantize(lines.iter().map(|line| line.subtotal).sum());
        CartSummary { lines, total }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[allow(clippy::cast_possible_truncation)] // float quantities are truncated on purpose
fn coerce_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_quantity(quantity: i64) -> Option<NonZeroU32> {
    if quantity <= 0 {
        return None;
    }
    NonZeroU32::new(u32::try_from(quantity).unwrap_or(u32::MAX))
}

/// Lookup of catalog products by ID.
pub trait ProductLookup {
    fn lookup(&self, id: ProductId) -> Option<&Product>;
}

impl ProductLookup for HashMap<ProductId, Product> {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.get(&id)
    }
}

impl ProductLookup for [Product] {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.iter().find(|p| p.id == id)
    }
}

impl ProductLookup for Vec<Product> {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.as_slice().lookup(id)
    }
}

/// A typed cart mutation parsed from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    Add {
        product_id: ProductId,
        quantity: NonZeroU32,
    },
    SetQuantity {
        product_id: ProductId,
        quantity: i64,
    },
    Remove {
        product_id: ProductId,
    },
}

impl CartCommand {
    /// Parse an add-to-cart request. A missing quantity means 1.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the quantity is not an integer or is below 1.
    pub fn add(product_id: ProductId, raw_quantity: Option<&str>) -> Result<Self, CommandError> {
        let quantity = parse_quantity(raw_quantity)?;
        let quantity = clamp_quantity(quantity).ok_or(CommandError::NonPositiveAdd)?;
        Ok(Self::Add {
            product_id,
            quantity,
        })
    }

    /// Parse a quantity update. A missing quantity means 1; zero or a
    /// negative number removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotANumber`] if the quantity is not an integer.
    pub fn set_quantity(
        product_id: ProductId,
        raw_quantity: Option<&str>,
    ) -> Result<Self, CommandError> {
        Ok(Self::SetQuantity {
            product_id,
            quantity: parse_quantity(raw_quantity)?,
        })
    }

    #[must_use]
    pub const fn remove(product_id: ProductId) -> Self {
        Self::Remove { product_id }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match self {
            Self::Add { product_id, .. }
            | Self::SetQuantity { product_id, .. }
            | Self::Remove { product_id } => *product_id,
        }
    }
}

fn parse_quantity(raw: Option<&str>) -> Result<i64, CommandError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(s) => s
            .parse()
            .map_err(|_| CommandError::NotANumber(s.to_owned())),
    }
}

/// One resolved cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// The ledger joined against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    /// Sum of the line subtotals, quantized to cents.
    pub total: Decimal,
}

impl CartSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn subtotal_for(&self, product_id: ProductId) -> Option<Decimal> {
        self.lines
            .iter()
            .find(|line| line.product.id == product_id)
            .map(|line| line.subtotal)
    }

    /// Units across resolved lines only.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
