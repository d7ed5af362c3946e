//! Checkout form validation and order snapshots.
//!
//! [`finalize`] never touches the caller's ledger. On success it returns the
//! order snapshot together with the (empty) ledger to store; on failure the
//! caller still holds the untouched ledger and the submitted form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLedger, CartSummary, ProductLookup};
use crate::types::Email;

/// Session key holding the last completed order until it is displayed.
pub const ORDER_SESSION_KEY: &str = "last_order";

/// Longest accepted phone number.
pub const PHONE_MAX_LENGTH: usize = 30;

/// Checkout fields exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutField {
    FullName,
    Address,
    Phone,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: CheckoutField,
    pub message: String,
}

impl FieldError {
    fn new(field: CheckoutField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing in the cart resolves to a catalog product.
    #[error("cart is empty")]
    EmptyCart,
    #[error("checkout form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
}

/// Validated shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub full_name: Option<String>,
    pub address: String,
    pub phone: String,
    pub email: Option<Email>,
}

impl CheckoutForm {
    /// Validate the submitted fields.
    ///
    /// # Errors
    ///
    /// Returns every field error found: a blank address or phone, a phone
    /// longer than [`PHONE_MAX_LENGTH`], or an email that does not parse.
    pub fn validate(&self) -> Result<ShippingDetails, Vec<FieldError>> {
        let mut errors = Vec::new();

        let address = self.address.trim();
        if address.is_empty() {
            errors.push(FieldError::new(CheckoutField::Address, "This field is required."));
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.push(FieldError::new(CheckoutField::Phone, "This field is required."));
        } else if phone.chars().count() > PHONE_MAX_LENGTH {
            errors.push(FieldError::new(
                CheckoutField::Phone,
                format!("Ensure this value has at most {PHONE_MAX_LENGTH} characters."),
            ));
        }

        let email = match self.email.trim() {
            "" => None,
            raw => match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.push(FieldError::new(
                        CheckoutField::Email,
                        format!("Enter a valid email address ({e})."),
                    ));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let full_name = Some(self.full_name.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Ok(ShippingDetails {
            full_name,
            address: address.to_owned(),
            phone: phone.to_owned(),
            email,
        })
    }
}

/// One-shot summary written to the session after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub total: Decimal,
    pub item_count: u64,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub order: OrderSnapshot,
    /// Ledger to store in place of the checked-out one.
    pub cart: CartLedger,
}

/// Finalize a checkout.
///
/// # Errors
///
/// [`CheckoutError::EmptyCart`] if no ledger entry resolves against
/// `catalog`; [`CheckoutError::Invalid`] if the form does not validate.
pub fn finalize(
    ledger: &CartLedger,
    catalog: &impl ProductLookup,
    form: &CheckoutForm,
) -> Result<Completed, CheckoutError> {
    let summary = ledger.resolve(catalog);
    finalize_summary(&summary, form)
}

/// Finalize against a summary the caller already resolved.
///
/// # Errors
///
/// Same as [`finalize`].
pub fn finalize_summary(
    summary: &CartSummary,
    form: &CheckoutForm,
) -> Result<Completed, CheckoutError> {
    if summary.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let shipping = form.validate().map_err(CheckoutError::Invalid)?;

    Ok(Completed {
        order: OrderSnapshot {
            shipping,
            total: summary.total,
            item_count: summary.item_count(),
        },
        cart: CartLedger::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroU32;

    use super::*;
    use crate::catalog::Product;
    use crate::types::ProductId;

    fn catalog() -> HashMap<ProductId, Product> {
        [(3, "10.00"), (7, "25.00")]
            .into_iter()
            .map(|(n, price)| {
                let id = ProductId::new(n);
                (
                    id,
                    Product {
                        id,
                        name: format!("Part {n}"),
                        brand: None,
                        category: "Tires".to_owned(),
                        price: price.parse().unwrap(),
                        image: None,
                        image_url: None,
                    },
                )
            })
            .collect()
    }

    fn ledger() -> CartLedger {
        CartLedger::new()
            .add(ProductId::new(3), NonZeroU32::new(2).unwrap())
            .add(ProductId::new(7), NonZeroU32::new(1).unwrap())
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            full_name: "  Ada Rider ".to_owned(),
            address: "1 Chainring Rd".to_owned(),
            phone: "+1 555 0100".to_owned(),
            email: String::new(),
        }
    }

    #[test]
    fn test_finalize_snapshots_total_and_clears_cart() {
        let ledger = ledger();
        let done = finalize(&ledger, &catalog(), &valid_form()).unwrap();

        assert_eq!(done.order.total.to_string(), "45.00");
        assert_eq!(done.order.item_count, 3);
        assert_eq!(done.order.shipping.full_name.as_deref(), Some("Ada Rider"));
        assert_eq!(done.order.shipping.email, None);
        assert!(done.cart.is_empty());
        // The caller's ledger is untouched until it stores `done.cart`.
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_finalize_refuses_empty_cart() {
        let err = finalize(&CartLedger::new(), &catalog(), &valid_form()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn test_finalize_refuses_cart_of_deleted_products() {
        let stale = CartLedger::new().add(ProductId::new(99), NonZeroU32::new(1).unwrap());
        let err = finalize(&stale, &catalog(), &valid_form()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn test_finalize_empty_cart_checked_before_form() {
        let err = finalize(&CartLedger::new(), &catalog(), &CheckoutForm::default()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn test_missing_address_and_phone() {
        let form = CheckoutForm {
            address: "   ".to_owned(),
            phone: String::new(),
            ..valid_form()
        };
        let CheckoutError::Invalid(errors) = finalize(&ledger(), &catalog(), &form).unwrap_err()
        else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![CheckoutField::Address, CheckoutField::Phone]);
    }

    #[test]
    fn test_phone_too_long() {
        let form = CheckoutForm {
            phone: "1".repeat(31),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some(CheckoutField::Phone));
    }

    #[test]
    fn test_optional_email_validated_when_present() {
        let form = CheckoutForm {
            email: "not-an-email".to_owned(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.first().map(|e| e.field), Some(CheckoutField::Email));

        let form = CheckoutForm {
            email: "ada@example.com".to_owned(),
            ..valid_form()
        };
        assert!(form.validate().unwrap().email.is_some());
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let done = finalize(&ledger(), &catalog(), &valid_form()).unwrap();
        let value = serde_json::to_value(&done.order).unwrap();
        assert_eq!(value["total"], "45.00");
        assert_eq!(value["address"], "1 Chainring Rd");
        assert_eq!(value["item_count"], 3);

        let back: OrderSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, done.order);
    }
}
