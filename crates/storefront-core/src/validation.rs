//! # Validation Module
//!
//! Input validation for the three ledger operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (before any store access)                        │
//! │  ├── Customer fields, cart shape, quantities, costs                    │
//! │  └── Rejects with ValidationError, nothing touched                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stock Invariant Engine (inside the atomic unit)              │
//! │  └── Live existence / active / sufficiency checks                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_quantity >= 0), CHECK (quantity > 0)                 │
//! │  └── Foreign key and UNIQUE constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_quantity, validate_cost};
//! use storefront_core::Money;
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_cost(Money::from_units(-1)).is_err());
//! ```

use crate::cost::UnitCost;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, CustomerInfo, NewProduct};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_ADDRESS_LEN: usize = 500;
const MAX_NOTE_LEN: usize = 1000;

// =============================================================================
// Customer
// =============================================================================

/// Validates and normalizes checkout customer details.
///
/// ## Rules
/// - name, phone, address are required (after trimming)
/// - phone must have at least `min_phone_length` characters
/// - blank notes become `None`
///
/// ## Returns
/// The trimmed customer info that should be persisted.
pub fn validate_customer(
    customer: &CustomerInfo,
    min_phone_length: usize,
) -> ValidationResult<CustomerInfo> {
    let name = required("customer name", &customer.name, MAX_NAME_LEN)?;
    let phone = required("phone", &customer.phone, 20)?;
    if phone.chars().count() < min_phone_length {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: min_phone_length,
        });
    }
    let address = required("address", &customer.address, MAX_ADDRESS_LEN)?;

    Ok(CustomerInfo {
        name,
        phone,
        address,
        notes: optional_text("notes", customer.notes.as_deref(), MAX_NOTE_LEN)?,
    })
}

/// Trims and length-checks an optional free-text field.
///
/// Blank input collapses to `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

fn required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(value.to_string())
}

// =============================================================================
// Catalog
// =============================================================================

/// Validates and normalizes a catalog entry.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<NewProduct> {
    let category = optional_text("category", Some(&product.category), MAX_NAME_LEN)?
        .unwrap_or_else(|| "general".to_string());
    validate_price(product.price)?;
    validate_cost(product.cost_price)?;
    if product.stock_quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock quantity".to_string(),
        });
    }

    Ok(NewProduct {
        name: required("product name", &product.name, MAX_NAME_LEN)?,
        description: optional_text("description", product.description.as_deref(), MAX_NOTE_LEN)?,
        category,
        price: product.price,
        cost_price: product.cost_price,
        stock_quantity: product.stock_quantity,
        is_active: product.is_active,
    })
}

// =============================================================================
// Cart
// =============================================================================

/// Validates the shape of a cart before placement.
///
/// ## Rules
/// - at least one line, at most `MAX_ORDER_LINES`
/// - every line has a well-formed product id and a valid quantity
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    for line in lines {
        validate_uuid("product id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a received batch quantity.
///
/// Inbound batches are not capped like cart lines; they only need to be
/// strictly positive.
pub fn validate_inbound_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity added".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit cost, either a batch cost or an average. Zero is
/// allowed (free samples, gifts).
pub fn validate_cost(cost: impl Into<UnitCost>) -> ValidationResult<()> {
    if cost.into().is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "cost price".to_string(),
        });
    }
    Ok(())
}

/// Validates a selling price. Zero is allowed.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_uuid;
///
/// assert!(validate_uuid("order id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("order id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
