//! # Error Types
//!
//! Domain-specific error types for zato-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  zato-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  zato-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── ServiceError     - CoreError ∪ DbError at the service seam     │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → ServiceError → Caller          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available stock, ...)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found, or is not owned by the caller.
    ///
    /// Owner scoping is the tenancy boundary: a product belonging to a
    /// different account is reported exactly like a missing one, so the
    /// error never leaks another tenant's data.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Several referenced products are missing or not owned by the caller.
    ///
    /// Used by sale settlement, which resolves the whole cart in one read
    /// and reports every unresolvable id at once.
    #[error("Products not found: {}", ids.join(", "))]
    ProductsNotFound { ids: Vec<String> },

    /// Insufficient stock to complete the mutation.
    ///
    /// ## When This Occurs
    /// - Selling more than available stock
    /// - An `out` movement that would drive stock below zero
    ///
    /// The available/requested context is mandatory: callers must be able
    /// to tell the user which product lacked stock, and by how much.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found, or not owned by the caller.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid characters in a SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
