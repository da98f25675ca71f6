//! # simflow-core: Pure Business Logic for simflow
//!
//! This crate is the **heart** of simflow. It contains all business rules
//! for the credit-gated ordering and billing model as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        simflow Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Backend API (external)                          │   │
//! │  │   catalog store ── account store ── payments ── notifications   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   simflow-engine                                │   │
//! │  │   stock ledger ── credit ledger ── authorizer ── invoicing      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ simflow-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ promotion │  │ validation│  │   │
//! │  │   │  Catalog  │  │   Money   │  │ evaluate  │  │   rules   │  │   │
//! │  │   │  Order..  │  │ bps math  │  │  (pure)   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK READS • NO LOCKS • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Promotion, Order, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`promotion`] - Pure promo-code evaluation
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; `now` is always a parameter
//! 2. **No I/O**: network, storage, and clocks are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{PromotionError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum units of an ePIN product on a single order line.
///
/// ## Business Reason
/// ePIN codes are sold in small batches; anything larger goes through a
/// dedicated bulk channel outside this engine.
pub const MAX_EPIN_QUANTITY: i64 = 5;

/// Maximum lines on a single order request.
///
/// ## Business Reason
/// Keeps authorization short-lived: every line takes a stock-pool lock in
/// turn, and a runaway request must not hold the catalog hostage.
pub const MAX_ORDER_LINES: usize = 50;

/// Credit-usage alert threshold in basis points (90%).
pub const CREDIT_WARN_BPS: u32 = 9000;

/// Credit-usage exhaustion threshold in basis points (100%).
pub const CREDIT_FULL_BPS: u32 = 10000;

/// Days between invoice issue and due date.
pub const INVOICE_DUE_DAYS: i64 = 7;
