//! Domain model for weighted contact distribution.
//!
//! # Responsibility
//! - Define the lead/operator/source/contact records shared by repositories
//!   and services.
//! - Keep validation rules next to the records they protect.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - Operator load is never stored on `Operator`; it only appears in the
//!   read-only `OperatorWithLoad` view.

pub mod contact;
pub mod lead;
pub mod operator;
pub mod source;
pub mod validation;
