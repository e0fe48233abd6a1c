//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Host the load accounting and operator distribution logic.
//!
//! # Invariants
//! - Services never bypass repository validation or persistence contracts.
//! - Only `contact_service` decides storage scoping (transactions).

pub mod contact_service;
pub mod distribution_service;
pub mod lead_service;
pub mod load_service;
pub mod operator_service;
pub mod source_service;
