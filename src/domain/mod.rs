//! Domain layer for the ADR dashboard
//!
//! CDD Principle: Domain Model - Pure records for decisions, enforced rules and violations
//! - Contains the ADR document model, the manifest and the violation feed
//! - Independent of HTTP, timers and terminal rendering
//! - Expresses the ubiquitous language of architecture decisions and their enforcement

pub mod adr;
pub mod violations;

// Re-export main domain types for convenience
pub use adr::*;
pub use violations::*;
