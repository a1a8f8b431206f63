//! Verification of collected diagnostic bundles

pub mod checks;
pub mod error;
pub mod layout;
pub mod parsers;
pub mod verifier;


// Re-export commonly used items
pub use verifier::BundleVerifier;
