//! Embedded sample bundle for demo mode and tests

pub mod data;
