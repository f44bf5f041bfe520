//! bitcoinprices Common Types
//!
//! This crate contains the types shared by the rate engine and the page widget:
//! currency codes and the decimal amount helpers used to read prices and rates.

pub mod amount;
pub mod error;
pub mod monetary;

pub use amount::*;
pub use error::*;
pub use monetary::*;
