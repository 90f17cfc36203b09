//! Financing, insurance and valuation quotes for a pre-owned car dealership.
//!
//! Every calculator in [`core`] is a pure function of its request and the
//! shared [`core::RateTables`]; the `carquote` binary in [`cli`] is a thin
//! command-line front end over them.

pub mod cli;
pub mod core;
