//! End-to-end tests for the farol interpreter live in `tests/`; this crate
//! intentionally exports nothing.
