//! Legacy HTML import tests
//!
//! Stored HTML records are imported once and written back as JSON.

mod import;
mod upgrade;
