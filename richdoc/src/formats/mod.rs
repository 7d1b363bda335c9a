//! Format implementations
//!
//! This module contains the format implementations that convert between the
//! document model and its stored or rendered representations.

pub mod html;
pub mod json;
pub mod pdf;
pub mod treeviz;

pub use html::HtmlFormat;
pub use json::JsonFormat;
pub use pdf::PdfFormat;
pub use treeviz::TreevizFormat;
