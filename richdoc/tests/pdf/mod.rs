//! PDF rendering tests
//!
//! Image sources are served by an in-memory fetcher; nothing here touches
//! the network.

mod render;
