//! Editor JSON codec tests

mod codec;
mod round_trip;
