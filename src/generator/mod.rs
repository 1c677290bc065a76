//! Image-generation seam
//!
//! The actual API transport lives outside this crate; the scheduler only
//! needs an async operation that settles with an image payload or an error
//! whose message may indicate rate limiting.

mod client;
mod error;

pub use client::{EncodedImage, ImageGenerator};
pub use error::GenerateError;
