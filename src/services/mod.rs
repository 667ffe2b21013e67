//! Service layer helpers shared by the HTTP surface
//!
//! Upload validation and header decoding live here, separate from the
//! recognition core, so the core only ever sees a validated [`DecodedImage`].
//!
//! [`DecodedImage`]: crate::types::DecodedImage

pub mod io;

pub use io::{ImageIOService, SUPPORTED_CONTENT_TYPES};
