//! Encoding of the finished composite.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError};
