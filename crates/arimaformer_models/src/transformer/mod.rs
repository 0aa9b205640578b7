//! Transformer components.

mod encoder;
mod positional;
mod transam;

pub use encoder::{square_subsequent_mask, TransformerEncoderLayer};
pub use positional::PositionalEncoding;
pub use transam::{TransAm, TransAmConfig};
