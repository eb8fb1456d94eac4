//! Error types for the mnemos protocol layer.

mod codec;
mod embedding;
mod memory;

pub use codec::*;
pub use embedding::*;
pub use memory::*;
