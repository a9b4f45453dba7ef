//! Bit-flip accounting: given the XOR of an old and new cacheline, works out
//! how many cells actually changed under several write-reduction schemes.

mod accountant;
mod xor;

pub use accountant::{analyze, FlipReport};
pub use xor::xor_line;
