pub mod container;
pub mod decoder;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod packer;

pub use self::{
    container::{compress, compress_to, decompress, decompress_to, Container},
    decoder::Decoder,
    error::{DecodeError, Error, Result},
    frequency::Frequencies,
    huffman::{Encoder, Node},
    packer::{Packed, Packer},
};
