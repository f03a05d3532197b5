use crate::{
    error::{DecodeError, Result},
    huffman::Node,
};
use bitvec::prelude::*;

/// Walks a Huffman tree bit by bit to turn a packed stream back into bytes.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    root: &'a Node,
}

impl<'a> Decoder<'a> {
    pub fn new(root: &'a Node) -> Self {
        Decoder { root }
    }

    pub fn decode(&self, packed: &[u8], padding: u8) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.decode_into(packed, padding, &mut output)?;
        Ok(output)
    }

    /// Decodes `packed` and appends the symbols to `output`, returning how
    /// many were appended.
    ///
    /// The low `padding` bits of the last byte are ignored. A stream that
    /// stops part way down the tree is rejected with
    /// [`DecodeError::TruncatedCode`], a set bit under a single leaf tree
    /// with [`DecodeError::InvalidCode`].
    pub fn decode_into(&self, packed: &[u8], padding: u8, output: &mut Vec<u8>) -> Result<usize> {
        if padding > 7 {
            return Err(DecodeError::InvalidPadding(padding.into()).into());
        }
        if packed.is_empty() {
            return Err(DecodeError::EmptyStream.into());
        }

        let bits = packed.view_bits::<Msb0>();
        let bits = &bits[..bits.len() - usize::from(padding)];
        let start = output.len();

        match self.root {
            // the lone code is a single 0 bit
            Node::Leaf { symbol, .. } => {
                if let Some(index) = bits.first_one() {
                    log::debug!("bit {index} is set in a single symbol stream");
                    return Err(DecodeError::InvalidCode.into());
                }
                output.resize(start + bits.len(), *symbol);
            }
            Node::Internal { left, right, .. } => {
                let root = (left.as_ref(), right.as_ref());
                let mut cursor = root;
                let mut depth = 0usize;

                for bit in bits.iter().by_vals() {
                    let next = if bit { cursor.1 } else { cursor.0 };
                    match next {
                        Node::Leaf { symbol, .. } => {
                            output.push(*symbol);
                            cursor = root;
                            depth = 0;
                        }
                        Node::Internal { left, right, .. } => {
                            cursor = (left.as_ref(), right.as_ref());
                            depth += 1;
                        }
                    }
                }

                if depth > 0 {
                    log::debug!("stream ended {depth} levels below the root");
                    return Err(DecodeError::TruncatedCode.into());
                }
            }
        }

        Ok(output.len() - start)
    }
}
