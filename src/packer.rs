use crate::{
    error::{Error, Result},
    huffman::Encoder,
};
use bitstream_io::{BigEndian, BitWrite, BitWriter};
use std::{
    borrow::Borrow,
    io::{Error as IoError, ErrorKind, Result as IoResult, Write},
};

/// Packed bitstream and the number of zero bits appended to its last byte.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Packed {
    pub bytes: Vec<u8>,
    pub padding: u8,
}

impl Packed {
    /// Number of meaningful bits, excluding padding.
    pub fn bit_len(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.padding.into())
    }
}

/// Zero bits needed to bring `bits` up to a whole number of bytes.
pub fn padding_bits(bits: u64) -> u8 {
    ((8 - bits % 8) % 8) as u8
}

/// Concatenates the code of every byte written into a MSB-first bitstream.
pub struct Packer<H: Borrow<Encoder>> {
    encoder: H,
    writer: BitWriter<Vec<u8>, BigEndian>,
    bits: u64,
}

impl<H: Borrow<Encoder>> Packer<H> {
    pub fn new(encoder: H) -> Self {
        Self {
            encoder,
            writer: BitWriter::new(Vec::new()),
            bits: 0,
        }
    }

    pub fn pack(&mut self, input: &[u8]) -> Result<()> {
        let encoder = self.encoder.borrow();
        for byte in input {
            let code = encoder.code(*byte).ok_or(Error::UnknownSymbol(*byte))?;
            for bit in code.iter() {
                self.writer.write_bit(*bit)?;
            }
            self.bits += code.len() as u64;
        }
        Ok(())
    }

    /// Bits written so far.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Pads the stream with zero bits to the next byte boundary.
    pub fn finish(mut self) -> Result<Packed> {
        let padding = padding_bits(self.bits);
        self.writer.byte_align()?;
        let bytes = self.writer.into_writer();
        log::debug!(
            "packed {} bits into {} bytes, {padding} bits of padding",
            self.bits,
            bytes.len()
        );
        Ok(Packed { bytes, padding })
    }
}

impl<H: Borrow<Encoder>> Write for Packer<H> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.pack(buf).map_err(|error| match error {
            Error::Io(error) => error,
            error => IoError::new(ErrorKind::InvalidInput, error),
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// Packs `input` with the codes of `encoder`.
pub fn pack(encoder: &Encoder, input: &[u8]) -> Result<Packed> {
    let mut packer = encoder.packer();
    packer.pack(input)?;
    packer.finish()
}
