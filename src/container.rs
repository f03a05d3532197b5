//! Self-describing compressed artifact.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! [table_size   : u64]
//! table_size times:
//!   [symbol     : u8]
//!   [frequency  : u32]
//! [padding_bits : u32, 0..=7]
//! [packed bytes : until end of data]
//! ```
//!
//! Table entries are written in ascending symbol order. The decoder rebuilds
//! the tree from the table, so both ends agree on the codes without the tree
//! itself being stored.
use crate::{
    decoder::Decoder,
    error::{DecodeError, Error, Result},
    frequency::Frequencies,
    huffman::{Node, WeightedItem},
    packer::{pack, Packed},
};
use bitstream_io::{ByteRead, ByteReader, ByteWrite, ByteWriter, LittleEndian};
use std::io::{ErrorKind, Read, Write};

/// Largest number of distinct byte values a table can hold.
pub const MAX_TABLE_SIZE: u64 = 256;

const TABLE_SIZE_BYTES: usize = 8;
const ENTRY_BYTES: usize = 1 + 4;
const PADDING_BYTES: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub frequencies: Frequencies,
    pub padding: u8,
    pub packed: Vec<u8>,
}

impl Container {
    /// Counts, builds the code and packs `input`.
    pub fn encode(input: &[u8]) -> Result<Self> {
        let frequencies = Frequencies::from_bytes(input);
        let tree = Node::from_frequencies(&frequencies)?;
        let encoder = tree.encoder();
        log::debug!(
            "encoding {} bytes with {} distinct symbols, longest code {} bits",
            input.len(),
            encoder.len(),
            tree.depth().max(1)
        );

        check_frequencies(&frequencies)?;
        let Packed { bytes, padding } = pack(&encoder, input)?;
        Ok(Container {
            frequencies,
            padding,
            packed: bytes,
        })
    }

    /// Rebuilds the tree and decodes the packed stream.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.frequencies.is_empty() {
            return Err(DecodeError::EmptyTable.into());
        }
        let tree = Node::from_frequencies(&self.frequencies)?;
        let expected = self.frequencies.total();

        // a corrupt table may promise far more symbols than the stream can hold
        let capacity = usize::try_from(expected)
            .unwrap_or(usize::MAX)
            .min(self.packed.len().saturating_mul(8));
        let mut output = Vec::with_capacity(capacity);
        let actual = Decoder::new(&tree).decode_into(&self.packed, self.padding, &mut output)? as u64;
        if actual != expected {
            return Err(DecodeError::LengthMismatch { expected, actual }.into());
        }

        log::debug!(
            "decoded {} packed bytes into {actual} bytes",
            self.packed.len()
        );
        Ok(output)
    }

    /// Size of the serialized container in bytes.
    pub fn encoded_len(&self) -> usize {
        TABLE_SIZE_BYTES + self.frequencies.len() * ENTRY_BYTES + PADDING_BYTES + self.packed.len()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        check_frequencies(&self.frequencies)?;
        let mut writer = ByteWriter::endian(writer, LittleEndian);

        writer.write(self.frequencies.len() as u64)?;
        for WeightedItem { weight, item } in self.frequencies.iter() {
            writer.write(item)?;
            writer.write(weight as u32)?;
        }
        writer.write(u32::from(self.padding))?;
        writer.write_bytes(&self.packed)?;
        Ok(())
    }

    /// Reads and validates a container until end of data.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let (frequencies, padding) = {
            let mut header = ByteReader::endian(&mut reader, LittleEndian);
            read_header(&mut header).map_err(|error| match error {
                Error::Io(error) if error.kind() == ErrorKind::UnexpectedEof => {
                    Error::Decode(DecodeError::TruncatedHeader)
                }
                error => error,
            })?
        };

        let mut packed = Vec::new();
        reader.read_to_end(&mut packed)?;
        log::trace!(
            "read table of {} symbols, {padding} bits of padding, {} packed bytes",
            frequencies.len(),
            packed.len()
        );

        Ok(Container {
            frequencies,
            padding,
            packed,
        })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut output)?;
        Ok(output)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::read_from(data)
    }
}

/// Every count must fit the `u32` frequency field.
fn check_frequencies(frequencies: &Frequencies) -> Result<()> {
    match frequencies.iter().find(|item| item.weight > u64::from(u32::MAX)) {
        Some(WeightedItem { weight, item }) => Err(Error::FrequencyOverflow {
            symbol: item,
            count: weight,
        }),
        None => Ok(()),
    }
}

fn read_header<R: ByteRead>(reader: &mut R) -> Result<(Frequencies, u8)> {
    let table_size: u64 = reader.read()?;
    if table_size == 0 {
        return Err(DecodeError::EmptyTable.into());
    }
    if table_size > MAX_TABLE_SIZE {
        return Err(DecodeError::TableTooLarge(table_size).into());
    }

    let mut items = Vec::with_capacity(table_size as usize);
    let mut previous: Option<u8> = None;
    for _ in 0..table_size {
        let symbol: u8 = reader.read()?;
        let weight: u32 = reader.read()?;
        if weight == 0 {
            return Err(DecodeError::ZeroFrequency(symbol).into());
        }
        if let Some(previous) = previous.filter(|previous| *previous >= symbol) {
            return Err(DecodeError::UnorderedTable { previous, symbol }.into());
        }
        previous = Some(symbol);
        items.push(WeightedItem {
            weight: weight.into(),
            item: symbol,
        });
    }

    let padding: u32 = reader.read()?;
    if padding > 7 {
        return Err(DecodeError::InvalidPadding(padding).into());
    }

    Ok((items.into_iter().collect(), padding as u8))
}

/// Compresses `input` into a serialized container.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    Container::encode(input)?.to_vec()
}

/// Restores the bytes of a serialized container.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    Container::from_slice(data)?.decode()
}

/// Compresses everything `reader` yields into `writer`, returning the
/// container that was written.
pub fn compress_to<R: Read, W: Write>(mut reader: R, mut writer: W) -> Result<Container> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    let container = Container::encode(&input)?;
    container.write_to(&mut writer)?;
    writer.flush()?;
    Ok(container)
}

/// Decompresses a container read from `reader` into `writer`, returning the
/// number of bytes restored.
pub fn decompress_to<R: Read, W: Write>(reader: R, mut writer: W) -> Result<usize> {
    let output = Container::read_from(reader)?.decode()?;
    writer.write_all(&output)?;
    writer.flush()?;
    Ok(output.len())
}

impl TryFrom<&[u8]> for Container {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        Self::from_slice(data)
    }
}
