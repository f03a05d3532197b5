use std::io::Error as IoError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot build a code from empty input")]
    EmptyInput,

    #[error("symbol {0:#04x} has no code")]
    UnknownSymbol(u8),

    #[error("symbol {0:#04x} inserted with zero frequency")]
    ZeroFrequency(u8),

    #[error("frequency {count} of symbol {symbol:#04x} does not fit the container")]
    FrequencyOverflow { symbol: u8, count: u64 },

    #[error("corrupt stream: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Reasons a container or bitstream cannot be decoded.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("container header is truncated")]
    TruncatedHeader,

    #[error("frequency table is empty")]
    EmptyTable,

    #[error("frequency table has {0} entries")]
    TableTooLarge(u64),

    #[error("symbol {0:#04x} has zero frequency")]
    ZeroFrequency(u8),

    #[error("symbol {symbol:#04x} follows {previous:#04x}")]
    UnorderedTable { previous: u8, symbol: u8 },

    #[error("padding of {0} bits is out of range")]
    InvalidPadding(u32),

    #[error("packed stream is empty")]
    EmptyStream,

    #[error("stream ends inside a code")]
    TruncatedCode,

    #[error("stream holds a bit sequence that is not a code")]
    InvalidCode,

    #[error("decoded {actual} symbols, expected {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}
