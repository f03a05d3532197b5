use crate::{
    error::{Error, Result},
    huffman::WeightedItem,
};
use std::{
    borrow::BorrowMut,
    collections::BTreeMap,
    io::{copy, Read, Result as IoResult, Write},
};

pub type Map<K, V> = BTreeMap<K, V>;

/// Occurrence count of every byte value seen in some input.
///
/// Entries iterate in ascending symbol order, which is also the order they
/// are serialized in and the order leaves are seeded into the tree builder.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Frequencies {
    counts: Map<u8, u64>,
}

impl Frequencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut frequencies = Self::new();
        frequencies.add(bytes);
        frequencies
    }

    /// Counts everything `reader` yields until end of data.
    pub fn count<R: Read>(mut reader: R) -> IoResult<Self> {
        let mut writer = Self::new().into_writer();
        copy(&mut reader, &mut writer)?;
        Ok(writer.finish())
    }

    pub fn add(&mut self, bytes: &[u8]) {
        let mut histogram = [0u64; 256];
        for byte in bytes {
            histogram[*byte as usize] += 1;
        }
        for (symbol, weight) in histogram.into_iter().enumerate() {
            if weight > 0 {
                let count = self.counts.entry(symbol as u8).or_default();
                *count = count.saturating_add(weight);
            }
        }
    }

    /// Adds `weight` occurrences of `symbol`, returning the new count.
    pub fn insert(&mut self, symbol: u8, weight: u64) -> Result<u64> {
        if weight == 0 {
            return Err(Error::ZeroFrequency(symbol));
        }
        let count = self.counts.entry(symbol).or_default();
        *count = count.saturating_add(weight);
        Ok(*count)
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }

    pub fn iter(&self) -> impl Iterator<Item = WeightedItem> + '_ {
        self.counts
            .iter()
            .map(|(symbol, weight)| WeightedItem {
                weight: *weight,
                item: *symbol,
            })
    }

    pub fn into_writer(self) -> Writer<Self> {
        Writer::new(self)
    }
}

impl FromIterator<WeightedItem> for Frequencies {
    fn from_iter<I: IntoIterator<Item = WeightedItem>>(iter: I) -> Self {
        let mut frequencies = Self::new();
        for item in iter.into_iter().filter(|item| item.weight > 0) {
            let count = frequencies.counts.entry(item.item).or_default();
            *count = count.saturating_add(item.weight);
        }
        frequencies
    }
}

/// `io::Write` sink that counts every byte written to it.
#[derive(Debug, Clone)]
pub struct Writer<F: BorrowMut<Frequencies>> {
    frequencies: F,
}

impl<F: BorrowMut<Frequencies>> Writer<F> {
    pub fn new(frequencies: F) -> Self {
        Writer { frequencies }
    }

    pub fn finish(self) -> F {
        self.frequencies
    }
}

impl<F: BorrowMut<Frequencies>> Write for Writer<F> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.frequencies.borrow_mut().add(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_strategy::proptest;

    #[test]
    fn test_counts() {
        let frequencies = Frequencies::from_bytes(b"aaabb");
        assert_eq!(frequencies.len(), 2);
        assert_eq!(frequencies.get(b'a'), Some(3));
        assert_eq!(frequencies.get(b'b'), Some(2));
        assert_eq!(frequencies.get(b'c'), None);
        assert_eq!(frequencies.total(), 5);
    }

    #[test]
    fn test_empty() {
        let frequencies = Frequencies::from_bytes(&[]);
        assert!(frequencies.is_empty());
        assert_eq!(frequencies.total(), 0);
    }

    #[test]
    fn test_ascending_order() {
        let frequencies = Frequencies::from_bytes(b"zyxzy");
        let symbols: Vec<u8> = frequencies.iter().map(|item| item.item).collect();
        assert_eq!(symbols, b"xyz");
    }

    #[test]
    fn test_insert_rejects_zero() {
        let mut frequencies = Frequencies::new();
        assert!(matches!(
            frequencies.insert(7, 0),
            Err(Error::ZeroFrequency(7))
        ));
        assert_eq!(frequencies.insert(7, 2).unwrap(), 2);
        assert_eq!(frequencies.insert(7, 3).unwrap(), 5);
        assert!(frequencies.get(0).is_none());
    }

    #[proptest]
    fn test_counts_match_occurrences(input: Vec<u8>) {
        let frequencies = Frequencies::from_bytes(&input);
        prop_assert_eq!(frequencies.total(), input.len() as u64);
        for item in frequencies.iter() {
            prop_assert!(item.weight > 0);
            let occurrences = input.iter().filter(|byte| **byte == item.item).count();
            prop_assert_eq!(item.weight, occurrences as u64);
        }
    }

    #[proptest]
    fn test_writer(inputs: Vec<Vec<u8>>) {
        let streamed = {
            let mut writer = Frequencies::new().into_writer();
            for input in &inputs {
                writer.write_all(input).unwrap();
            }
            writer.finish()
        };

        let whole = Frequencies::from_bytes(&inputs.concat());
        prop_assert_eq!(streamed, whole);
    }

    #[proptest]
    fn test_count_reader(input: Vec<u8>) {
        let counted = Frequencies::count(&input[..]).unwrap();
        prop_assert_eq!(counted, Frequencies::from_bytes(&input));
    }
}
