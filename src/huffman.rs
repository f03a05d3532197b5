use crate::{
    error::{Error, Result},
    frequency::Frequencies,
    packer::Packer,
};
use bitvec::prelude::*;
use hashbrown::HashMap;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Bit path from the root to a leaf, first step in the most significant bit.
pub type Code = BitBox<u8, Msb0>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeightedItem<T = u8> {
    pub weight: u64,
    pub item: T,
}

/// Heap entry. Ordered by weight, then by the order it entered the queue.
#[derive(Debug)]
struct QueuedNode {
    weight: u64,
    sequence: usize,
    node: Node,
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.weight, self.sequence).cmp(&(other.weight, other.sequence))
    }
}

impl Node {
    /// Builds a Huffman tree from weighted symbols.
    ///
    /// Of two nodes with equal weight, the one queued first is merged first
    /// and becomes the left child. Items are queued in iteration order and
    /// every merged node is queued behind all existing ones, so the same
    /// input sequence always produces the same tree.
    pub fn new(items: impl Iterator<Item = WeightedItem>) -> Result<Self> {
        let mut sequence = 0usize;
        let mut queue = |weight, node| {
            sequence += 1;
            Reverse(QueuedNode {
                weight,
                sequence,
                node,
            })
        };

        let mut heap: BinaryHeap<Reverse<QueuedNode>> = BinaryHeap::new();
        for item in items {
            heap.push(queue(
                item.weight,
                Node::Leaf {
                    symbol: item.item,
                    weight: item.weight,
                },
            ));
        }

        while heap.len() > 1 {
            let (Some(Reverse(left)), Some(Reverse(right))) = (heap.pop(), heap.pop()) else {
                unreachable!("heap holds at least two nodes");
            };
            let weight = left.weight.saturating_add(right.weight);
            let node = Node::Internal {
                weight,
                left: left.node.into(),
                right: right.node.into(),
            };
            heap.push(queue(weight, node));
        }

        let root = heap.pop().ok_or(Error::EmptyInput)?.0.node;
        log::trace!(
            "built tree with {} leaves, depth {}",
            root.leaves(),
            root.depth()
        );
        Ok(root)
    }

    pub fn from_frequencies(frequencies: &Frequencies) -> Result<Self> {
        Self::new(frequencies.iter())
    }

    pub fn weight(&self) -> u64 {
        match self {
            Self::Leaf { weight, .. } | Self::Internal { weight, .. } => *weight,
        }
    }

    pub fn leaves(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { left, right, .. } => left.leaves() + right.leaves(),
        }
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn iter(&self, mut prefix: BitVec<u8, Msb0>) -> Box<dyn Iterator<Item = (u8, Code)> + '_> {
        match self {
            Self::Leaf { symbol, .. } => {
                // a lone root leaf still needs one bit per symbol
                if prefix.is_empty() {
                    prefix.push(false);
                }
                Box::new(std::iter::once((*symbol, prefix.into_boxed_bitslice())))
            }
            Self::Internal { left, right, .. } => {
                prefix.push(false);
                let left = left.iter(prefix.clone());
                prefix.pop();
                prefix.push(true);
                let right = right.iter(prefix);
                Box::new(left.chain(right))
            }
        }
    }

    pub fn encoder(&self) -> Encoder {
        Encoder::new(self)
    }
}

/// Code table mapping every leaf symbol to its bit path.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Encoder {
    codes: HashMap<u8, Code>,
}

impl Encoder {
    pub fn new(root: &Node) -> Self {
        Encoder {
            codes: root.iter(BitVec::new()).collect(),
        }
    }

    pub fn code(&self, symbol: u8) -> Option<&BitSlice<u8, Msb0>> {
        Some(self.codes.get(&symbol)?.as_bitslice())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// All codes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitSlice<u8, Msb0>)> + '_ {
        self.codes
            .iter()
            .map(|(symbol, code)| (*symbol, code.as_bitslice()))
    }

    /// Number of bits the counted input packs into, before padding.
    pub fn encoded_bits(&self, frequencies: &Frequencies) -> u64 {
        frequencies
            .iter()
            .filter_map(|item| {
                let len = self.code(item.item)?.len() as u64;
                Some(item.weight.saturating_mul(len))
            })
            .fold(0u64, u64::saturating_add)
    }

    pub fn packer(&self) -> Packer<&Self> {
        Packer::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::bits;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use test_strategy::proptest;

    fn items(weights: &[(u8, u64)]) -> impl Iterator<Item = WeightedItem> + '_ {
        weights
            .iter()
            .map(|(item, weight)| WeightedItem {
                item: *item,
                weight: *weight,
            })
    }

    #[test]
    fn test_empty() {
        assert!(matches!(Node::new(items(&[])), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_single_leaf() {
        let node = Node::new(items(&[(b'a', 1000)])).unwrap();
        assert_eq!(
            node,
            Node::Leaf {
                symbol: b'a',
                weight: 1000
            }
        );
        let encoder = node.encoder();
        assert_eq!(encoder.len(), 1);
        assert_eq!(encoder.code(b'a').unwrap(), bits![u8, Msb0; 0]);
    }

    #[test]
    fn test_two_symbols() {
        let node = Node::from_frequencies(&Frequencies::from_bytes(b"aaabb")).unwrap();
        assert_eq!(node.weight(), 5);
        assert_eq!(node.depth(), 1);

        let encoder = node.encoder();
        assert_eq!(encoder.code(b'b').unwrap(), bits![u8, Msb0; 0]);
        assert_eq!(encoder.code(b'a').unwrap(), bits![u8, Msb0; 1]);
    }

    #[test]
    fn test_ties_follow_queue_order() {
        let node = Node::new(items(&[(b'x', 1), (b'y', 1), (b'z', 1)])).unwrap();
        // x and y merge first, z is queued before their parent
        let encoder = node.encoder();
        assert_eq!(encoder.code(b'z').unwrap(), bits![u8, Msb0; 0]);
        assert_eq!(encoder.code(b'x').unwrap(), bits![u8, Msb0; 1, 0]);
        assert_eq!(encoder.code(b'y').unwrap(), bits![u8, Msb0; 1, 1]);
    }

    #[test]
    fn test_internal_weight_is_sum() {
        fn check(node: &Node) {
            if let Node::Internal {
                weight,
                left,
                right,
            } = node
            {
                assert_eq!(*weight, left.weight() + right.weight());
                check(left);
                check(right);
            }
        }
        let node = Node::from_frequencies(&Frequencies::from_bytes(b"abracadabra")).unwrap();
        assert_eq!(node.weight(), 11);
        check(&node);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let frequencies = Frequencies::from_bytes(b"the quick brown fox jumps over the lazy dog");
        let first = Node::from_frequencies(&frequencies).unwrap();
        let second = Node::from_frequencies(&frequencies.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[proptest]
    fn test_node(#[filter(!#items.is_empty())] items: BTreeMap<u8, u32>) {
        let node = Node::new(items.iter().map(|(item, weight)| WeightedItem {
            item: *item,
            weight: u64::from(*weight) + 1,
        }))
        .unwrap();
        prop_assert_eq!(node.leaves(), items.len());

        let encoder = node.encoder();
        prop_assert_eq!(encoder.len(), items.len());
        for byte in items.keys() {
            prop_assert!(encoder.code(*byte).is_some());
        }
    }

    #[proptest]
    fn test_prefix_free(#[filter(!#input.is_empty())] input: Vec<u8>) {
        let node = Node::from_frequencies(&Frequencies::from_bytes(&input)).unwrap();
        let encoder = node.encoder();
        let codes: Vec<_> = encoder.iter().collect();

        for (symbol, code) in &codes {
            prop_assert!(!code.is_empty());
            for (other, other_code) in &codes {
                if symbol != other {
                    prop_assert!(!other_code.starts_with(code));
                }
            }
        }
    }
}
