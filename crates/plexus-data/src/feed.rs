use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use plexus_core::{Error, Result, Tensor};

// Feed — the training-data contract
//
// A feed yields {sample, label} pairs with cursor semantics: seek/offset/
// count/has_more. The training loop pulls items strictly sequentially; a
// read past the end is an error, not a sentinel.

/// One labeled training item.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Input sample tensor.
    pub sample: Tensor,
    /// Target / label tensor.
    pub label: Tensor,
}

/// A sequential source of labeled samples.
pub trait Feed {
    /// The item at the cursor; advances the cursor.
    fn next(&mut self) -> Result<FeedItem>;

    /// Move the cursor.
    fn seek(&mut self, offset: usize);

    /// The current cursor position.
    fn offset(&self) -> usize;

    /// Total number of items.
    fn count(&self) -> usize;

    /// Whether another item is available.
    fn has_more(&self) -> bool {
        self.offset() < self.count()
    }
}

/// A feed over an in-memory item list, with optional shuffling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeed {
    items: Vec<FeedItem>,
    cursor: usize,
}

impl InMemoryFeed {
    /// Create a feed over the given items.
    pub fn new(items: Vec<FeedItem>) -> Self {
        InMemoryFeed { items, cursor: 0 }
    }

    /// Build a feed from parallel (sample, label) pairs.
    pub fn from_pairs(pairs: Vec<(Tensor, Tensor)>) -> Self {
        let items = pairs
            .into_iter()
            .map(|(sample, label)| FeedItem { sample, label })
            .collect();
        Self::new(items)
    }

    /// Append an item.
    pub fn push(&mut self, item: FeedItem) {
        self.items.push(item);
    }

    /// Shuffle the items with a fresh thread-local generator.
    pub fn shuffle(&mut self) {
        self.items.shuffle(&mut thread_rng());
    }

    /// Shuffle the items with a seeded generator for reproducible epochs.
    pub fn shuffle_seeded(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.items.shuffle(&mut rng);
    }
}

impl Feed for InMemoryFeed {
    fn next(&mut self) -> Result<FeedItem> {
        let item = self.items.get(self.cursor).cloned().ok_or(Error::FeedExhausted {
            offset: self.cursor,
            count: self.items.len(),
        })?;
        self.cursor += 1;
        Ok(item)
    }

    fn seek(&mut self, offset: usize) {
        self.cursor = offset;
    }

    fn offset(&self) -> usize {
        self.cursor
    }

    fn count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(v: f64) -> FeedItem {
        FeedItem {
            sample: Tensor::from_slice(&[v], 1).unwrap(),
            label: Tensor::from_slice(&[v * 2.0], 1).unwrap(),
        }
    }

    #[test]
    fn cursor_semantics() -> Result<()> {
        let mut feed = InMemoryFeed::new(vec![item(1.0), item(2.0)]);
        assert_eq!(feed.count(), 2);
        assert!(feed.has_more());

        let first = feed.next()?;
        assert_eq!(first.sample.data(), &[1.0]);
        assert_eq!(feed.offset(), 1);

        feed.next()?;
        assert!(!feed.has_more());
        assert!(matches!(feed.next(), Err(Error::FeedExhausted { .. })));

        feed.seek(0);
        assert!(feed.has_more());
        Ok(())
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut a = InMemoryFeed::new((0..10).map(|i| item(i as f64)).collect());
        let mut b = a.clone();
        a.shuffle_seeded(42);
        b.shuffle_seeded(42);
        for _ in 0..10 {
            assert_eq!(a.next().unwrap().sample.data(), b.next().unwrap().sample.data());
        }
    }
}
