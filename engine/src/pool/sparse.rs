/// A block-based sparse index mapping entity-id-derived keys to dense storage slots.
///
/// Grown lazily in fixed-size blocks rather than as one flat `Vec` sized to the highest
/// key seen, so a world with a handful of low-numbered entities touching a rarely-used
/// kind doesn't pay for a dense array sized to `next_entity`.
#[derive(Debug)]
pub struct SparseIndex {
    block_size: usize,
    blocks: Vec<Option<Vec<Option<usize>>>>,
}

impl SparseIndex {
    const DEFAULT_BLOCK_SIZE: usize = 256;

    pub fn new() -> Self {
        Self::with_block_size(Self::DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be nonzero");
        Self {
            block_size,
            blocks: Vec::new(),
        }
    }

    #[inline]
    fn locate(&self, key: usize) -> (usize, usize) {
        (key / self.block_size, key % self.block_size)
    }

    pub fn get(&self, key: usize) -> Option<usize> {
        let (block, within) = self.locate(key);
        self.blocks.get(block)?.as_ref()?[within]
    }

    pub fn contains(&self, key: usize) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: usize, value: usize) {
        let (block, within) = self.locate(key);
        if block >= self.blocks.len() {
            self.blocks.resize_with(block + 1, || None);
        }
        let slots = self.blocks[block].get_or_insert_with(|| vec![None; self.block_size]);
        slots[within] = Some(value);
    }

    pub fn remove(&mut self, key: usize) -> Option<usize> {
        let (block, within) = self.locate(key);
        let slots = self.blocks.get_mut(block)?.as_mut()?;
        slots[within].take()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_grows_to_cover_key() {
        // Given
        let mut index = SparseIndex::with_block_size(4);

        // When
        index.insert(0, 10);
        index.insert(8, 80);

        // Then
        assert_eq!(index.blocks.len(), 3);
        assert!(index.blocks[1].is_none());
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        // Given
        let mut index = SparseIndex::new();

        // When
        index.insert(5, 50);

        // Then
        assert_eq!(index.get(5), Some(50));
        assert_eq!(index.remove(5), Some(50));
        assert_eq!(index.get(5), None);
    }
}
