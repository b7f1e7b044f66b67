//! Per-dispatch record of handlers already applied.

/// A compact bitset indexed by handler id.
///
/// Handler ids grow monotonically per registry chain, so a small word vector
/// covers every handler a dispatch can see.
#[derive(Debug, Default)]
pub struct Visited {
    words: Vec<u64>,
}

impl Visited {
    /// Create an empty visited set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the handler id was already applied in this dispatch.
    pub fn contains(&self, id: usize) -> bool {
        self.words
            .get(id / 64)
            .is_some_and(|word| word & (1 << (id % 64)) != 0)
    }

    /// Mark a handler id as applied.
    pub fn insert(&mut self, id: usize) {
        let word = id / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (id % 64);
    }

    /// Forget all applied handlers, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut visited = Visited::new();
        assert!(!visited.contains(0));
        assert!(!visited.contains(200));

        visited.insert(0);
        visited.insert(63);
        visited.insert(64);
        visited.insert(200);

        assert!(visited.contains(0));
        assert!(visited.contains(63));
        assert!(visited.contains(64));
        assert!(visited.contains(200));
        assert!(!visited.contains(1));
        assert!(!visited.contains(199));
    }

    #[test]
    fn test_clear() {
        let mut visited = Visited::new();
        visited.insert(5);
        visited.clear();
        assert!(!visited.contains(5));
    }
}
