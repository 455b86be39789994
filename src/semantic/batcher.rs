use crate::error::ConfigError;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Groups texts into embedding requests of at most `batch_size` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    batch_size: usize,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn split<'a>(&self, items: &'a [String]) -> Vec<&'a [String]> {
        items.chunks(self.batch_size).collect()
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batching_small() {
        let batcher = Batcher::new(3).unwrap();
        let items: Vec<String> = (1..=5).map(|i| format!("sentence{}", i)).collect();

        let batches = batcher.split(&items);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 2);
    }

    #[test]
    fn test_batching_empty() {
        let batcher = Batcher::new(100).unwrap();
        assert!(batcher.split(&[]).is_empty());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert_eq!(Batcher::new(0), Err(ConfigError::ZeroBatchSize));
    }
}
