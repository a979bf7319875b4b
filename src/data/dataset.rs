use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised question and its class index.
/// Sequence format: [CLS] question [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

impl ClassificationSample {
    /// Number of real (non-padding) tokens
    pub fn token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

pub struct ClassificationDataset {
    samples: Vec<ClassificationSample>,
}

impl ClassificationDataset {
    pub fn new(samples: Vec<ClassificationSample>) -> Self { Self { samples } }
}

impl Dataset<ClassificationSample> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<ClassificationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
