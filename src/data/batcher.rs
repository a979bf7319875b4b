// ============================================================
// Layer 4 - Classification Batcher
// ============================================================
// Stacks ClassificationSamples into tensors for one forward pass.
//
//   Input:  N samples, each padded to the same length S
//   Output: input_ids     [N, S] Int
//           padding_mask  [N, S] Bool   (true = padding)
//           labels        [N]    Int
//
// The DataLoader calls this during training; the inferencer
// calls `build` directly with a single sample.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ClassificationSample;

#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    pub input_ids:    Tensor<B, 2, Int>,
    pub padding_mask: Tensor<B, 2, Bool>,
    pub labels:       Tensor<B, 1, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct ClassificationBatcher;

impl ClassificationBatcher {
    pub fn new() -> Self {
        Self
    }

    /// Build a batch on `device`. All samples must share one length.
    pub fn build<B: Backend>(
        &self,
        items:  Vec<ClassificationSample>,
        device: &B::Device,
    ) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        let ids_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i64))
            .collect();

        let mask_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i64))
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let input_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(ids_flat, [batch_size, seq_len]), device,
        );

        // attention_mask is 1 for real tokens; attention wants true on padding
        let padding_mask = Tensor::<B, 2, Int>::from_data(
            TensorData::new(mask_flat, [batch_size, seq_len]), device,
        ).equal_elem(0);

        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]), device,
        );

        ClassificationBatch { input_ids, padding_mask, labels }
    }
}

impl<B: Backend> Batcher<B, ClassificationSample, ClassificationBatch<B>> for ClassificationBatcher {
    fn batch(&self, items: Vec<ClassificationSample>, device: &B::Device) -> ClassificationBatch<B> {
        self.build(items, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_mask() {
        let device = Default::default();
        let items = vec![
            ClassificationSample { input_ids: vec![2, 7, 3, 0], attention_mask: vec![1, 1, 1, 0], label: 1 },
            ClassificationSample { input_ids: vec![2, 8, 9, 3], attention_mask: vec![1, 1, 1, 1], label: 0 },
        ];
        let batch: ClassificationBatch<NdArray> = ClassificationBatcher::new().build(items, &device);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let padded = batch.padding_mask.int().sum().into_scalar().elem::<i64>();
        assert_eq!(padded, 1);
    }
}
