// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles samples with a fixed seed and holds out a fraction
// for validation. The same input order and seed always produce
// the same split.
//
//   validation size = ceil(total * val_fraction)
//   training size   = total - validation size
//
// There is no stratification by label: on a small dataset a
// label can end up with no validation rows at all.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Returns (train, validation).
pub fn split_train_val<T>(mut samples: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let val_count = ((total as f64) * val_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let split_at  = total - val_count.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed {}): {} training, {} validation",
        seed,
        samples.len(),
        val.len(),
    );

    (samples, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let (train, val) = split_train_val((0..100).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_validation_size_rounds_up() {
        // 2 * 0.2 = 0.4 -> one validation row
        let (train, val) = split_train_val(vec!['a', 'b'], 0.2, 42);
        assert_eq!(train.len(), 1);
        assert_eq!(val.len(),   1);
    }

    #[test]
    fn test_all_items_preserved() {
        let (mut train, val) = split_train_val((0..50).collect::<Vec<_>>(), 0.2, 42);
        train.extend(val);
        train.sort();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..30).collect::<Vec<_>>(), 0.2, 42);
        let b = split_train_val((0..30).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, val) = split_train_val(Vec::<usize>::new(), 0.2, 42);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, val) = split_train_val((0..10).collect::<Vec<_>>(), 0.0, 7);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
