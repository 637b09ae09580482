use crate::errors::{ClassifierError, Result};
use crate::labels::LabelTable;
use common::{TensorData, TensorSpec};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

pub const DEFAULT_THRESHOLD: f32 = 0.001;
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Output element that can be compared on a common confidence scale.
pub trait Confidence: Copy {
    fn confidence(self) -> f32;
}

impl Confidence for f32 {
    #[inline]
    fn confidence(self) -> f32 {
        self
    }
}

impl Confidence for u8 {
    /// Quantized scores are raw integers; 255 maps to 1.0.
    #[inline]
    fn confidence(self) -> f32 {
        self as f32 / 255.0
    }
}

/// A confidence paired with its offset in the output vector.
///
/// Orders by confidence, then by *descending* index so that among equal
/// confidences the lower index is the greater value.
#[derive(Debug, Clone, Copy)]
pub struct ScoredIndex {
    pub confidence: f32,
    pub index: usize,
}

impl Ord for ScoredIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.confidence
            .total_cmp(&other.confidence)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for ScoredIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredIndex {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredIndex {}

/// At most `k` entries with confidence `>= threshold`, highest first.
///
/// Uses a bounded min-heap: O(M log k) time, O(k) extra space. NaN scores are
/// skipped.
pub fn top_n<T: Confidence>(scores: &[T], threshold: f32, k: usize) -> Vec<ScoredIndex> {
    if k == 0 {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (index, raw) in scores.iter().enumerate() {
        let confidence = raw.confidence();
        if confidence.is_nan() || confidence < threshold {
            continue;
        }

        heap.push(Reverse(ScoredIndex { confidence, index }));
        if heap.len() > k {
            heap.pop();
        }
    }

    // Ascending under `Reverse` is descending confidence
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(scored)| scored)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub confidence: f32,
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    pub threshold: f32,
    pub max_results: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_MAX_RESULTS)
    }
}

impl Ranker {
    pub fn new(threshold: f32, max_results: usize) -> Self {
        Self {
            threshold,
            max_results,
        }
    }

    /// Top entries of `output`, dispatched on its element type.
    ///
    /// The number of classes comes from the last dimension of `spec`.
    pub fn scores(&self, output: &TensorData, spec: &TensorSpec) -> Result<Vec<ScoredIndex>> {
        if output.element_type() != spec.element_type {
            return Err(ClassifierError::ShapeMismatch {
                expected: spec.to_string(),
                actual: format!("{:?} {}", output.shape(), output.element_type()),
            });
        }

        let count = spec.last_dim().min(output.len());
        let ranked = match output {
            TensorData::F32(_) => output
                .as_f32()
                .map(|s| top_n(&s[..count], self.threshold, self.max_results)),
            TensorData::U8(_) => output
                .as_u8()
                .map(|s| top_n(&s[..count], self.threshold, self.max_results)),
        };

        ranked.ok_or_else(|| ClassifierError::execution("output tensor is not contiguous"))
    }

    /// Ranked, labelled results. Entries without a usable label are dropped.
    pub fn rank(
        &self,
        output: &TensorData,
        spec: &TensorSpec,
        labels: &LabelTable,
    ) -> Result<Vec<Classification>> {
        let ranked = self.scores(output, spec)?;
        let candidates = ranked.len();

        let results: Vec<_> = ranked
            .into_iter()
            .filter_map(|scored| {
                labels.get(scored.index).map(|label| Classification {
                    confidence: scored.confidence,
                    index: scored.index,
                    label: label.to_owned(),
                })
            })
            .collect();

        if results.len() < candidates {
            tracing::debug!(
                dropped = candidates - results.len(),
                labels = labels.len(),
                "Dropped results without a label"
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ElementType;
    use ndarray::{ArrayD, IxDyn};

    fn indices(ranked: &[ScoredIndex]) -> Vec<usize> {
        ranked.iter().map(|s| s.index).collect()
    }

    fn f32_output(values: Vec<f32>) -> (TensorData, TensorSpec) {
        let spec = TensorSpec::new([1, values.len()], ElementType::F32);
        let data = TensorData::F32(ArrayD::from_shape_vec(IxDyn(&spec.dims), values).unwrap());
        (data, spec)
    }

    #[test]
    fn test_threshold_and_order() {
        let ranked = top_n(&[0.9f32, 0.002, 0.5, 0.0001, 0.7], DEFAULT_THRESHOLD, 10);
        assert_eq!(indices(&ranked), vec![0, 4, 2, 1]);
        assert_eq!(ranked[0].confidence, 0.9);
        assert_eq!(ranked[3].confidence, 0.002);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ranked = top_n(&[0.001f32, 0.000_999], DEFAULT_THRESHOLD, 10);
        assert_eq!(indices(&ranked), vec![0]);
    }

    #[test]
    fn test_respects_k() {
        // Distinct values in a scrambled order
        let scores: Vec<f32> = (0..100).map(|i| ((i * 37) % 100) as f32 / 100.0 + 0.01).collect();
        let ranked = top_n(&scores, DEFAULT_THRESHOLD, 10);

        assert_eq!(ranked.len(), 10);
        assert!(ranked.windows(2).all(|w| w[0].confidence > w[1].confidence));

        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let expected: Vec<f32> = sorted[..10].to_vec();
        let actual: Vec<f32> = ranked.iter().map(|s| s.confidence).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_quantized_scaling() {
        let ranked = top_n(&[128u8, 0, 255], DEFAULT_THRESHOLD, 10);
        assert_eq!(indices(&ranked), vec![2, 0]);
        assert_eq!(ranked[0].confidence, 1.0);
        assert!((ranked[1].confidence - 0.502).abs() < 1e-3);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let ranked = top_n(&[0.5f32, 0.5, 0.9, 0.5], DEFAULT_THRESHOLD, 3);
        assert_eq!(indices(&ranked), vec![2, 0, 1]);
    }

    #[test]
    fn test_nan_and_zero_k() {
        let ranked = top_n(&[f32::NAN, 0.3], DEFAULT_THRESHOLD, 10);
        assert_eq!(indices(&ranked), vec![1]);
        assert!(top_n(&[0.3f32], DEFAULT_THRESHOLD, 0).is_empty());
    }

    #[test]
    fn test_rank_drops_unlabelled_entries() {
        let (output, spec) = f32_output(vec![0.9, 0.002, 0.5, 0.0001, 0.7]);
        // Index 2 has an empty label, index 4 is past the end
        let labels = LabelTable::from_text("cat\ndog\n\nbird");

        let results = Ranker::default().rank(&output, &spec, &labels).unwrap();
        assert_eq!(
            results,
            vec![
                Classification {
                    confidence: 0.9,
                    index: 0,
                    label: "cat".to_string()
                },
                Classification {
                    confidence: 0.002,
                    index: 1,
                    label: "dog".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_rank_uses_last_dimension() {
        let (output, _) = f32_output(vec![0.1, 0.2, 0.3, 0.4]);
        let spec = TensorSpec::new([1, 2], ElementType::F32);

        let scored = Ranker::default().scores(&output, &spec).unwrap();
        assert_eq!(indices(&scored), vec![1, 0]);
    }

    #[test]
    fn test_rank_quantized_output() {
        let spec = TensorSpec::new([1, 3], ElementType::U8);
        let output =
            TensorData::U8(ArrayD::from_shape_vec(IxDyn(&[1, 3]), vec![10, 255, 0]).unwrap());
        let labels = LabelTable::from_text("a\nb\nc");

        let results = Ranker::new(0.01, 5).rank(&output, &spec, &labels).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "b");
        assert_eq!(results[0].confidence, 1.0);
    }

    #[test]
    fn test_rank_rejects_type_mismatch() {
        let (output, _) = f32_output(vec![0.5]);
        let spec = TensorSpec::new([1, 1], ElementType::U8);
        assert!(Ranker::default().scores(&output, &spec).is_err());
    }
}
