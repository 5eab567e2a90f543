// Label encoder - recipe ids <-> contiguous class indices
//
// Classes are the distinct recipe ids sorted ascending; class index i is
// classes[i]. Decoding is a direct index, encoding a binary search.

use serde::{Deserialize, Serialize};

/// External recipe identifier
pub type RecipeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<RecipeId>,
}

impl LabelEncoder {
    /// Fit on a label column. Duplicates collapse; order is ascending id.
    pub fn fit(labels: &[RecipeId]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    /// Fit and encode in one pass
    pub fn fit_transform(labels: &[RecipeId]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(labels);
        let encoded = labels
            .iter()
            .map(|id| encoder.class_index(*id).unwrap_or_default())
            .collect();
        (encoder, encoded)
    }

    pub fn class_index(&self, id: RecipeId) -> Option<usize> {
        self.classes.binary_search(&id).ok()
    }

    pub fn inverse_transform(&self, index: usize) -> Option<RecipeId> {
        self.classes.get(index).copied()
    }

    pub fn classes(&self) -> &[RecipeId] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
