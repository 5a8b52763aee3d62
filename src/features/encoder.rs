//! One-hot encoder for categorical posting fields.

use crate::error::DetectorError;
use serde::{Deserialize, Serialize};

/// One fitted categorical field: its name and known category values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalField {
    pub name: String,
    pub categories: Vec<String>,
}

/// One-hot encoder over a fixed set of categorical fields.
///
/// Unknown values encode as all zeros for that field rather than erroring,
/// matching the training pipeline's unknown-ignored behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    fields: Vec<CategoricalField>,
}

impl CategoricalEncoder {
    /// Build an encoder from per-field observed values.
    ///
    /// Category lists are deduplicated and sorted for deterministic indices.
    pub fn fit(fields: Vec<(String, Vec<String>)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, values)| {
                let mut categories: Vec<String> = values
                    .into_iter()
                    .map(|v| v.to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect();
                categories.sort_unstable();
                categories.dedup();
                CategoricalField { name, categories }
            })
            .collect();
        Self { fields }
    }

    pub fn is_fitted(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Number of output features across all fields.
    pub fn feature_count(&self) -> usize {
        self.fields.iter().map(|f| f.categories.len()).sum()
    }

    /// Encode one value per fitted field, in field order.
    pub fn transform(&self, values: &[&str]) -> Result<Vec<f32>, DetectorError> {
        if !self.is_fitted() {
            return Err(DetectorError::EncoderNotFitted);
        }

        let mut encoded = vec![0.0f32; self.feature_count()];
        let mut offset = 0;
        for (field, value) in self.fields.iter().zip(values.iter()) {
            let value = value.to_lowercase();
            if let Some(position) = field.categories.iter().position(|c| *c == value) {
                encoded[offset + position] = 1.0;
            }
            offset += field.categories.len();
        }
        Ok(encoded)
    }

    /// Names of the fitted fields, in encoding order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> CategoricalEncoder {
        CategoricalEncoder::fit(vec![
            (
                "employment_type".to_string(),
                vec!["Full-time".to_string(), "Part-time".to_string()],
            ),
            (
                "industry".to_string(),
                vec!["Finance".to_string(), "Retail".to_string()],
            ),
        ])
    }

    #[test]
    fn test_unfitted_transform_is_an_error() {
        let encoder = CategoricalEncoder::default();
        assert!(matches!(
            encoder.transform(&["full-time"]),
            Err(DetectorError::EncoderNotFitted)
        ));
    }

    #[test]
    fn test_one_hot_encoding() {
        let encoder = encoder();
        let encoded = encoder.transform(&["part-time", "finance"]).unwrap();
        assert_eq!(encoded, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_value_encodes_as_zeros() {
        let encoder = encoder();
        let encoded = encoder.transform(&["internship", "finance"]).unwrap();
        assert_eq!(encoded, vec![0.0, 0.0, 1.0, 0.0]);
    }
}
