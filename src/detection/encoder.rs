use std::collections::BTreeMap;

/// Maps categorical values to small integer codes
///
/// Codes are ranks of the distinct values in sorted order, so they are only
/// meaningful for the dataset the encoder was fitted on.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    codes: BTreeMap<String, usize>,
}

impl LabelEncoder {
    /// Build a vocabulary from the observed values
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes: BTreeMap<String, usize> = values
            .into_iter()
            .map(|value| (value.as_ref().to_string(), 0))
            .collect();
        for (code, slot) in codes.values_mut().enumerate() {
            *slot = code;
        }
        LabelEncoder { codes }
    }

    /// Look up the code for a value seen during fitting
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// Code for a value, with unseen values mapped to -1
    pub fn transform_or_unseen(&self, value: &str) -> f64 {
        self.transform(value).map(|code| code as f64).unwrap_or(-1.0)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Distinct values in code order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.codes.keys().map(|k| k.as_str())
    }
}
