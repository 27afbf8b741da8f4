use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Threshold tiers
// ---------------------------------------------------------------------------

/// One status tier: values strictly above `bound` get `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub bound: f64,
    pub label: String,
}

impl Tier {
    pub fn new(bound: f64, label: impl Into<String>) -> Self {
        Self {
            bound,
            label: label.into(),
        }
    }
}

/// Ordered classification table.
///
/// Tiers are kept sorted from the highest bound to the lowest, so
/// `classify` is a first-match scan. Values that clear no tier (and NaN)
/// fall through to `default_label`, the lowest status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawThresholds")]
pub struct Thresholds {
    tiers: Vec<Tier>,
    default_label: String,
}

#[derive(Deserialize)]
struct RawThresholds {
    tiers: Vec<Tier>,
    default_label: String,
}

impl From<RawThresholds> for Thresholds {
    fn from(raw: RawThresholds) -> Self {
        Thresholds::new(raw.tiers, raw.default_label)
    }
}

impl Thresholds {
    pub fn new(mut tiers: Vec<Tier>, default_label: impl Into<String>) -> Self {
        tiers.sort_by(|a, b| b.bound.total_cmp(&a.bound));
        Self {
            tiers,
            default_label: default_label.into(),
        }
    }

    /// Build from `(bound, label)` pairs in any order.
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (f64, S)>,
        default_label: impl Into<String>,
    ) -> Self {
        let tiers = pairs
            .into_iter()
            .map(|(bound, label)| Tier::new(bound, label))
            .collect();
        Self::new(tiers, default_label)
    }

    /// Label for `value` under strict `>` semantics.
    pub fn classify(&self, value: f64) -> &str {
        self.tiers
            .iter()
            .find(|tier| value > tier.bound)
            .map(|tier| tier.label.as_str())
            .unwrap_or(&self.default_label)
    }

    /// Tiers, highest bound first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// The lowest status label.
    pub fn default_label(&self) -> &str {
        &self.default_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health() -> Thresholds {
        Thresholds::from_pairs(
            [(0.8, "healthy"), (0.4, "moderate"), (0.2, "stressed")],
            "severe",
        )
    }

    #[test]
    fn test_classify_strict_bounds() {
        let t = health();
        assert_eq!(t.classify(0.81), "healthy");
        assert_eq!(t.classify(0.8), "moderate");
        assert_eq!(t.classify(0.41), "moderate");
        assert_eq!(t.classify(0.4), "stressed");
        assert_eq!(t.classify(0.2), "severe");
        assert_eq!(t.classify(0.19), "severe");
        assert_eq!(t.classify(-1.0), "severe");
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let t = Thresholds::from_pairs(
            [(0.2, "stressed"), (0.8, "healthy"), (0.4, "moderate")],
            "severe",
        );
        let bounds: Vec<f64> = t.tiers().iter().map(|t| t.bound).collect();
        assert_eq!(bounds, vec![0.8, 0.4, 0.2]);
        assert_eq!(t.classify(0.5), "moderate");
    }

    #[test]
    fn test_nan_falls_to_default() {
        assert_eq!(health().classify(f64::NAN), "severe");
    }

    #[test]
    fn test_empty_table() {
        let t = Thresholds::new(Vec::new(), "n/a");
        assert_eq!(t.classify(100.0), "n/a");
    }

    #[test]
    fn test_deserialize_sorts() {
        let json = r#"{
            "tiers": [
                {"bound": 0.05, "label": "possible stress"},
                {"bound": 0.18, "label": "very healthy"},
                {"bound": 0.12, "label": "moderately healthy"}
            ],
            "default_label": "severe stress"
        }"#;
        let t: Thresholds = serde_json::from_str(json).unwrap();
        assert_eq!(t.tiers()[0].label, "very healthy");
        assert_eq!(t.classify(0.13), "moderately healthy");
        assert_eq!(t.classify(0.05), "severe stress");
    }
}
