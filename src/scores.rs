//! Confidence-score post-processing
//!
//! Turns per-row log-probabilities into either the top-1 `(label, confidence)`
//! pair or a full per-class distribution. Confidences are
//! `100 * exp(log_prob)` rounded to 3 decimals; a full distribution therefore
//! sums to ~100. Row order always matches input name order.

use crate::error::{EngineError, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// One classification outcome for a single name
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Top-1 mode: serialized as `[label, confidence]`
    Top(String, f64),
    /// Distribution mode: serialized as `{label: confidence}` in class order
    Distribution(Vec<(String, f64)>),
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Prediction::Top(label, confidence) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(label)?;
                seq.serialize_element(confidence)?;
                seq.end()
            }
            Prediction::Distribution(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (label, confidence) in pairs {
                    map.serialize_entry(label, confidence)?;
                }
                map.end()
            }
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn confidence(log_prob: f32) -> f64 {
    round3(100.0 * f64::from(log_prob).exp())
}

/// Top-1 interpretation: argmax label and its confidence, per row.
pub fn top_predictions(log_probs: &[Vec<f32>], classes: &[String]) -> Result<Vec<Prediction>> {
    log_probs
        .iter()
        .map(|row| {
            if row.len() != classes.len() {
                return Err(EngineError::processing(format!(
                    "model emitted {} scores for {} classes",
                    row.len(),
                    classes.len()
                )));
            }
            let (best_idx, best_log_prob) = row
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .ok_or_else(|| EngineError::processing("empty score row"))?;

            Ok(Prediction::Top(
                classes[best_idx].clone(),
                confidence(*best_log_prob),
            ))
        })
        .collect()
}

/// Distribution interpretation: every class label with its confidence, per row.
pub fn distributions(log_probs: &[Vec<f32>], classes: &[String]) -> Result<Vec<Prediction>> {
    log_probs
        .iter()
        .map(|row| {
            if row.len() != classes.len() {
                return Err(EngineError::processing(format!(
                    "model emitted {} scores for {} classes",
                    row.len(),
                    classes.len()
                )));
            }
            let dist = classes
                .iter()
                .zip(row.iter())
                .map(|(label, lp)| (label.clone(), confidence(*lp)))
                .collect();
            Ok(Prediction::Distribution(dist))
        })
        .collect()
}

/// Interpret scores in the requested mode.
pub fn interpret(
    log_probs: &[Vec<f32>],
    classes: &[String],
    get_distribution: bool,
) -> Result<Vec<Prediction>> {
    if get_distribution {
        distributions(log_probs, classes)
    } else {
        top_predictions(log_probs, classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["chinese".to_string(), "else".to_string()]
    }

    // log(0.9), log(0.1)
    fn sample_rows() -> Vec<Vec<f32>> {
        vec![
            vec![(0.9f32).ln(), (0.1f32).ln()],
            vec![(0.25f32).ln(), (0.75f32).ln()],
        ]
    }

    #[test]
    fn test_top_predictions() {
        let preds = top_predictions(&sample_rows(), &classes()).unwrap();
        assert_eq!(preds[0], Prediction::Top("chinese".to_string(), 90.0));
        assert_eq!(preds[1], Prediction::Top("else".to_string(), 75.0));
    }

    #[test]
    fn test_distribution_sums_to_100() {
        let preds = distributions(&sample_rows(), &classes()).unwrap();
        for pred in preds {
            let Prediction::Distribution(dist) = pred else {
                panic!("expected distribution");
            };
            let total: f64 = dist.iter().map(|(_, c)| c).sum();
            assert!((total - 100.0).abs() < 1e-3, "sum was {}", total);
        }
    }

    #[test]
    fn test_distribution_preserves_class_order() {
        let preds = distributions(&sample_rows(), &classes()).unwrap();
        let Prediction::Distribution(dist) = &preds[0] else {
            panic!("expected distribution");
        };
        let labels: Vec<&str> = dist.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["chinese", "else"]);
    }

    #[test]
    fn test_top1_matches_distribution_argmax() {
        let rows = sample_rows();
        let tops = top_predictions(&rows, &classes()).unwrap();
        let dists = distributions(&rows, &classes()).unwrap();

        for (top, dist) in tops.iter().zip(dists.iter()) {
            let Prediction::Top(label, _) = top else {
                panic!("expected top-1");
            };
            let Prediction::Distribution(dist) = dist else {
                panic!("expected distribution");
            };
            let argmax = dist
                .iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(l, _)| l)
                .unwrap();
            assert_eq!(label, argmax);
        }
    }

    #[test]
    fn test_rounding_to_three_decimals() {
        let rows = vec![vec![(0.123456f32).ln(), (0.876544f32).ln()]];
        let preds = distributions(&rows, &classes()).unwrap();
        let Prediction::Distribution(dist) = &preds[0] else {
            panic!("expected distribution");
        };
        for (_, c) in dist {
            assert_eq!(round3(*c), *c);
        }
    }

    #[test]
    fn test_wire_format() {
        let top = Prediction::Top("chinese".to_string(), 90.0);
        assert_eq!(
            serde_json::to_value(&top).unwrap(),
            serde_json::json!(["chinese", 90.0])
        );

        let dist = Prediction::Distribution(vec![
            ("chinese".to_string(), 90.0),
            ("else".to_string(), 10.0),
        ]);
        let value = serde_json::to_value(&dist).unwrap();
        assert_eq!(value["chinese"], 90.0);
        assert_eq!(value["else"], 10.0);
    }

    #[test]
    fn test_class_count_mismatch_is_contract_violation() {
        let rows = vec![vec![0.0f32; 3]];
        assert!(top_predictions(&rows, &classes()).is_err());
        assert!(distributions(&rows, &classes()).is_err());
    }
}
