//! Mock disease predictor
//!
//! There is no model: a disease is drawn uniformly from the catalog and
//! paired with a uniform confidence in `[0.70, 0.99]`, rounded to two
//! decimals.

use crate::db::models::Disease;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const CONFIDENCE_MIN: f64 = 0.70;
pub const CONFIDENCE_MAX: f64 = 0.99;

/// One mock prediction
#[derive(Debug, Clone)]
pub struct Prediction {
    pub disease: Disease,
    pub confidence: f64,
}

/// Random predictor; seedable for reproducible runs
pub struct MockPredictor {
    rng: StdRng,
}

impl MockPredictor {
    /// Predictor seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic predictor for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a disease and confidence; `None` for an empty catalog
    pub fn predict(&mut self, catalog: &[Disease]) -> Option<Prediction> {
        let disease = catalog.choose(&mut self.rng)?.clone();
        let confidence = round_confidence(self.rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX));
        Some(Prediction {
            disease,
            confidence,
        })
    }
}

/// Round to two decimal places
pub fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn catalog() -> Vec<Disease> {
        (1..=3)
            .map(|id| Disease {
                id,
                name: format!("Disease {}", id),
                species: "Crop".to_string(),
                description: "d".to_string(),
                treatment: "t".to_string(),
                healthy_image_url: String::new(),
                care_tips: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_empty_catalog_yields_none() {
        let mut predictor = MockPredictor::seeded(1);
        assert!(predictor.predict(&[]).is_none());
    }

    #[test]
    fn test_confidence_range_and_rounding() {
        let catalog = catalog();
        let mut predictor = MockPredictor::seeded(42);

        for _ in 0..500 {
            let prediction = predictor.predict(&catalog).unwrap();
            assert!(prediction.confidence >= CONFIDENCE_MIN);
            assert!(prediction.confidence <= CONFIDENCE_MAX);
            assert_eq!(prediction.confidence, round_confidence(prediction.confidence));
        }
    }

    #[test]
    fn test_every_disease_reachable() {
        let catalog = catalog();
        let mut predictor = MockPredictor::seeded(7);

        let seen: HashSet<i64> = (0..200)
            .filter_map(|_| predictor.predict(&catalog))
            .map(|p| p.disease.id)
            .collect();
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let catalog = catalog();
        let mut a = MockPredictor::seeded(99);
        let mut b = MockPredictor::seeded(99);

        for _ in 0..20 {
            let pa = a.predict(&catalog).unwrap();
            let pb = b.predict(&catalog).unwrap();
            assert_eq!(pa.disease.id, pb.disease.id);
            assert_eq!(pa.confidence, pb.confidence);
        }
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.8749), 0.87);
        assert_eq!(round_confidence(0.875001), 0.88);
        assert_eq!(round_confidence(0.7), 0.7);
    }
}
