use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combine::CombineAlgorithm;
use crate::error::RecommendError;

pub const MAX_METHODS: usize = 3;
pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Codes de méthode ; un code inconnu est lu comme NUMBER_FREQUENCY.
    pub methods: Vec<String>,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub combine: CombineAlgorithm,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub include_bonus: bool,
}

fn default_count() -> usize {
    MIN_COUNT
}

impl RecommendRequest {
    pub fn new(methods: Vec<String>, combine: CombineAlgorithm) -> Self {
        Self {
            methods,
            weights: HashMap::new(),
            combine,
            count: MIN_COUNT,
            include_bonus: false,
        }
    }

    /// Nombre de grilles demandé, ramené dans 1..=10.
    pub fn clamped_count(&self) -> usize {
        self.count.clamp(MIN_COUNT, MAX_COUNT)
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.methods.is_empty() {
            return Err(RecommendError::InvalidRequest(
                "au moins une méthode est requise".to_string(),
            ));
        }
        if self.methods.len() > MAX_METHODS {
            return Err(RecommendError::InvalidRequest(format!(
                "au plus {MAX_METHODS} méthodes (reçu {})",
                self.methods.len()
            )));
        }

        if self.combine == CombineAlgorithm::WeightedAvg {
            if self.weights.is_empty() {
                return Err(RecommendError::InvalidRequest(
                    "WEIGHTED_AVG exige des poids".to_string(),
                ));
            }
            for (code, &weight) in &self.weights {
                if !self.methods.contains(code) {
                    return Err(RecommendError::InvalidRequest(format!(
                        "poids pour une méthode non demandée : {code}"
                    )));
                }
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(RecommendError::InvalidRequest(format!(
                        "le poids de {code} doit être fini et > 0 (reçu {weight})"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Six numéros en ordre croissant.
    pub numbers: [u8; 6],
    pub bonus: Option<u8>,
    pub methods_used: Vec<String>,
    pub combine: CombineAlgorithm,
    /// Dans [0, 1].
    pub confidence: f64,
}
