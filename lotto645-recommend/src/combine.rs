use lotto645_db::models::POOL_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::methods::ProbMap;

/// Borne de sécurité pour les produits de probabilités.
pub const EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombineAlgorithm {
    #[default]
    SimpleAvg,
    WeightedAvg,
    BayesianCombine,
    GeometricMean,
    /// Déclaré mais non implémenté : se comporte comme la moyenne simple.
    MinMax,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombineInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_active: bool,
}

impl CombineAlgorithm {
    pub const ALL: [CombineAlgorithm; 5] = [
        CombineAlgorithm::SimpleAvg,
        CombineAlgorithm::WeightedAvg,
        CombineAlgorithm::BayesianCombine,
        CombineAlgorithm::GeometricMean,
        CombineAlgorithm::MinMax,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CombineAlgorithm::SimpleAvg => "SIMPLE_AVG",
            CombineAlgorithm::WeightedAvg => "WEIGHTED_AVG",
            CombineAlgorithm::BayesianCombine => "BAYESIAN_COMBINE",
            CombineAlgorithm::GeometricMean => "GEOMETRIC_MEAN",
            CombineAlgorithm::MinMax => "MIN_MAX",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CombineAlgorithm::MinMax)
    }

    pub fn info(&self) -> CombineInfo {
        let (name, description) = match self {
            CombineAlgorithm::SimpleAvg => ("Moyenne simple", "Moyenne arithmétique des probabilités"),
            CombineAlgorithm::WeightedAvg => ("Moyenne pondérée", "Moyenne pondérée par méthode"),
            CombineAlgorithm::BayesianCombine => (
                "Combinaison bayésienne",
                "Indices indépendants : ∏p / (∏p + ∏(1-p))",
            ),
            CombineAlgorithm::GeometricMean => ("Moyenne géométrique", "Racine n-ième du produit"),
            CombineAlgorithm::MinMax => ("Min/Max", "Non disponible"),
        };
        CombineInfo {
            code: self.code(),
            name,
            description,
            is_active: self.is_active(),
        }
    }
}

impl std::fmt::Display for CombineAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for CombineAlgorithm {
    type Err = String;

    /// Un code vide désigne la moyenne simple.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Ok(CombineAlgorithm::SimpleAvg);
        }
        CombineAlgorithm::ALL
            .into_iter()
            .find(|a| a.code() == code)
            .ok_or_else(|| format!("algorithme de combinaison inconnu : {s}"))
    }
}

pub fn list_combine_algorithms() -> Vec<CombineInfo> {
    CombineAlgorithm::ALL.iter().map(CombineAlgorithm::info).collect()
}

fn clamp(p: f64) -> f64 {
    p.clamp(EPSILON, 1.0 - EPSILON)
}

pub fn simple_average(ps: &[f64]) -> f64 {
    if ps.is_empty() {
        return 0.0;
    }
    ps.iter().sum::<f64>() / ps.len() as f64
}

/// Σ(w·p) / Σw ; moyenne simple si la somme des poids est nulle.
pub fn weighted_average(ps: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return simple_average(ps);
    }
    ps.iter().zip(weights).map(|(p, w)| p * w).sum::<f64>() / total
}

pub fn bayesian_combine(ps: &[f64]) -> f64 {
    if ps.is_empty() {
        return 0.0;
    }
    let (prod_p, prod_not_p) = ps.iter().fold((1.0, 1.0), |(yes, no), &p| {
        let p = clamp(p);
        (yes * p, no * (1.0 - p))
    });
    prod_p / (prod_p + prod_not_p)
}

pub fn geometric_mean(ps: &[f64]) -> f64 {
    if ps.is_empty() {
        return 0.0;
    }
    let product: f64 = ps.iter().map(|&p| clamp(p)).product();
    product.powf(1.0 / ps.len() as f64)
}

/// Fusionne les cartes de probabilités des méthodes `codes` (même ordre que `maps`).
/// Une méthode sans poids compte pour 0 dans la moyenne pondérée.
pub fn combine(
    algorithm: CombineAlgorithm,
    maps: &[ProbMap],
    codes: &[String],
    weights: &HashMap<String, f64>,
) -> ProbMap {
    let mut combined = [0.0; POOL_SIZE];
    if maps.is_empty() {
        return combined;
    }

    let method_weights: Vec<f64> = codes
        .iter()
        .map(|code| weights.get(code).copied().unwrap_or(0.0))
        .collect();

    for (idx, slot) in combined.iter_mut().enumerate() {
        let ps: Vec<f64> = maps.iter().map(|m| m[idx]).collect();
        *slot = match algorithm {
            CombineAlgorithm::WeightedAvg => weighted_average(&ps, &method_weights),
            CombineAlgorithm::BayesianCombine => bayesian_combine(&ps),
            CombineAlgorithm::GeometricMean => geometric_mean(&ps),
            CombineAlgorithm::SimpleAvg | CombineAlgorithm::MinMax => simple_average(&ps),
        };
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::probability_map;
    use crate::methods::tests::mirror_rows;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_simple_average_order_independent() {
        let a = [0.13, 0.72];
        let b = [0.72, 0.13];
        assert_eq!(simple_average(&a), simple_average(&b));

        let rows = mirror_rows();
        let m1 = probability_map("NUMBER_FREQUENCY", &rows);
        let m2 = probability_map("BAYESIAN", &rows);
        let codes_ab = vec!["NUMBER_FREQUENCY".to_string(), "BAYESIAN".to_string()];
        let codes_ba = vec!["BAYESIAN".to_string(), "NUMBER_FREQUENCY".to_string()];
        let none = HashMap::new();
        assert_eq!(
            combine(CombineAlgorithm::SimpleAvg, &[m1, m2], &codes_ab, &none),
            combine(CombineAlgorithm::SimpleAvg, &[m2, m1], &codes_ba, &none)
        );
    }

    #[test]
    fn test_bayesian_equal_inputs_unchanged() {
        for p in [0.1, 0.35, 0.5, 0.9] {
            assert!(approx(bayesian_combine(&[p, p]), p * p / (p * p + (1.0 - p) * (1.0 - p)), 1e-12));
        }
        // p = 0.5 est le point fixe de la combinaison
        assert!(approx(bayesian_combine(&[0.5, 0.5]), 0.5, 1e-12));
        assert!(approx(bayesian_combine(&[0.42]), 0.42, 1e-12));
    }

    #[test]
    fn test_bayesian_amplifies_agreement() {
        let combined = bayesian_combine(&[0.8, 0.7]);
        assert!(combined > simple_average(&[0.8, 0.7]), "{combined}");
        assert!(approx(bayesian_combine(&[0.6, 0.8]), 0.8571, 1e-3));
        assert!(approx(bayesian_combine(&[0.6, 0.7, 0.8]), 0.9333, 1e-3));
    }

    #[test]
    fn test_bayesian_suppresses_disagreement() {
        let combined = bayesian_combine(&[0.6, 0.2]);
        assert!(combined < simple_average(&[0.6, 0.2]), "{combined}");
        assert!(approx(bayesian_combine(&[0.3, 0.4]), 0.2222, 1e-3));
    }

    #[test]
    fn test_bayesian_extremes_clamped() {
        let low = bayesian_combine(&[0.0, 0.0]);
        let high = bayesian_combine(&[1.0, 1.0]);
        assert!(low.is_finite() && low < 1e-6);
        assert!(high.is_finite() && high > 1.0 - 1e-6);
        assert!(bayesian_combine(&[0.0, 1.0]).is_finite());
    }

    #[test]
    fn test_geometric_mean() {
        assert!(approx(geometric_mean(&[0.4, 0.9]), 0.6, 1e-12));
        assert!(geometric_mean(&[0.0, 0.5]).is_finite());
        for ps in [[0.1, 0.9], [0.3, 0.3], [0.05, 0.6], [0.0, 0.7]] {
            assert!(geometric_mean(&ps) <= simple_average(&ps) + 1e-12, "{ps:?}");
        }
    }

    #[test]
    fn test_weighted_average() {
        // Méthode A : 0.10 / 0.40, méthode B : 0.50 / 0.20, poids A=0.7 B=0.3
        let weights = [0.7, 0.3];
        let a = weighted_average(&[0.10, 0.50], &weights);
        let b = weighted_average(&[0.40, 0.20], &weights);
        assert!(approx(a, 0.22, 1e-12), "{a}");
        assert!(approx(b, 0.34, 1e-12), "{b}");
    }

    #[test]
    fn test_weighted_equal_weights_is_simple() {
        let ps = [0.12, 0.47, 0.3];
        assert!(approx(weighted_average(&ps, &[2.0, 2.0, 2.0]), simple_average(&ps), 1e-12));
        assert!(approx(weighted_average(&ps, &[0.0, 0.0, 0.0]), simple_average(&ps), 1e-12));
    }

    #[test]
    fn test_weighted_missing_key_is_zero() {
        let rows = mirror_rows();
        let m1 = probability_map("NUMBER_FREQUENCY", &rows);
        let m2 = probability_map("REAPPEAR_PROB", &rows);
        let codes = vec!["NUMBER_FREQUENCY".to_string(), "REAPPEAR_PROB".to_string()];
        let weights = HashMap::from([("NUMBER_FREQUENCY".to_string(), 1.0)]);
        let combined = combine(CombineAlgorithm::WeightedAvg, &[m1, m2], &codes, &weights);
        assert_eq!(combined, m1);
    }

    #[test]
    fn test_mirror_profile_is_symmetric() {
        let rows = mirror_rows();
        let m1 = probability_map("NUMBER_FREQUENCY", &rows);
        let m2 = probability_map("REAPPEAR_PROB", &rows);
        let codes = vec!["NUMBER_FREQUENCY".to_string(), "REAPPEAR_PROB".to_string()];
        let combined = combine(CombineAlgorithm::SimpleAvg, &[m1, m2], &codes, &HashMap::new());
        assert!(approx(combined[0], combined[44], 1e-15));
        for score in combined {
            assert!(approx(score, 0.023, 1e-12));
        }
    }

    #[test]
    fn test_min_max_falls_back() {
        let rows = mirror_rows();
        let maps = [probability_map("NUMBER_FREQUENCY", &rows), probability_map("BAYESIAN", &rows)];
        let codes = vec!["NUMBER_FREQUENCY".to_string(), "BAYESIAN".to_string()];
        let none = HashMap::new();
        assert_eq!(
            combine(CombineAlgorithm::MinMax, &maps, &codes, &none),
            combine(CombineAlgorithm::SimpleAvg, &maps, &codes, &none)
        );
    }

    #[test]
    fn test_list_combine_algorithms() {
        let algos = list_combine_algorithms();
        assert_eq!(algos.len(), 5);
        assert_eq!(algos.iter().filter(|a| a.is_active).count(), 4);
        assert_eq!(algos[0].code, "SIMPLE_AVG");
        assert!(algos[0].is_active);
        assert!(!algos[4].is_active);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("".parse::<CombineAlgorithm>().unwrap(), CombineAlgorithm::SimpleAvg);
        assert_eq!("bayesian_combine".parse::<CombineAlgorithm>().unwrap(), CombineAlgorithm::BayesianCombine);
        assert!("MEDIAN".parse::<CombineAlgorithm>().is_err());
        let json = serde_json::to_string(&CombineAlgorithm::GeometricMean).unwrap();
        assert_eq!(json, "\"GEOMETRIC_MEAN\"");
    }
}
