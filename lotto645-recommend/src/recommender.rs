use lotto645_db::db;
use lotto645_db::models::{AnalysisRow, MAX_NUMBER, PICK_COUNT, POOL_SIZE};
use lotto645_db::rusqlite::Connection;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::combine::combine;
use crate::error::RecommendError;
use crate::methods::{probability_map, ProbMap};
use crate::request::{Recommendation, RecommendRequest};

/// Une confiance de 1 correspond à un score moyen de trois fois le taux uniforme.
const CONFIDENCE_SCALE: f64 = 3.0 / POOL_SIZE as f64;

pub struct Recommender {
    rng: StdRng,
}

impl Recommender {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Charge les 45 dernières lignes d'analyse puis produit les grilles.
    pub fn recommend_from_store(
        &mut self,
        conn: &Connection,
        request: &RecommendRequest,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let rows = db::latest_analysis_rows(conn)?;
        if rows.is_empty() {
            log::warn!("table d'analyse vide : sélection aléatoire");
        }
        self.recommend(&rows, request)
    }

    pub fn recommend(
        &mut self,
        rows: &[AnalysisRow],
        request: &RecommendRequest,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        request.validate()?;

        let maps: Vec<ProbMap> = request
            .methods
            .iter()
            .map(|code| probability_map(code, rows))
            .collect();
        let scores = combine(request.combine, &maps, &request.methods, &request.weights);
        log::debug!(
            "combinaison {} sur {} méthodes",
            request.combine,
            request.methods.len()
        );

        let recommendations = (0..request.clamped_count())
            .map(|_| {
                let numbers = self.select_top_numbers(&scores);
                let bonus = request
                    .include_bonus
                    .then(|| self.select_bonus(rows, &numbers));
                Recommendation {
                    numbers,
                    bonus,
                    methods_used: request.methods.clone(),
                    combine: request.combine,
                    confidence: confidence(&numbers, &scores, request.methods.len()),
                }
            })
            .collect();
        Ok(recommendations)
    }

    /// Les six meilleurs scores non nuls, égalités départagées au hasard ;
    /// les places restantes sont complétées par des numéros aléatoires.
    pub fn select_top_numbers(&mut self, scores: &ProbMap) -> [u8; 6] {
        let mut candidates: Vec<(u8, f64)> = (1..=MAX_NUMBER)
            .map(|n| (n, scores[(n - 1) as usize]))
            .filter(|&(_, score)| score > 0.0)
            .collect();
        // Mélange puis tri stable : l'ordre entre ex aequo est uniforme
        candidates.shuffle(&mut self.rng);
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut selected: Vec<u8> = candidates.iter().take(PICK_COUNT).map(|&(n, _)| n).collect();
        if selected.len() < PICK_COUNT {
            let mut unused: Vec<u8> = (1..=MAX_NUMBER).filter(|n| !selected.contains(n)).collect();
            while selected.len() < PICK_COUNT {
                let idx = self.rng.random_range(0..unused.len());
                selected.push(unused.swap_remove(idx));
            }
        }

        let mut numbers = [0u8; PICK_COUNT];
        numbers.copy_from_slice(&selected);
        numbers.sort_unstable();
        numbers
    }

    /// Meilleur bonus_prob hors des numéros retenus ; aléatoire sans statistiques.
    pub fn select_bonus(&mut self, rows: &[AnalysisRow], selected: &[u8]) -> u8 {
        let best = rows
            .iter()
            .filter(|r| !selected.contains(&r.number))
            .max_by(|a, b| a.bonus_prob.total_cmp(&b.bonus_prob).then(b.number.cmp(&a.number)));
        if let Some(row) = best {
            return row.number;
        }

        let unused: Vec<u8> = (1..=MAX_NUMBER).filter(|n| !selected.contains(n)).collect();
        unused[self.rng.random_range(0..unused.len())]
    }
}

/// Score moyen des numéros retenus rapporté à 3/45, borné à [0, 1].
pub fn confidence(numbers: &[u8], scores: &ProbMap, method_count: usize) -> f64 {
    if method_count == 0 || numbers.is_empty() {
        return 0.0;
    }
    let total: f64 = numbers.iter().map(|&n| scores[(n - 1) as usize]).sum();
    let mean = total / numbers.len() as f64;
    if !mean.is_finite() {
        return 0.0;
    }
    (mean / CONFIDENCE_SCALE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::CombineAlgorithm;
    use crate::methods::tests::mirror_rows;
    use std::collections::HashMap;

    fn scores_from(pairs: &[(u8, f64)]) -> ProbMap {
        let mut map = [0.0; POOL_SIZE];
        for &(n, s) in pairs {
            map[(n - 1) as usize] = s;
        }
        map
    }

    fn request(methods: &[&str], combine: CombineAlgorithm) -> RecommendRequest {
        RecommendRequest::new(methods.iter().map(|s| s.to_string()).collect(), combine)
    }

    #[test]
    fn test_select_top_six_of_ten() {
        let scores = scores_from(&[
            (1, 0.10),
            (2, 0.50),
            (3, 0.30),
            (4, 0.90),
            (5, 0.70),
            (6, 0.20),
            (7, 0.80),
            (8, 0.60),
            (9, 0.40),
            (10, 0.15),
        ]);
        let mut rec = Recommender::new(Some(7));
        for _ in 0..20 {
            assert_eq!(rec.select_top_numbers(&scores), [2, 4, 5, 7, 8, 9]);
        }
    }

    #[test]
    fn test_zero_scores_are_filled_randomly() {
        let scores = scores_from(&[(3, 0.2), (30, 0.1)]);
        let mut rec = Recommender::new(Some(11));
        for _ in 0..50 {
            let numbers = rec.select_top_numbers(&scores);
            assert!(numbers.contains(&3) && numbers.contains(&30));
            assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{numbers:?}");
            assert!(numbers.iter().all(|&n| (1..=45).contains(&n)));
        }
    }

    #[test]
    fn test_ties_are_randomized() {
        // 45 numéros à égalité : toute grille est possible
        let scores = [0.5; POOL_SIZE];
        let mut rec = Recommender::new(Some(3));
        let first = rec.select_top_numbers(&scores);
        let differs = (0..20).any(|_| rec.select_top_numbers(&scores) != first);
        assert!(differs);
    }

    #[test]
    fn test_seed_determinism() {
        let scores = [0.0; POOL_SIZE];
        let a = Recommender::new(Some(42)).select_top_numbers(&scores);
        let b = Recommender::new(Some(42)).select_top_numbers(&scores);
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_bonus() {
        let rows = mirror_rows();
        let mut rec = Recommender::new(Some(1));
        // bonus_prob croît avec le numéro
        assert_eq!(rec.select_bonus(&rows, &[1, 2, 3, 4, 5, 6]), 45);
        assert_eq!(rec.select_bonus(&rows, &[40, 41, 42, 43, 44, 45]), 39);

        let bonus = rec.select_bonus(&[], &[1, 2, 3, 4, 5, 6]);
        assert!((7..=45).contains(&bonus));
    }

    #[test]
    fn test_confidence() {
        let scores = scores_from(&[(1, 0.05), (2, 0.05), (3, 0.05), (4, 0.05), (5, 0.05), (6, 0.05)]);
        assert_eq!(confidence(&[1, 2, 3], &scores, 0), 0.0);
        assert_eq!(confidence(&[], &scores, 1), 0.0);
        let c = confidence(&[1, 2, 3, 4, 5, 6], &scores, 2);
        assert!((c - 0.75).abs() < 1e-9, "{c}");

        let high = scores_from(&[(1, 1.0), (2, 1.0)]);
        assert_eq!(confidence(&[1, 2], &high, 1), 1.0);

        let broken = scores_from(&[(1, f64::NAN), (2, f64::INFINITY)]);
        assert_eq!(confidence(&[1, 2], &broken, 1), 0.0);
    }

    #[test]
    fn test_infinite_weight_rejected() {
        let rows = mirror_rows();
        let mut req = request(&["NUMBER_FREQUENCY"], CombineAlgorithm::WeightedAvg);
        req.weights = HashMap::from([("NUMBER_FREQUENCY".to_string(), f64::INFINITY)]);
        assert!(matches!(
            Recommender::new(Some(4)).recommend(&rows, &req),
            Err(RecommendError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_recommend_end_to_end() {
        let rows = mirror_rows();
        let mut req = request(&["NUMBER_FREQUENCY", "BAYESIAN"], CombineAlgorithm::BayesianCombine);
        req.count = 3;
        req.include_bonus = true;

        let mut rec = Recommender::new(Some(5));
        let sets = rec.recommend(&rows, &req).unwrap();
        assert_eq!(sets.len(), 3);
        for set in &sets {
            // Les deux profils croissent avec le numéro
            assert_eq!(set.numbers, [40, 41, 42, 43, 44, 45]);
            assert_eq!(set.bonus, Some(39));
            assert_eq!(set.methods_used, req.methods);
            assert!((0.0..=1.0).contains(&set.confidence));
        }
    }

    #[test]
    fn test_recommend_count_clamped() {
        let rows = mirror_rows();
        let mut req = request(&["BAYESIAN"], CombineAlgorithm::SimpleAvg);
        req.count = 99;
        let sets = Recommender::new(Some(1)).recommend(&rows, &req).unwrap();
        assert_eq!(sets.len(), 10);
        req.count = 0;
        let sets = Recommender::new(Some(1)).recommend(&rows, &req).unwrap();
        assert_eq!(sets.len(), 1);
    }

    #[test]
    fn test_recommend_rejects_invalid_request() {
        let rows = mirror_rows();
        let req = request(&["A", "B", "C", "D"], CombineAlgorithm::SimpleAvg);
        assert!(matches!(
            Recommender::new(Some(1)).recommend(&rows, &req),
            Err(RecommendError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_weighted_recommendation() {
        let rows = mirror_rows();
        let mut req = request(&["NUMBER_FREQUENCY", "REAPPEAR_PROB"], CombineAlgorithm::WeightedAvg);
        req.weights = HashMap::from([
            ("NUMBER_FREQUENCY".to_string(), 0.2),
            ("REAPPEAR_PROB".to_string(), 0.8),
        ]);
        let sets = Recommender::new(Some(9)).recommend(&rows, &req).unwrap();
        // La réapparition domine : petits numéros
        assert_eq!(sets[0].numbers, [1, 2, 3, 4, 5, 6]);
        assert_eq!(sets[0].bonus, None);
    }

    #[test]
    fn test_recommend_from_store() {
        use lotto645_analysis::service::recalculate_all;
        use lotto645_analysis::AnalysisConfig;
        use lotto645_db::models::make_test_draws;

        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();

        let req = request(&["BAYESIAN", "FIRST_POSITION"], CombineAlgorithm::GeometricMean);
        // Sans analyse : grille aléatoire valide
        let empty = Recommender::new(Some(2)).recommend_from_store(&conn, &req).unwrap();
        assert!(empty[0].numbers.windows(2).all(|w| w[0] < w[1]));

        for draw in make_test_draws(30) {
            db::insert_draw(&conn, &draw).unwrap();
        }
        recalculate_all(&conn, &AnalysisConfig::default()).unwrap();
        let sets = Recommender::new(Some(2)).recommend_from_store(&conn, &req).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].numbers.iter().all(|&n| (1..=45).contains(&n)));
    }
}
