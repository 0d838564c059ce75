use lotto645_db::models::{AnalysisRow, POOL_SIZE};
use serde::Serialize;

/// Probabilité par numéro, indexée par `numéro - 1`.
pub type ProbMap = [f64; POOL_SIZE];

/// Méthodes d'analyse proposées pour la recommandation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    NumberFrequency,
    ReappearProb,
    FirstPosition,
    LastPosition,
    PairFrequency,
    Consecutive,
    OddEvenRatio,
    HighLowRatio,
    Bayesian,
    HotCold,
}

/// Colonne de la table d'analyse lue par une méthode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceField {
    TotalProb,
    ReappearProb,
    FirstProb,
    LastProb,
    BayesianPost,
}

impl SourceField {
    pub fn read(&self, row: &AnalysisRow) -> f64 {
        match self {
            SourceField::TotalProb => row.total_prob,
            SourceField::ReappearProb => row.reappear_prob,
            SourceField::FirstProb => row.first_prob,
            SourceField::LastProb => row.last_prob,
            SourceField::BayesianPost => row.bayesian_post,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SourceField::TotalProb => "total_prob",
            SourceField::ReappearProb => "reappear_prob",
            SourceField::FirstProb => "first_prob",
            SourceField::LastProb => "last_prob",
            SourceField::BayesianPost => "bayesian_post",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub field: &'static str,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::NumberFrequency,
        Method::ReappearProb,
        Method::FirstPosition,
        Method::LastPosition,
        Method::PairFrequency,
        Method::Consecutive,
        Method::OddEvenRatio,
        Method::HighLowRatio,
        Method::Bayesian,
        Method::HotCold,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Method::NumberFrequency => "NUMBER_FREQUENCY",
            Method::ReappearProb => "REAPPEAR_PROB",
            Method::FirstPosition => "FIRST_POSITION",
            Method::LastPosition => "LAST_POSITION",
            Method::PairFrequency => "PAIR_FREQUENCY",
            Method::Consecutive => "CONSECUTIVE",
            Method::OddEvenRatio => "ODD_EVEN_RATIO",
            Method::HighLowRatio => "HIGH_LOW_RATIO",
            Method::Bayesian => "BAYESIAN",
            Method::HotCold => "HOT_COLD",
        }
    }

    pub fn from_code(code: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Les méthodes combinatoires n'ont pas de colonne propre : elles lisent total_prob.
    pub fn field(&self) -> SourceField {
        match self {
            Method::ReappearProb => SourceField::ReappearProb,
            Method::FirstPosition => SourceField::FirstProb,
            Method::LastPosition => SourceField::LastProb,
            Method::Bayesian | Method::HotCold => SourceField::BayesianPost,
            Method::NumberFrequency
            | Method::PairFrequency
            | Method::Consecutive
            | Method::OddEvenRatio
            | Method::HighLowRatio => SourceField::TotalProb,
        }
    }

    pub fn info(&self) -> MethodInfo {
        let (name, description) = match self {
            Method::NumberFrequency => ("Fréquence", "Taux de sortie cumulé de chaque numéro"),
            Method::ReappearProb => ("Réapparition", "Probabilité de ressortir au tirage suivant"),
            Method::FirstPosition => ("Premier numéro", "Fréquence comme plus petit numéro du tirage"),
            Method::LastPosition => ("Dernier numéro", "Fréquence comme plus grand numéro du tirage"),
            Method::PairFrequency => ("Paires", "Co-occurrence des paires de numéros"),
            Method::Consecutive => ("Suites", "Présence de numéros consécutifs"),
            Method::OddEvenRatio => ("Pair/impair", "Répartition impairs:pairs"),
            Method::HighLowRatio => ("Haut/bas", "Répartition hauts (23-45) : bas (1-22)"),
            Method::Bayesian => ("Bayésien", "Postérieur Beta-Binomial cumulé"),
            Method::HotCold => ("Chaud/froid", "Écart à la fréquence attendue sur une fenêtre récente"),
        };
        MethodInfo {
            code: self.code(),
            name,
            description,
            field: self.field().column(),
        }
    }
}

pub fn list_methods() -> Vec<MethodInfo> {
    Method::ALL.iter().map(Method::info).collect()
}

/// Champ lu pour un code de méthode ; un code inconnu retombe sur total_prob.
pub fn field_for_code(code: &str) -> SourceField {
    Method::from_code(code)
        .map(|m| m.field())
        .unwrap_or(SourceField::TotalProb)
}

/// Carte de probabilités d'une méthode ; les numéros absents des lignes valent 0.
pub fn probability_map(code: &str, rows: &[AnalysisRow]) -> ProbMap {
    let field = field_for_code(code);
    let mut map = [0.0; POOL_SIZE];
    for row in rows {
        if (1..=POOL_SIZE as u8).contains(&row.number) {
            map[(row.number - 1) as usize] = field.read(row);
        }
    }
    map
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Profil miroir : total_prob croît avec le numéro, reappear_prob décroît.
    pub(crate) fn mirror_rows() -> Vec<AnalysisRow> {
        (1..=45u8)
            .map(|number| {
                let n = number as f64;
                AnalysisRow {
                    draw_no: 100,
                    number,
                    total_count: number as u32,
                    total_prob: n / 1000.0,
                    bonus_count: 0,
                    bonus_prob: n / 2000.0,
                    first_count: 0,
                    first_prob: ((number % 10) as f64 + 1.0) / 100.0,
                    last_count: 0,
                    last_prob: (n % 7.0 + 1.0) / 100.0,
                    reappear_total: 0,
                    reappear_count: 0,
                    reappear_prob: (46.0 - n) / 1000.0,
                    bayesian_prior: 0.0,
                    bayesian_post: n / 500.0,
                    appeared: false,
                }
            })
            .collect()
    }

    #[test]
    fn test_method_fields() {
        let rows = mirror_rows();
        let cases = [
            ("NUMBER_FREQUENCY", 10, 0.010),
            ("NUMBER_FREQUENCY", 45, 0.045),
            ("REAPPEAR_PROB", 1, 0.045),
            ("FIRST_POSITION", 10, 0.01),
            ("BAYESIAN", 5, 0.01),
            ("HOT_COLD", 5, 0.01),
            ("PAIR_FREQUENCY", 20, 0.020),
            ("ODD_EVEN_RATIO", 20, 0.020),
        ];
        for (code, number, expected) in cases {
            let map = probability_map(code, &rows);
            assert!(
                (map[number - 1] - expected).abs() < 1e-12,
                "{code}[{number}] = {}",
                map[number - 1]
            );
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_total_prob() {
        let rows = mirror_rows();
        assert_eq!(probability_map("SOMETHING_ELSE", &rows), probability_map("NUMBER_FREQUENCY", &rows));
        assert_eq!(field_for_code(""), SourceField::TotalProb);
    }

    #[test]
    fn test_empty_rows_give_zero_map() {
        let map = probability_map("BAYESIAN", &[]);
        assert!(map.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_list_methods() {
        let methods = list_methods();
        assert_eq!(methods.len(), 10);
        assert_eq!(methods[0].code, "NUMBER_FREQUENCY");
        for info in &methods {
            assert_eq!(Method::from_code(info.code).map(|m| m.code()), Some(info.code));
        }
    }
}
