use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AnalysisError;

/// Paramètres des calculs statistiques.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Paramètre α du prior Beta.
    pub alpha: f64,
    /// Paramètre β du prior Beta.
    pub beta: f64,
    /// Écart relatif au-delà duquel un numéro est HOT (ou COLD en négatif).
    pub hot_cold_threshold: f64,
    pub hot_cold_window: usize,
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            hot_cold_threshold: 0.2,
            hot_cold_window: 50,
            top_n: 10,
        }
    }
}

impl AnalysisConfig {
    /// Fichier absent : configuration par défaut. Fichier illisible ou invalide : erreur.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            log::debug!("pas de configuration dans {}, valeurs par défaut", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        let config: AnalysisConfig = serde_json::from_str(&json)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| AnalysisError::Config(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.alpha > 0.0 && self.beta > 0.0) {
            return Err(AnalysisError::Config(format!(
                "alpha et beta doivent être > 0 (alpha={}, beta={})",
                self.alpha, self.beta
            )));
        }
        if !(self.hot_cold_threshold >= 0.0) {
            return Err(AnalysisError::Config(format!(
                "hot_cold_threshold doit être >= 0 ({})",
                self.hot_cold_threshold
            )));
        }
        Ok(())
    }
}
