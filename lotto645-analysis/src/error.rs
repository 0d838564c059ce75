use lotto645_db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Un tirage attendu dans la plage de rattrapage est absent de la base.
    #[error("le tirage {0} est absent de la base")]
    MissingDraw(u32),
    #[error("configuration invalide : {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(AnalysisError::MissingDraw(12).to_string(), "le tirage 12 est absent de la base");
        let store = AnalysisError::from(StoreError::InvalidDraw("doublon".to_string()));
        assert_eq!(store.to_string(), "tirage invalide : doublon");
    }
}
