use lotto645_db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("requête invalide : {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
