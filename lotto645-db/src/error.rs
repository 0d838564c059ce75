#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("erreur SQLite : {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),
    #[error("tirage invalide : {0}")]
    InvalidDraw(String),
    /// Un lot de lignes n'a pas pu être écrit ; la transaction a été annulée.
    #[error("écriture des lignes {table} du tirage {draw_no} impossible : {source}")]
    Persistence {
        table: &'static str,
        draw_no: u32,
        #[source]
        source: rusqlite::Error,
    },
}
