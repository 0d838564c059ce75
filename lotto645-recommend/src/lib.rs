pub mod combine;
pub mod error;
pub mod methods;
pub mod recommender;
pub mod request;

pub use combine::{list_combine_algorithms, CombineAlgorithm};
pub use error::RecommendError;
pub use methods::{list_methods, Method};
pub use recommender::Recommender;
pub use request::{Recommendation, RecommendRequest};
