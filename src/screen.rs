pub mod dashboard;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("\"{0}\" is not a valid symbol")]
    InvalidSymbol(String),
    #[error("{0}")]
    Fetch(String),
}
