use thiserror::Error;

/// Faults raised when an answer breaks the contract between decoder and
/// encoder. Contradictory tagging is never reported here, it decodes to
/// [`MaxSpeedAnswer::Invalid`](crate::types::MaxSpeedAnswer::Invalid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaxspeedError {
    #[error("living street or school zone classification differs between forward and backward")]
    DirectionalClassification,
    #[error("a single vehicle class ({0}) cannot be classified as living street or school zone")]
    VehicleClassification(String),
    #[error("road type in {0} has no tag value and cannot be written")]
    UnknownRoadType(String),
    #[error("invalid answer: {0}")]
    InvalidAnswer(String),
}
