use certview_types::VaccinationState;

/// Errors raised by configuration and the certificate store.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read certificate data directory: {0}")]
    DataDirRead(std::io::Error),
    #[error("snapshot error: {0}")]
    Wire(#[from] certview_wire::WireError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Caller-side contract violations of the derivation API.
///
/// Derivation itself is total; these are only returned when a cell is requested that the
/// section row counts would never have produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("the QR code cell cannot be shown without a health certificate")]
    NoCertificates,
    #[error("the fully vaccinated hint cannot be shown in vaccination state {0:?}")]
    HintNotApplicable(VaccinationState),
}
