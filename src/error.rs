use crate::basin::error::{CatalogError, ResolveError};
use crate::export::error::ExportError;
use crate::series::error::ExtractError;
use crate::types::error::ParameterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Era5Error {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
