use thiserror::Error;

use crate::admission::AdmissionError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("admission contract violated: {0}")]
    Admission(#[from] AdmissionError),
}
