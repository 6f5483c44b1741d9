use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("malformed url '{url}': {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
