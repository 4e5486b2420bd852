use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiServerError {
    #[error("API server I/O error ({operation}): {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}
