use rasterfx_core::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Unsupported PNG layout: {0}")]
    UnsupportedFormat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown kernel: {0}")]
    UnknownKernel(String),

    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
}

impl From<png::DecodingError> for AppError {
    fn from(e: png::DecodingError) -> Self {
        AppError::PngDecode(e.to_string())
    }
}

impl From<png::EncodingError> for AppError {
    fn from(e: png::EncodingError) -> Self {
        AppError::PngEncode(e.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kernel() {
        let error = AppError::UnknownKernel("wobble".to_string());
        assert_eq!(error.to_string(), "Unknown kernel: wobble");
    }

    #[test]
    fn test_unknown_pipeline() {
        let error = AppError::UnknownPipeline("poster".to_string());
        assert_eq!(error.to_string(), "Unknown pipeline: poster");
    }

    #[test]
    fn test_unsupported_format() {
        let error = AppError::UnsupportedFormat("16-bit grayscale".to_string());
        assert_eq!(error.to_string(), "Unsupported PNG layout: 16-bit grayscale");
    }

    #[test]
    fn test_config_error() {
        let error = AppError::Config("bad indent".to_string());
        assert_eq!(error.to_string(), "Config error: bad indent");
    }

    #[test]
    fn test_from_filter_error() {
        let error: AppError = FilterError::NullBuffer.into();
        match error {
            AppError::Filter(FilterError::NullBuffer) => {}
            other => panic!("Expected Filter variant, got {other:?}"),
        }
        assert_eq!(
            AppError::Filter(FilterError::NullBuffer).to_string(),
            "Filter error: buffer holds no pixel data"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let error: AppError = io.into();
        assert!(matches!(error, AppError::Io(_)));
        assert_eq!(error.to_string(), "IO error: missing.png");
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<Vec<u8>>("{ not: a list }").unwrap_err();
        let error: AppError = yaml_error.into();
        assert!(matches!(error, AppError::Config(_)));
    }
}
