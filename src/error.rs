use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid QIF: {0}")]
    Qif(String),

    #[error("invalid OFX: {0}")]
    Ofx(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),
}

pub type Result<T> = std::result::Result<T, ImportError>;
