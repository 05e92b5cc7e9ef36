use crate::util::Hex;

/// Errors surfaced by [RadixTree](crate::RadixTree) operations.
///
/// Absence of a key is never an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key passed to a mutating operation is not a string
    #[error("invalid key type: {key} is not a utf8 string")]
    InvalidKeyType {
        key: Hex,
        #[source]
        source: std::str::Utf8Error,
    },
    /// The requested prefix does not extend the prefix of the view it was requested from
    #[error("mismatched prefix: {requested:?} does not start with {prefix:?}")]
    PrefixMismatch { requested: String, prefix: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_key(key: &[u8], source: std::str::Utf8Error) -> Self {
        Self::InvalidKeyType {
            key: Hex::partial(key, 32),
            source,
        }
    }
}
