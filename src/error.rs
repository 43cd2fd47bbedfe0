//! Error types returned by csrkit.
//!
//! ```rust
//! use csrkit::error::KeyError;
//! use csrkit::key::KeyMaterial;
//!
//! match KeyMaterial::from_pem(b"not a key", None) {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(KeyError::InvalidFormat(msg)) => println!("Failed to decode key: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Errors raised while obtaining or exporting an RSA private key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The input is not a PEM-encoded private key, or its body is corrupt.
    #[error("Invalid private key format: {0}")]
    InvalidFormat(String),

    /// The key is encrypted and no password was supplied.
    #[error("Private key is encrypted but no password was given")]
    PasswordRequired,

    /// The key could not be decrypted with the supplied password.
    #[error("Failed to decrypt private key, the password is probably incorrect")]
    WrongPassword,

    /// A password was supplied for a key that is not encrypted.
    #[error("Password was given but the private key is not encrypted")]
    UnexpectedPassword,

    /// The key is encrypted with a scheme this crate cannot decrypt.
    #[error("Unsupported private key encryption: {0}")]
    UnsupportedEncryption(String),

    /// The key is valid but not an RSA key.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The requested modulus size is outside the accepted range.
    #[error("Unsupported RSA key size: {0} bits")]
    UnsupportedKeySize(usize),

    /// The RSA key generation primitive failed.
    #[error("Key generation error: {0}")]
    GenerationFailed(String),

    /// The key could not be serialized.
    #[error("Failed to encode private key: {0}")]
    Encoding(String),

    /// The key file could not be read.
    #[error("Failed to read private key: {0}")]
    Io(String),
}

/// Errors raised while building, signing or decoding a certificate signing request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsrError {
    /// A subject attribute is missing or malformed.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// A Subject Alternative Name entry cannot be encoded as a DNS name.
    #[error("Invalid subject alternative name: {0}")]
    InvalidSubjectAltName(String),

    /// The signing operation rejected the key or parameters.
    #[error("Failed to sign certificate request: {0}")]
    SigningFailed(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    Decoding(String),

    /// The request uses a signature algorithm other than sha256WithRSAEncryption.
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The request signature does not match its public key.
    #[error("Certificate request signature is invalid")]
    InvalidSignature,
}

/// Failure of either stage of [`crate::request::Request::new`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Csr(#[from] CsrError),
}

impl From<der::Error> for CsrError {
    /// Converts a `der::Error` into a `CsrError`.
    fn from(err: der::Error) -> Self {
        CsrError::Encoding(err.to_string())
    }
}
