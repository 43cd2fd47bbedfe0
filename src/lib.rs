//! # CsrKit - Certificate Signing Requests in Pure Rust
//!
//! CsrKit builds PKCS#10 certificate signing requests (CSRs) for RSA keys using
//! only rustcrypto libraries. A request is made from a handful of subject
//! attributes, an optional list of Subject Alternative Names and a private key
//! that is either generated on the spot or loaded from PEM.
//!
//! ## Key Sources
//!
//! - **Generate**: a fresh RSA key with public exponent 65537, 2048 bits by default
//! - **Load**: a PEM private key in PKCS#1 (`RSA PRIVATE KEY`), PKCS#8
//!   (`PRIVATE KEY`) or password protected form: OpenSSL's traditional
//!   `Proc-Type: 4,ENCRYPTED` PKCS#1 or PBES2 `ENCRYPTED PRIVATE KEY`
//!
//! ## Quick Start
//!
//! ### Generating a Key and a CSR
//!
//! ```rust,no_run
//! use csrkit::request::{Request, RequestParams};
//!
//! # fn main() -> Result<(), csrkit::error::RequestError> {
//! let request = Request::new(
//!     RequestParams::builder()
//!         .domain("example.com".to_string())
//!         .country("GB".to_string())
//!         .state("England".to_string())
//!         .locality("Bristol".to_string())
//!         .organization("My Organisation Name".to_string())
//!         .san_list(vec!["www.example.com".to_string()])
//!         .build(),
//! )?;
//!
//! std::fs::write("example.com.key", &*request.key().export_pem()?).unwrap();
//! std::fs::write("example.com.csr", request.csr().export_pem()?).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! ### Using an Existing Encrypted Key
//!
//! ```rust,no_run
//! use csrkit::key::KeySource;
//! use csrkit::request::{Request, RequestParams};
//!
//! # fn main() -> Result<(), csrkit::error::RequestError> {
//! let key_source = KeySource::from_file(
//!     "/path/to/private_key",
//!     Some("SuperSecurePassword".to_string()),
//! )?;
//!
//! let request = Request::new(
//!     RequestParams::builder()
//!         .domain("example.com".to_string())
//!         .country("GB".to_string())
//!         .state("England".to_string())
//!         .locality("Bristol".to_string())
//!         .organization("My Organisation Name".to_string())
//!         .key_source(key_source)
//!         .build(),
//! )?;
//!
//! println!("{}", request.csr());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Nothing in this crate terminates the process. Key problems surface as
//! [`error::KeyError`], CSR problems as [`error::CsrError`], and
//! [`request::Request::new`] wraps either in [`error::RequestError`]:
//!
//! ```rust
//! use csrkit::error::{KeyError, RequestError};
//! use csrkit::key::KeySource;
//! use csrkit::request::{Request, RequestParams};
//!
//! let params = RequestParams::builder()
//!     .domain("example.com".to_string())
//!     .country("GB".to_string())
//!     .state("England".to_string())
//!     .locality("Bristol".to_string())
//!     .organization("My Organisation Name".to_string())
//!     .key_source(KeySource::Load { pem: b"not a key".to_vec(), password: None })
//!     .build();
//!
//! match Request::new(params) {
//!     Ok(_) => println!("Request created"),
//!     Err(RequestError::Key(KeyError::WrongPassword)) => println!("Bad password"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, PEM import and export
//! - [`csr`]: Subject attributes, extensions and the signed request
//! - [`request`]: The facade tying a key to its request
//! - [`error`]: Error types
//! - [`request_info`]: Low-level to-be-signed request structure

pub mod csr;
pub mod error;
pub mod key;
mod pem_utils;
pub mod request;
pub mod request_info;
