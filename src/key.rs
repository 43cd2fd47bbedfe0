use std::fmt;
use std::path::Path;

use pkcs8::{EncodePrivateKey, EncryptedPrivateKeyInfo, PrivateKeyInfo, pkcs5};
use rand_core::{OsRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::KeyError;
use crate::pem_utils;

pub type Result<T> = std::result::Result<T, KeyError>;

/// Modulus size used when no size is requested.
pub const DEFAULT_KEY_SIZE: usize = 2048;

/// Public exponent of every generated key.
pub const PUBLIC_EXPONENT: u32 = 65537;

/// Smallest modulus size accepted for generation.
pub const MIN_KEY_SIZE: usize = 1024;

/// Largest modulus size accepted for generation.
pub const MAX_KEY_SIZE: usize = 16384;

/// PBKDF2-HMAC-SHA256 rounds used by [`KeyMaterial::export_encrypted_pem`].
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Where the private key of a request comes from.
///
/// The two variants are mutually exclusive: a key is either generated or loaded.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Generate a fresh RSA key with the given modulus size in bits.
    Generate { bits: usize },
    /// Load a PEM-encoded private key, decrypting it with `password` if it is encrypted.
    Load {
        pem: Vec<u8>,
        password: Option<String>,
    },
}

impl KeySource {
    /// Reads a PEM key file into a [`KeySource::Load`].
    pub fn from_file(path: impl AsRef<Path>, password: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .map_err(|e| KeyError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(KeySource::Load { pem, password })
    }
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::Generate {
            bits: DEFAULT_KEY_SIZE,
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Generate { bits } => f.debug_struct("Generate").field("bits", bits).finish(),
            KeySource::Load { pem, password } => f
                .debug_struct("Load")
                .field("pem_len", &pem.len())
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// How a [`KeyMaterial`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Generated,
    /// Loaded from PEM. `encrypted` is set when the PEM was password protected.
    Loaded { encrypted: bool },
}

/// An RSA private key owned by a certificate request.
///
/// There is no `Display` impl; call [`KeyMaterial::export_pem`] to get the PEM text.
#[derive(Clone)]
pub struct KeyMaterial {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    origin: KeyOrigin,
}

impl KeyMaterial {
    /// Builds the key from whichever source was selected.
    pub fn create(source: KeySource) -> Result<Self> {
        match source {
            KeySource::Generate { bits } => Self::generate(bits),
            KeySource::Load { pem, password } => Self::from_pem(&pem, password.as_deref()),
        }
    }

    /// Generate an RSA key pair with the specified number of bits and exponent 65537.
    pub fn generate(bits: usize) -> Result<Self> {
        if !(MIN_KEY_SIZE..=MAX_KEY_SIZE).contains(&bits) {
            return Err(KeyError::UnsupportedKeySize(bits));
        }

        log::debug!("generating {bits}-bit RSA key");
        let mut rng = OsRng;
        let exponent = BigUint::from(PUBLIC_EXPONENT);
        let private = RsaPrivateKey::new_with_exp(&mut rng, bits, &exponent)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;

        Ok(Self::from_private(private, KeyOrigin::Generated))
    }

    /// Decodes a PEM private key.
    ///
    /// Accepts PKCS#1 (`RSA PRIVATE KEY`), PKCS#1 with OpenSSL's `Proc-Type`/`DEK-Info`
    /// encryption (AES-128/192/256-CBC, DES-EDE3-CBC), PKCS#8 (`PRIVATE KEY`) and
    /// PBES2-encrypted PKCS#8 (`ENCRYPTED PRIVATE KEY`). An empty password counts
    /// as no password.
    pub fn from_pem(pem: &[u8], password: Option<&str>) -> Result<Self> {
        let password = password.filter(|p| !p.is_empty());
        let block = pem::parse(pem).map_err(|e| KeyError::InvalidFormat(e.to_string()))?;

        let (private, encrypted) = match block.tag() {
            RSA_PRIVATE_KEY_LABEL if pem_utils::is_encrypted(&block) => {
                let password = password.ok_or(KeyError::PasswordRequired)?;
                let der = pem_utils::decrypt(&block, password)?;
                // A wrong password occasionally survives the padding check and
                // only shows up as garbage DER.
                let private =
                    RsaPrivateKey::from_pkcs1_der(&der).map_err(|_| KeyError::WrongPassword)?;
                (private, true)
            }
            RSA_PRIVATE_KEY_LABEL => {
                reject_password(password)?;
                let private = RsaPrivateKey::from_pkcs1_der(block.contents())
                    .map_err(|e| KeyError::InvalidFormat(e.to_string()))?;
                (private, false)
            }
            PRIVATE_KEY_LABEL => {
                reject_password(password)?;
                let private = rsa_from_pkcs8(block.contents(), KeyError::InvalidFormat)?;
                (private, false)
            }
            ENCRYPTED_PRIVATE_KEY_LABEL => {
                let password = password.ok_or(KeyError::PasswordRequired)?;
                let info = EncryptedPrivateKeyInfo::try_from(block.contents())
                    .map_err(encrypted_pkcs8_error)?;
                let document = info.decrypt(password).map_err(|e| match e {
                    pkcs8::Error::EncryptedPrivateKey(pkcs5::Error::DecryptFailed)
                    | pkcs8::Error::Asn1(_) => KeyError::WrongPassword,
                    other => encrypted_pkcs8_error(other),
                })?;
                let private = rsa_from_pkcs8(document.as_bytes(), |_| KeyError::WrongPassword)?;
                (private, true)
            }
            other if other.ends_with("PRIVATE KEY") => {
                return Err(KeyError::UnsupportedKeyType(other.to_string()));
            }
            other => {
                return Err(KeyError::InvalidFormat(format!(
                    "unexpected PEM label `{other}`"
                )));
            }
        };

        private
            .validate()
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))?;

        log::debug!(
            "loaded {}-bit RSA key from `{}` PEM block",
            private.n().bits(),
            block.tag()
        );
        Ok(Self::from_private(private, KeyOrigin::Loaded { encrypted }))
    }

    /// Reads and decodes a PEM key file.
    pub fn from_file(path: impl AsRef<Path>, password: Option<String>) -> Result<Self> {
        Self::create(KeySource::from_file(path, password)?)
    }

    fn from_private(private: RsaPrivateKey, origin: KeyOrigin) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyMaterial {
            private,
            public,
            origin,
        }
    }

    /// Exports the key as unencrypted PKCS#1 PEM (`BEGIN RSA PRIVATE KEY`).
    ///
    /// Keys loaded from an encrypted PEM are exported without their password
    /// protection. Use [`KeyMaterial::export_encrypted_pem`] to keep it.
    pub fn export_pem(&self) -> Result<Zeroizing<Vec<u8>>> {
        if self.origin == (KeyOrigin::Loaded { encrypted: true }) {
            log::warn!("exporting a key that was loaded encrypted as unencrypted PEM");
        }

        let pem = self
            .private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(Zeroizing::new(pem.as_bytes().to_vec()))
    }

    /// Exports the key as encrypted PKCS#8 PEM (PBES2 with PBKDF2-HMAC-SHA256 and AES-256-CBC).
    pub fn export_encrypted_pem(&self, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        if password.is_empty() {
            return Err(KeyError::Encoding("password must not be empty".to_string()));
        }

        let mut salt = [0u8; 16];
        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let params =
            pkcs8::pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(PBKDF2_ITERATIONS, &salt, &iv)
                .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let document = self
            .private
            .to_pkcs8_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let info = PrivateKeyInfo::try_from(document.as_bytes())
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let encrypted = info
            .encrypt_with_params(params, password)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let pem = encrypted
            .to_pem(ENCRYPTED_PRIVATE_KEY_LABEL, LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(Zeroizing::new(pem.as_bytes().to_vec()))
    }

    /// Modulus size in bits.
    pub fn key_size(&self) -> usize {
        self.public.n().bits()
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    /// PKCS#1 v1.5 signer over SHA-256.
    pub(crate) fn signing_key(&self) -> RsaSigningKey<Sha256> {
        RsaSigningKey::<Sha256>::new(self.private.clone())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_size", &self.key_size())
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn reject_password(password: Option<&str>) -> Result<()> {
    match password {
        Some(_) => Err(KeyError::UnexpectedPassword),
        None => Ok(()),
    }
}

fn encrypted_pkcs8_error(err: pkcs8::Error) -> KeyError {
    match err {
        pkcs8::Error::Asn1(e) if matches!(e.kind(), der::ErrorKind::OidUnknown { .. }) => {
            KeyError::UnsupportedEncryption(e.to_string())
        }
        pkcs8::Error::EncryptedPrivateKey(e) => KeyError::UnsupportedEncryption(e.to_string()),
        other => KeyError::InvalidFormat(other.to_string()),
    }
}

fn rsa_from_pkcs8(der: &[u8], malformed: impl Fn(String) -> KeyError) -> Result<RsaPrivateKey> {
    let info = PrivateKeyInfo::try_from(der).map_err(|e| malformed(e.to_string()))?;
    if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(KeyError::UnsupportedKeyType(info.algorithm.oid.to_string()));
    }
    RsaPrivateKey::try_from(info).map_err(|e| malformed(e.to_string()))
}
