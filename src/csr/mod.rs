pub mod extensions;
pub mod params;

use std::fmt;

use der::asn1::{Any, AnyRef, BitString};
use der::pem::LineEnding;
use der::{Decode, DecodePem, Encode, EncodePem};
use params::{ExtensionParam, SubjectAttributes};
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;
use x509_cert::request::CertReq;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::CsrError;
use crate::key::KeyMaterial;
use crate::request_info::RequestInfo;

pub type Result<T> = std::result::Result<T, CsrError>;

/// Signature algorithms a request can be signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (RSASSA-PKCS1-v1_5).
    Sha256WithRSA,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            // RFC 4055 requires explicit NULL parameters for RSA PKCS#1 v1.5
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::from(AnyRef::NULL)),
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = CsrError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRSA)
            }
            other => Err(CsrError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A signed PKCS#10 certificate signing request.
///
/// Only ever constructed fully signed: by [`CertificateRequest::create`] or by
/// decoding an existing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    inner: CertReq,
}

impl CertificateRequest {
    /// Builds the request for `subject` and signs it with `key` using SHA-256.
    ///
    /// # Arguments
    /// * `subject` - Distinguished name attributes and optional SANs.
    /// * `key` - The key whose public half is requested and whose private half signs.
    pub fn create(subject: &SubjectAttributes, key: &KeyMaterial) -> Result<Self> {
        let request_info = RequestInfo::new(subject.clone(), key.public_key().clone())?;
        let info = request_info.to_cert_req_info_inner()?;

        let signature = key
            .signing_key()
            .try_sign(&info.to_der()?)
            .map_err(|e| CsrError::SigningFailed(e.to_string()))?;

        let inner = CertReq {
            info,
            algorithm: SignatureAlgorithm::Sha256WithRSA.into(),
            signature: BitString::from_bytes(&signature.to_vec())?,
        };

        log::debug!(
            "signed certificate request for `{}` with {} subject alternative name(s)",
            subject.common_name,
            subject.san_list.len()
        );
        Ok(Self { inner })
    }

    /// Decodes a DER-encoded request.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der).map_err(|e| CsrError::Decoding(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decodes a PEM-encoded request (`BEGIN CERTIFICATE REQUEST`).
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let inner = CertReq::from_pem(pem).map_err(|e| CsrError::Decoding(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encodes the request into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CsrError::Encoding(e.to_string()))
    }

    /// Encodes the request into PEM format with LF line endings.
    pub fn export_pem(&self) -> Result<Vec<u8>> {
        let pem = self
            .inner
            .to_pem(LineEnding::LF)
            .map_err(|e| CsrError::Encoding(e.to_string()))?;
        Ok(pem.into_bytes())
    }

    pub fn inner(&self) -> &CertReq {
        &self.inner
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(&self.inner.algorithm)
    }

    /// The subject, including SANs read back from the extension request.
    pub fn subject(&self) -> Result<SubjectAttributes> {
        Ok(RequestInfo::from_cert_req_info_inner(&self.inner.info)?.subject)
    }

    /// DNS names of the Subject Alternative Name extension, empty when absent.
    pub fn subject_alt_names(&self) -> Result<Vec<String>> {
        Ok(self.subject()?.san_list)
    }

    /// Extensions requested through the extensionRequest attribute.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        Ok(RequestInfo::from_cert_req_info_inner(&self.inner.info)?.extensions)
    }

    pub fn public_key(&self) -> Result<RsaPublicKey> {
        Ok(RequestInfo::from_cert_req_info_inner(&self.inner.info)?.subject_public_key)
    }

    /// Checks the self-signature against the public key embedded in the request.
    pub fn verify(&self) -> Result<()> {
        self.verify_with(&self.public_key()?)
    }

    /// Checks the signature against `public_key`.
    pub fn verify_with(&self, public_key: &RsaPublicKey) -> Result<()> {
        match self.signature_algorithm()? {
            SignatureAlgorithm::Sha256WithRSA => {
                let verifying_key = RsaVerifyingKey::<Sha256>::new(public_key.clone());
                let signature = RsaSignature::try_from(self.inner.signature.raw_bytes())
                    .map_err(|_| CsrError::InvalidSignature)?;
                verifying_key
                    .verify(&self.inner.info.to_der()?, &signature)
                    .map_err(|_| CsrError::InvalidSignature)
            }
        }
    }
}

impl fmt::Display for CertificateRequest {
    /// Writes the PEM encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pem = self.inner.to_pem(LineEnding::LF).map_err(|_| fmt::Error)?;
        f.write_str(&pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyMaterial;

    const RSA_PKCS1: &[u8] = include_bytes!("../../tests/data/rsa2048.pem");
    const OTHER_RSA: &[u8] = include_bytes!("../../tests/data/rsa2048-other.pem");

    fn subject() -> SubjectAttributes {
        SubjectAttributes::builder()
            .country("GB".to_string())
            .state("England".to_string())
            .locality("Bristol".to_string())
            .organization("My Organisation Name".to_string())
            .common_name("example.com".to_string())
            .build()
    }

    #[test]
    fn test_create_signs_and_verifies() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let csr = CertificateRequest::create(&subject(), &key).unwrap();

        csr.verify().unwrap();
        csr.verify_with(key.public_key()).unwrap();
        assert_eq!(&csr.public_key().unwrap(), key.public_key());
        assert_eq!(
            csr.signature_algorithm().unwrap(),
            SignatureAlgorithm::Sha256WithRSA
        );
        assert_eq!(
            csr.inner().algorithm.parameters,
            Some(Any::from(AnyRef::NULL))
        );
    }

    #[test]
    fn test_signature_does_not_verify_with_other_key() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let other = KeyMaterial::from_pem(OTHER_RSA, None).unwrap();
        let csr = CertificateRequest::create(&subject(), &key).unwrap();
        assert_eq!(
            csr.verify_with(other.public_key()).unwrap_err(),
            CsrError::InvalidSignature
        );
    }

    #[test]
    fn test_pem_export_is_deterministic() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let csr = CertificateRequest::create(&subject(), &key).unwrap();

        let pem = csr.export_pem().unwrap();
        assert!(pem.starts_with(b"-----BEGIN CERTIFICATE REQUEST-----\n"));
        assert_eq!(pem, csr.export_pem().unwrap());
        assert_eq!(csr.to_string().as_bytes(), pem.as_slice());

        // PKCS#1 v1.5 signatures are deterministic, so is the whole request
        let again = CertificateRequest::create(&subject(), &key).unwrap();
        assert_eq!(again.export_pem().unwrap(), pem);
    }

    #[test]
    fn test_decode_round_trip() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let mut attrs = subject();
        attrs.san_list = vec!["example2.com".to_string(), "example3.com".to_string()];
        let csr = CertificateRequest::create(&attrs, &key).unwrap();

        let decoded = CertificateRequest::from_pem(csr.export_pem().unwrap()).unwrap();
        assert_eq!(decoded, csr);
        assert_eq!(decoded.subject().unwrap(), attrs);
        assert_eq!(
            CertificateRequest::from_der(&csr.to_der().unwrap()).unwrap(),
            csr
        );
    }

    #[test]
    fn test_tampered_request_fails_verification() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let csr = CertificateRequest::create(&subject(), &key).unwrap();

        let mut inner = csr.inner().clone();
        let mut tampered = subject();
        tampered.common_name = "evil.example.com".to_string();
        inner.info.subject = tampered.as_x509_name().unwrap();
        let forged = CertificateRequest { inner };

        assert_eq!(forged.verify().unwrap_err(), CsrError::InvalidSignature);
    }

    #[test]
    fn test_invalid_subject_alt_name() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let mut attrs = subject();
        attrs.san_list = vec!["ünïcödé.example".to_string()];
        assert!(matches!(
            CertificateRequest::create(&attrs, &key),
            Err(CsrError::InvalidSubjectAltName(_))
        ));
    }

    #[test]
    fn test_garbage_is_a_decoding_error() {
        assert!(matches!(
            CertificateRequest::from_pem(b"-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n"),
            Err(CsrError::Decoding(_))
        ));
        assert!(matches!(
            CertificateRequest::from_der(&[]),
            Err(CsrError::Decoding(_))
        ));
    }
}
