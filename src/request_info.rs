use const_oid::AssociatedOid;
use der::Encode;
use der::asn1::{Any, OctetString, SetOfVec};
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use x509_cert::attr::{Attribute, Attributes};
use x509_cert::ext::Extension;
use x509_cert::request::{CertReqInfo, ExtensionReq, Version};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::csr::extensions::{SubjectAltName, ToAndFromX509Extension};
use crate::csr::params::{ExtensionParam, SubjectAttributes};
use crate::error::CsrError;

/// The to-be-signed portion of a PKCS#10 certificate signing request.
///
/// # Fields
/// * `subject` - The subject of the request. Its `san_list` is carried in `extensions`.
/// * `subject_public_key` - The public key the request is made for.
/// * `extensions` - X.509 extensions requested through the PKCS#9 extensionRequest attribute.
#[derive(Clone, Debug)]
pub struct RequestInfo {
    pub subject: SubjectAttributes,
    pub subject_public_key: RsaPublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl RequestInfo {
    /// Creates the request info, adding a non-critical Subject Alternative Name
    /// extension when the subject has SANs.
    pub fn new(
        subject: SubjectAttributes,
        subject_public_key: RsaPublicKey,
    ) -> Result<Self, CsrError> {
        let mut extensions = Vec::new();
        if !subject.san_list.is_empty() {
            let san = SubjectAltName {
                names: subject.san_list.clone(),
            };
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }

        Ok(Self {
            subject,
            subject_public_key,
            extensions,
        })
    }

    /// Converts the `RequestInfo` into a `CertReqInfo` for DER encoding.
    pub fn to_cert_req_info_inner(&self) -> Result<CertReqInfo, CsrError> {
        let public_key = SubjectPublicKeyInfoOwned::from_key(self.subject_public_key.clone())
            .map_err(|e| CsrError::Encoding(e.to_string()))?;

        // No extensions means no attributes at all
        let attributes = if self.extensions.is_empty() {
            Attributes::new()
        } else {
            let extensions = self
                .extensions
                .iter()
                .map(|ext| -> der::Result<Extension> {
                    Ok(Extension {
                        extn_id: ext.oid,
                        critical: ext.critical,
                        extn_value: OctetString::new(ext.value.clone())?,
                    })
                })
                .collect::<der::Result<Vec<_>>>()?;

            let extension_request = Attribute {
                oid: ExtensionReq::OID,
                values: SetOfVec::try_from(vec![Any::encode_from(&extensions)?])?,
            };
            SetOfVec::try_from(vec![extension_request])?
        };

        Ok(CertReqInfo {
            version: Version::V1,
            subject: self.subject.as_x509_name()?,
            public_key,
            attributes,
        })
    }

    /// Creates a `RequestInfo` from a decoded `CertReqInfo`.
    ///
    /// The Subject Alternative Name extension, if any, is copied back into
    /// `subject.san_list`.
    pub fn from_cert_req_info_inner(inner: &CertReqInfo) -> Result<Self, CsrError> {
        let mut subject = SubjectAttributes::from_x509_name(&inner.subject)?;

        let spki_der = inner.public_key.to_der()?;
        let subject_public_key = RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| CsrError::Decoding(e.to_string()))?;

        let mut extensions = Vec::new();
        for attribute in inner.attributes.iter() {
            if attribute.oid != ExtensionReq::OID {
                continue;
            }
            for value in attribute.values.iter() {
                let requested: Vec<Extension> = value
                    .decode_as()
                    .map_err(|e| CsrError::Decoding(e.to_string()))?;
                extensions.extend(requested.into_iter().map(|ext| ExtensionParam {
                    oid: ext.extn_id,
                    critical: ext.critical,
                    value: ext.extn_value.as_bytes().to_vec(),
                }));
            }
        }

        if let Some(san) = extensions.iter().find(|ext| ext.oid == SubjectAltName::OID) {
            subject.san_list = san.to_extension::<SubjectAltName>()?.names;
        }

        Ok(Self {
            subject,
            subject_public_key,
            extensions,
        })
    }

    /// Encodes the `RequestInfo` into DER format, the bytes that get signed.
    pub fn to_der(&self) -> Result<Vec<u8>, CsrError> {
        Ok(self.to_cert_req_info_inner()?.to_der()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyMaterial;

    const RSA_PKCS1: &[u8] = include_bytes!("../tests/data/rsa2048.pem");

    fn subject(san_list: Vec<String>) -> SubjectAttributes {
        SubjectAttributes::builder()
            .country("GB".to_string())
            .state("England".to_string())
            .locality("Bristol".to_string())
            .organization("My Organisation Name".to_string())
            .common_name("example.com".to_string())
            .san_list(san_list)
            .build()
    }

    #[test]
    fn test_no_sans_means_no_attributes() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let info = RequestInfo::new(subject(vec![]), key.public_key().clone()).unwrap();
        assert!(info.extensions.is_empty());

        let inner = info.to_cert_req_info_inner().unwrap();
        assert_eq!(inner.version, Version::V1);
        assert!(inner.attributes.is_empty());
    }

    #[test]
    fn test_sans_round_trip_through_extension_request() {
        let key = KeyMaterial::from_pem(RSA_PKCS1, None).unwrap();
        let sans = vec!["example2.com".to_string(), "example3.com".to_string()];
        let info = RequestInfo::new(subject(sans.clone()), key.public_key().clone()).unwrap();

        let inner = info.to_cert_req_info_inner().unwrap();
        assert_eq!(inner.attributes.len(), 1);

        let decoded = RequestInfo::from_cert_req_info_inner(&inner).unwrap();
        assert_eq!(decoded.subject.san_list, sans);
        assert_eq!(decoded.extensions.len(), 1);
        assert!(!decoded.extensions[0].critical);
        assert_eq!(&decoded.subject_public_key, key.public_key());
    }
}
