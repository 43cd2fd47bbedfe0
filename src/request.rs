use bon::Builder;

use crate::csr::CertificateRequest;
use crate::csr::params::SubjectAttributes;
use crate::error::RequestError;
use crate::key::{KeyMaterial, KeySource};

/// Parameters for building a [`Request`].
///
/// # Fields
/// * `domain` - Fully qualified domain name, used as the common name.
/// * `country` - Two letter country code.
/// * `state` - State or area.
/// * `locality` - City.
/// * `organization` - Organization name.
/// * `san_list` - Additional fully qualified domain names.
/// * `key_source` - Generate a key (2048 bits by default) or load an existing one.
#[derive(Clone, Debug, Builder)]
pub struct RequestParams {
    pub domain: String,
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    #[builder(default)]
    pub san_list: Vec<String>,
    #[builder(default)]
    pub key_source: KeySource,
}

impl RequestParams {
    pub fn subject(&self) -> SubjectAttributes {
        SubjectAttributes {
            country: self.country.clone(),
            state: self.state.clone(),
            locality: self.locality.clone(),
            organization: self.organization.clone(),
            common_name: self.domain.clone(),
            san_list: self.san_list.clone(),
        }
    }
}

/// A private key together with the certificate signing request it signed.
#[derive(Debug)]
pub struct Request {
    domain: String,
    key: KeyMaterial,
    csr: CertificateRequest,
}

impl Request {
    /// Obtains the key, then builds and signs the CSR with it.
    ///
    /// Fails without exposing a key or CSR if either stage fails.
    pub fn new(params: RequestParams) -> Result<Self, RequestError> {
        let subject = params.subject();
        let key = KeyMaterial::create(params.key_source)?;
        let csr = CertificateRequest::create(&subject, &key)?;

        Ok(Self {
            domain: params.domain,
            key,
            csr,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn csr(&self) -> &CertificateRequest {
        &self.csr
    }

    pub fn into_parts(self) -> (KeyMaterial, CertificateRequest) {
        (self.key, self.csr)
    }
}
