use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::asn1::{Any, PrintableStringRef, SetOfVec, Utf8StringRef};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::CsrError;

/// Upper bound on the common name length (`ub-common-name` in RFC 5280).
pub const MAX_COMMON_NAME_LEN: usize = 64;

/// Subject of a certificate signing request.
///
/// # Fields
/// * `country` - Two letter country code (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `common_name` - The fully qualified domain name (CN).
/// * `san_list` - Additional DNS names, emitted as a Subject Alternative Name extension.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    pub common_name: String,
    #[builder(default)]
    pub san_list: Vec<String>,
}

impl SubjectAttributes {
    /// Checks the attributes can be encoded into a distinguished name.
    pub fn validate(&self) -> Result<(), CsrError> {
        for (field, value) in [
            ("country", &self.country),
            ("state", &self.state),
            ("locality", &self.locality),
            ("organization", &self.organization),
            ("common name", &self.common_name),
        ] {
            if value.trim().is_empty() {
                return Err(CsrError::InvalidSubject(format!("{field} must not be empty")));
            }
        }

        if self.country.chars().count() != 2 {
            return Err(CsrError::InvalidSubject(format!(
                "country name must be a 2 character country code, got `{}`",
                self.country
            )));
        }

        if self.common_name.chars().count() > MAX_COMMON_NAME_LEN {
            return Err(CsrError::InvalidSubject(format!(
                "common name is longer than {MAX_COMMON_NAME_LEN} characters"
            )));
        }

        Ok(())
    }

    /// Converts the attributes to an X.509 name ordered C, ST, L, O, CN.
    ///
    /// The country is a PrintableString, every other attribute a UTF8String.
    pub fn as_x509_name(&self) -> Result<Name, CsrError> {
        self.validate()?;

        let country = PrintableStringRef::new(&self.country)
            .map_err(|e| CsrError::InvalidSubject(format!("country: {e}")))?;

        let attributes = [
            (rfc4519::C, Any::encode_from(&country)?),
            (rfc4519::ST, utf8_value(&self.state)?),
            (rfc4519::L, utf8_value(&self.locality)?),
            (rfc4519::O, utf8_value(&self.organization)?),
            (rfc4519::CN, utf8_value(&self.common_name)?),
        ];

        let rdns = attributes
            .into_iter()
            .map(|(oid, value)| -> Result<RelativeDistinguishedName, CsrError> {
                let atv = AttributeTypeAndValue { oid, value };
                Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
            })
            .collect::<Result<Vec<_>, CsrError>>()?;

        Ok(RdnSequence(rdns))
    }

    /// Reads the subject attributes back from an X.509 name.
    ///
    /// Attributes absent from the name are left empty. `san_list` is not part
    /// of the name and is always empty.
    pub fn from_x509_name(name: &Name) -> Result<Self, CsrError> {
        let mut subject = SubjectAttributes::default();

        for rdn in name.0.iter() {
            for atv in rdn.0.iter() {
                let slot = match atv.oid {
                    rfc4519::C => &mut subject.country,
                    rfc4519::ST => &mut subject.state,
                    rfc4519::L => &mut subject.locality,
                    rfc4519::O => &mut subject.organization,
                    rfc4519::CN => &mut subject.common_name,
                    _ => continue,
                };
                *slot = std::str::from_utf8(atv.value.value())
                    .map_err(|e| CsrError::Decoding(format!("{}: {e}", atv.oid)))?
                    .to_string();
            }
        }

        Ok(subject)
    }
}

fn utf8_value(value: &str) -> Result<Any, CsrError> {
    Ok(Any::encode_from(&Utf8StringRef::new(value)?)?)
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CsrError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CsrError> {
        E::from_x509_extension_value(&self.value)
    }
}
