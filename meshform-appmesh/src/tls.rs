//! Listener TLS
//!
//! A certificate is supplied either as an ACM certificate or as a pair of
//! file paths on the Envoy proxy. An ACM certificate may be given as a bare
//! ARN or as a certificate reference object; both normalize to the ARN before
//! anything is rendered, and the virtual node and virtual gateway shapes are
//! both produced from that one normalized value.

use meshform_core::schema::TypeError;
use meshform_core::scope::Arn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// TLS mode of a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TlsMode {
    /// Only TLS traffic is accepted
    Strict,
    /// TLS and plaintext traffic are accepted
    Permissive,
    /// Only plaintext traffic is accepted
    Disabled,
}

/// An ACM certificate as a reference object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificateReference {
    pub certificate_arn: String,
    #[serde(default)]
    pub domain_name: Option<String>,
}

/// An ACM certificate, either as a bare ARN or as a reference object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AcmCertificate {
    Arn(String),
    Reference(CertificateReference),
}

impl AcmCertificate {
    /// The certificate ARN, whichever form it was given in
    pub fn arn(&self) -> &str {
        match self {
            AcmCertificate::Arn(arn) => arn,
            AcmCertificate::Reference(reference) => &reference.certificate_arn,
        }
    }
}

impl From<&str> for AcmCertificate {
    fn from(arn: &str) -> Self {
        AcmCertificate::Arn(arn.to_string())
    }
}

impl From<String> for AcmCertificate {
    fn from(arn: String) -> Self {
        AcmCertificate::Arn(arn)
    }
}

impl From<CertificateReference> for AcmCertificate {
    fn from(reference: CertificateReference) -> Self {
        AcmCertificate::Reference(reference)
    }
}

/// Source of a listener's certificate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "lowercase",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum TlsCertificate {
    Acm {
        certificate: AcmCertificate,
    },
    File {
        certificate_chain: String,
        private_key: String,
    },
}

impl TlsCertificate {
    pub fn acm(certificate: impl Into<AcmCertificate>) -> Self {
        TlsCertificate::Acm {
            certificate: certificate.into(),
        }
    }

    pub fn file(certificate_chain: impl Into<String>, private_key: impl Into<String>) -> Self {
        TlsCertificate::File {
            certificate_chain: certificate_chain.into(),
            private_key: private_key.into(),
        }
    }

    /// Render the certificate for both listener families
    pub fn bind(&self) -> Result<BoundTlsCertificate, ConfigurationError> {
        let source = self.normalize()?;
        Ok(BoundTlsCertificate {
            node_shape: source.node_shape(),
            gateway_shape: source.gateway_shape(),
        })
    }

    fn normalize(&self) -> Result<CertificateSource, ConfigurationError> {
        match self {
            TlsCertificate::Acm { certificate } => {
                let certificate_arn = certificate.arn();
                if certificate_arn.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "certificateArn",
                    });
                }
                match Arn::parse(certificate_arn) {
                    Ok(arn) if arn.service != "acm" => log::warn!(
                        "certificate {} is not an ACM certificate (service '{}')",
                        certificate_arn,
                        arn.service
                    ),
                    Ok(_) => {}
                    Err(e) => {
                        return Err(ConfigurationError::Invalid {
                            subject: "ACM certificate".to_string(),
                            errors: vec![TypeError::ValidationFailed {
                                message: e.to_string(),
                            }],
                        });
                    }
                }
                Ok(CertificateSource::Acm(AcmCertificateProperty {
                    certificate_arn: certificate_arn.to_string(),
                }))
            }
            TlsCertificate::File {
                certificate_chain,
                private_key,
            } => {
                if certificate_chain.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "certificateChain",
                    });
                }
                if private_key.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "privateKey",
                    });
                }
                Ok(CertificateSource::File(FileCertificateProperty {
                    certificate_chain: certificate_chain.clone(),
                    private_key: private_key.clone(),
                }))
            }
        }
    }
}

/// Certificate normalized to its rendered form, independent of listener family
enum CertificateSource {
    Acm(AcmCertificateProperty),
    File(FileCertificateProperty),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcmCertificateProperty {
    pub certificate_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCertificateProperty {
    pub certificate_chain: String,
    pub private_key: String,
}

/// Virtual node listener certificate (`ListenerTlsCertificate`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerTlsCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acm: Option<AcmCertificateProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileCertificateProperty>,
}

/// Virtual gateway listener certificate (`VirtualGatewayListenerTlsCertificate`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualGatewayListenerTlsCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acm: Option<AcmCertificateProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileCertificateProperty>,
}

impl CertificateSource {
    fn parts(&self) -> (Option<AcmCertificateProperty>, Option<FileCertificateProperty>) {
        match self {
            CertificateSource::Acm(acm) => (Some(acm.clone()), None),
            CertificateSource::File(file) => (None, Some(file.clone())),
        }
    }

    fn node_shape(&self) -> ListenerTlsCertificate {
        let (acm, file) = self.parts();
        ListenerTlsCertificate { acm, file }
    }

    fn gateway_shape(&self) -> VirtualGatewayListenerTlsCertificate {
        let (acm, file) = self.parts();
        VirtualGatewayListenerTlsCertificate { acm, file }
    }
}

/// Both renderings of one certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTlsCertificate {
    pub node_shape: ListenerTlsCertificate,
    pub gateway_shape: VirtualGatewayListenerTlsCertificate,
}

/// Where a listener finds the certificate authority used to validate peers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "lowercase",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum TlsValidationTrust {
    File { certificate_chain: String },
    Sds { secret_name: String },
}

/// Mutual TLS validation context
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TlsValidation {
    pub trust: TlsValidationTrust,
    #[serde(default)]
    pub subject_alternative_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContextProperty {
    pub trust: ValidationTrustProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_alternative_names: Option<SubjectAlternativeNamesProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationTrustProperty {
    File {
        #[serde(rename = "certificateChain")]
        certificate_chain: String,
    },
    Sds {
        #[serde(rename = "secretName")]
        secret_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAlternativeNamesProperty {
    #[serde(rename = "match")]
    pub matchers: SubjectAlternativeNameMatchers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAlternativeNameMatchers {
    pub exact: Vec<String>,
}

impl TlsValidation {
    pub fn bind(&self) -> Result<ValidationContextProperty, ConfigurationError> {
        let trust = match &self.trust {
            TlsValidationTrust::File { certificate_chain } if certificate_chain.is_empty() => {
                return Err(ConfigurationError::Empty {
                    field: "certificateChain",
                });
            }
            TlsValidationTrust::Sds { secret_name } if secret_name.is_empty() => {
                return Err(ConfigurationError::Empty {
                    field: "secretName",
                });
            }
            TlsValidationTrust::File { certificate_chain } => ValidationTrustProperty::File {
                certificate_chain: certificate_chain.clone(),
            },
            TlsValidationTrust::Sds { secret_name } => ValidationTrustProperty::Sds {
                secret_name: secret_name.clone(),
            },
        };
        let subject_alternative_names = (!self.subject_alternative_names.is_empty()).then(|| {
            SubjectAlternativeNamesProperty {
                matchers: SubjectAlternativeNameMatchers {
                    exact: self.subject_alternative_names.clone(),
                },
            }
        });
        Ok(ValidationContextProperty {
            trust,
            subject_alternative_names,
        })
    }
}

/// TLS settings of a listener
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListenerTls {
    pub certificate: TlsCertificate,
    pub mode: TlsMode,
    #[serde(default)]
    pub validation: Option<TlsValidation>,
}

/// Rendered listener TLS block, generic over the family's certificate shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerTlsProperty<C> {
    pub certificate: C,
    pub mode: TlsMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationContextProperty>,
}

/// Both renderings of one listener TLS block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundListenerTls {
    pub node: ListenerTlsProperty<ListenerTlsCertificate>,
    pub gateway: ListenerTlsProperty<VirtualGatewayListenerTlsCertificate>,
}

impl ListenerTls {
    pub fn new(certificate: TlsCertificate, mode: TlsMode) -> Self {
        Self {
            certificate,
            mode,
            validation: None,
        }
    }

    pub fn with_validation(mut self, validation: TlsValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn bind(&self) -> Result<BoundListenerTls, ConfigurationError> {
        let certificate = self.certificate.bind()?;
        let validation = self.validation.as_ref().map(TlsValidation::bind).transpose()?;
        log::debug!("bound {:?} listener TLS", self.mode);
        Ok(BoundListenerTls {
            node: ListenerTlsProperty {
                certificate: certificate.node_shape,
                mode: self.mode,
                validation: validation.clone(),
            },
            gateway: ListenerTlsProperty {
                certificate: certificate.gateway_shape,
                mode: self.mode,
                validation,
            },
        })
    }
}
