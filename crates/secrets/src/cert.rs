//! Certificate normalization
//!
//! Converts raw DER-encoded certificates into PEM text. Decoding and armoring
//! are split: [`decode_certificate`] validates the DER as X.509 and surfaces a
//! distinct error when it does not parse, while [`to_pem`] is a pure armoring
//! step with no error path.

use pem::{EncodeConfig, LineEnding, Pem};
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::SecretError;

/// PEM block label for public certificates.
const PEM_LABEL: &str = "CERTIFICATE";

/// Metadata extracted from a decoded certificate, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// End of the validity period, human readable
    pub not_after: String,
}

/// Validate DER bytes as a single X.509 certificate.
///
/// `name` is the object name the bytes were fetched under and is only used
/// to label the error.
///
/// # Errors
/// Returns [`SecretError::InvalidCertificate`] if the bytes do not parse as
/// X.509 or carry trailing data after the certificate.
pub fn decode_certificate(name: &str, der: &[u8]) -> Result<CertificateSummary, SecretError> {
    let (rest, certificate) =
        X509Certificate::from_der(der).map_err(|e| SecretError::InvalidCertificate {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    if !rest.is_empty() {
        return Err(SecretError::InvalidCertificate {
            name: name.to_string(),
            message: format!("{} trailing bytes after certificate", rest.len()),
        });
    }

    Ok(CertificateSummary {
        subject: certificate.subject().to_string(),
        issuer: certificate.issuer().to_string(),
        not_after: certificate.validity().not_after.to_string(),
    })
}

/// Wrap raw DER certificate bytes in PEM armor.
///
/// The block label is `CERTIFICATE` and lines end with `\n`. The input is
/// assumed to have been validated already; armoring itself cannot fail.
#[must_use]
pub fn to_pem(der: &[u8]) -> String {
    let block = Pem::new(PEM_LABEL, der.to_vec());
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed_der() -> Vec<u8> {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        certified.cert.der().as_ref().to_vec()
    }

    #[test]
    fn test_decode_valid_certificate() {
        let der = self_signed_der();
        let summary = decode_certificate("tls-cert", &der).unwrap();
        assert!(!summary.not_after.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_certificate("tls-cert", b"not a certificate");
        match result {
            Err(SecretError::InvalidCertificate { name, .. }) => assert_eq!(name, "tls-cert"),
            other => panic!("expected InvalidCertificate, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_truncated_der() {
        let der = self_signed_der();
        let result = decode_certificate("tls-cert", &der[..der.len() - 5]);
        assert!(matches!(
            result,
            Err(SecretError::InvalidCertificate { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let mut der = self_signed_der();
        der.extend_from_slice(&[0x00, 0x01]);
        let result = decode_certificate("tls-cert", &der);
        match result {
            Err(SecretError::InvalidCertificate { message, .. }) => {
                assert!(message.contains("trailing"));
            }
            other => panic!("expected InvalidCertificate, got {other:?}"),
        }
    }

    #[test]
    fn test_pem_armor_round_trips() {
        let der = self_signed_der();
        let armored = to_pem(&der);

        assert!(armored.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(armored.ends_with("-----END CERTIFICATE-----\n"));
        assert!(!armored.contains('\r'));

        let parsed = pem::parse(&armored).unwrap();
        assert_eq!(parsed.tag(), "CERTIFICATE");
        assert_eq!(parsed.contents(), der.as_slice());
    }
}
