//! Transport failure categories and their canonical codes.
//!
//! Every failure that produced no HTTP response is reduced to one
//! [`TransportError`] variant, and every variant maps to exactly one
//! `(response_code, message)` pair stored on the heartbeat.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Why a check produced no HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("DNS resolution failed")]
    DnsNotFound,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Temporary DNS resolution failure")]
    DnsTemporary,

    #[error("Invalid SSL certificate")]
    CertificateNameInvalid,

    #[error("Self-signed certificate")]
    SelfSignedCertificate,

    #[error("TLS certificate expired")]
    CertificateExpired,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Response code stored on the heartbeat for this failure
    pub fn response_code(&self) -> u16 {
        match self {
            TransportError::Timeout => 504,
            TransportError::DnsNotFound => 404,
            TransportError::ConnectionRefused => 503,
            TransportError::DnsTemporary => 503,
            TransportError::CertificateNameInvalid => 502,
            TransportError::SelfSignedCertificate => 525,
            TransportError::CertificateExpired => 526,
            TransportError::Other(_) => 500,
        }
    }

    /// Message stored on the heartbeat for this failure
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classify a failed reqwest call
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }

        let chain = error_chain(err);

        for cause in chain.iter() {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return TransportError::ConnectionRefused,
                    io::ErrorKind::TimedOut => return TransportError::Timeout,
                    _ => {}
                }
            }
        }

        // The outermost message embeds the request URL, so only the causes
        // are matched against. The raw message keeps the full chain.
        let causes = chain[1..].iter().map(|cause| cause.to_string()).collect::<Vec<_>>().join(": ");
        if let Some(classified) = classify_message(&causes) {
            return classified;
        }

        let text = chain.iter().map(|cause| cause.to_string()).collect::<Vec<_>>().join(": ");
        TransportError::Other(text)
    }
}

/// Every error in the source chain, outermost first
fn error_chain<'a>(err: &'a (dyn StdError + 'static)) -> Vec<&'a (dyn StdError + 'static)> {
    let mut chain = vec![err];
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause);
        current = cause.source();
    }
    chain
}

/// Recognise a failure category from its rendered error chain
///
/// Resolver and TLS libraries only expose these categories through their
/// messages, so matching is done on lowercase text. Both the OpenSSL and
/// rustls spellings are covered.
pub fn classify_message(text: &str) -> Option<TransportError> {
    let text = text.to_lowercase();

    if text.contains("timed out") || text.contains("timeout") {
        return Some(TransportError::Timeout);
    }

    if text.contains("connection refused") {
        return Some(TransportError::ConnectionRefused);
    }

    if text.contains("temporary failure in name resolution")
        || (text.contains("try again") && (text.contains("dns error") || text.contains("lookup")))
    {
        return Some(TransportError::DnsTemporary);
    }

    if text.contains("dns error")
        || text.contains("failed to lookup address")
        || text.contains("name or service not known")
        || text.contains("nodename nor servname")
        || text.contains("no such host")
    {
        return Some(TransportError::DnsNotFound);
    }

    if text.contains("certificate has expired")
        || (text.contains("expired") && text.contains("certificate"))
    {
        return Some(TransportError::CertificateExpired);
    }

    if text.contains("self signed") || text.contains("self-signed") || text.contains("unknownissuer") {
        return Some(TransportError::SelfSignedCertificate);
    }

    if text.contains("hostname mismatch")
        || text.contains("notvalidforname")
        || text.contains("not valid for name")
        || text.contains("certificate is not valid for")
    {
        return Some(TransportError::CertificateNameInvalid);
    }

    None
}
