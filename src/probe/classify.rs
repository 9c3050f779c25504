//! Outcome classification for probe errors.
//!
//! Maps a failed request into one of the probe status categories. The
//! timeout check runs first: a deadline expiry is reported as `timeout` even
//! when its description also mentions a certificate.

use crate::probe::types::ProbeStatus;
use std::error::Error as StdError;

/// Substrings marking a transport-security failure. Matched case-sensitively.
const TLS_TOKENS: &[&str] = &["tls", "TLS", "SSL", "x509", "certificate"];

/// Classify the outcome of a request attempt.
///
/// `None` means the request went through.
#[must_use]
pub fn classify(error: Option<&(dyn StdError + 'static)>) -> ProbeStatus {
    error.map_or(ProbeStatus::Success, classify_error)
}

/// Classify a failed request attempt.
#[must_use]
pub fn classify_error(error: &(dyn StdError + 'static)) -> ProbeStatus {
    if is_timeout(error) {
        ProbeStatus::Timeout
    } else if is_tls_error(error) {
        ProbeStatus::TlsError
    } else {
        ProbeStatus::Error
    }
}

/// Check whether any error in the source chain is a timeout.
#[must_use]
pub fn is_timeout(error: &(dyn StdError + 'static)) -> bool {
    chain(error).any(|err| {
        if let Some(e) = err.downcast_ref::<reqwest::Error>() {
            return e.is_timeout();
        }
        if err.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        err.downcast_ref::<std::io::Error>()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::TimedOut)
    })
}

/// Check whether the error description looks like a TLS/x509 problem.
#[must_use]
pub fn is_tls_error(error: &(dyn StdError + 'static)) -> bool {
    let text = describe(error);
    TLS_TOKENS.iter().any(|token| text.contains(token))
}

/// Full description of an error, including every source, joined by ": ".
#[must_use]
pub fn describe(error: &(dyn StdError + 'static)) -> String {
    chain(error)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

fn chain<'a>(
    error: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&err| err.source())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::io;

    /// Error wrapper whose own message hides the cause.
    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error sending request")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_no_error_is_success() {
        assert_eq!(classify(None), ProbeStatus::Success);
    }

    #[test]
    fn test_timeout_wins_over_certificate_text() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "certificate check timed out");
        assert_eq!(classify_error(&err), ProbeStatus::Timeout);
    }

    #[tokio::test]
    async fn test_elapsed_is_timeout() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            futures::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        assert_eq!(classify_error(&elapsed), ProbeStatus::Timeout);
    }

    #[test]
    fn test_x509_is_tls_error() {
        let err = io::Error::new(io::ErrorKind::Other, "x509: certificate signed by unknown authority");
        assert_eq!(classify_error(&err), ProbeStatus::TlsError);
    }

    #[test]
    fn test_tls_tokens() {
        for msg in [
            "remote error: tls: handshake failure",
            "TLS handshake eof",
            "SSL routines: wrong version number",
            "invalid peer certificate: UnknownIssuer",
        ] {
            let err = io::Error::new(io::ErrorKind::Other, msg);
            assert_eq!(classify_error(&err), ProbeStatus::TlsError, "{msg}");
        }
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        let err = io::Error::new(io::ErrorKind::Other, "Certificate pinned");
        assert_eq!(classify_error(&err), ProbeStatus::Error);
    }

    #[test]
    fn test_source_chain_is_scanned() {
        let err = Wrapped(io::Error::new(io::ErrorKind::Other, "invalid peer certificate"));
        assert_eq!(classify_error(&err), ProbeStatus::TlsError);
        assert_eq!(describe(&err), "error sending request: invalid peer certificate");

        let err = Wrapped(io::Error::new(io::ErrorKind::TimedOut, "operation timed out"));
        assert_eq!(classify_error(&err), ProbeStatus::Timeout);
    }

    #[test]
    fn test_other_error() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(classify_error(&err), ProbeStatus::Error);
    }
}
