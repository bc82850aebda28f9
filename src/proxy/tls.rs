//! TLS client side for `https` targets.
//!
//! Two prebuilt connectors: one validating against the standard web roots,
//! one skipping certificate validation for rules with `secure: false`, which
//! is how self-signed development backends are reached.

use std::io;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::proxy::rules::ProxyRule;

pub struct TlsClient {
    verifying: TlsConnector,
    trusting: TlsConnector,
}

impl TlsClient {
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let verifying = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let trusting = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth();

        Self {
            verifying: TlsConnector::from(Arc::new(verifying)),
            trusting: TlsConnector::from(Arc::new(trusting)),
        }
    }

    /// Wraps an established TCP connection in a client handshake. SNI is the
    /// rule's target host; validation depends on the rule's `secure` flag.
    pub async fn connect(
        &self,
        rule: &ProxyRule,
        tcp: TcpStream,
    ) -> io::Result<TlsStream<TcpStream>> {
        let name = ServerName::try_from(rule.host().to_string())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let connector = if rule.secure {
            &self.verifying
        } else {
            &self.trusting
        };

        connector.connect(name, tcp).await
    }
}

impl Default for TlsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts any server certificate. Only reachable from rules that explicitly
/// set `secure: false`.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
