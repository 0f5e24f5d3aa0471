//! TLS setup for the control channel.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::{MumbleError, Result};

#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Accept any server certificate. Most Mumble servers are self-signed.
    pub insecure: bool,
    /// PEM client certificate (chain). Registers the bot's identity.
    pub certificate_file: Option<PathBuf>,
    /// PEM private key. Falls back to `certificate_file` when unset.
    pub key_file: Option<PathBuf>,
}

pub fn client_config(options: &TlsOptions) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder =
        ClientConfig::builder_with_provider(provider.clone()).with_safe_default_protocol_versions()?;

    let builder = if options.insecure {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots)
    };

    let config = match &options.certificate_file {
        Some(cert_path) => {
            let key_path = options.key_file.as_deref().unwrap_or(cert_path);
            let (chain, key) = load_identity(cert_path, key_path)?;
            builder.with_client_auth_cert(chain, key)?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(config)
}

/// Load a certificate chain and private key from PEM files.
///
/// The two paths may be the same file.
pub fn load_identity(
    cert_path: &Path,
    key_path: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_error = |path: &Path, reason: String| MumbleError::Certificate {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = BufReader::new(
        File::open(cert_path).map_err(|e| cert_error(cert_path, e.to_string()))?,
    );
    let chain = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| cert_error(cert_path, e.to_string()))?;
    if chain.is_empty() {
        return Err(cert_error(cert_path, "no certificates found".to_string()));
    }

    let mut reader =
        BufReader::new(File::open(key_path).map_err(|e| cert_error(key_path, e.to_string()))?);
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|e| cert_error(key_path, e.to_string()))?
        .ok_or_else(|| cert_error(key_path, "no private key found".to_string()))?;

    Ok((chain, key))
}

/// Verifier for `insecure` mode: the chain is not checked, but handshake
/// signatures still are.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
