//! Transport agents: client certificates and proxy tunnels.
//!
//! A connection has exactly one [`TransportAgent`] at a time. Each of the
//! constructors produces a complete replacement, so configuring a proxy after
//! a client certificate replaces the certificate agent (the certificate is
//! carried into the proxy agent when the credentials still expose one).

use bytes::Bytes;

use crate::config::{ClientConfig, ProxyConfig};
use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

/// Client certificate (PKCS#12 or PEM) and its passphrase.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCert {
    data: Bytes,
    passphrase: String,
}

impl std::fmt::Debug for ClientCert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCert")
            .field("data_len", &self.data.len())
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl ClientCert {
    /// Wrap raw certificate bytes.
    pub fn new(data: impl Into<Bytes>, passphrase: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Certificate material from the credentials, if they carry any.
    pub fn from_credentials(credentials: &dyn Credentials) -> Option<Self> {
        credentials
            .client_cert_data()
            .filter(|data| !data.is_empty())
            .map(|data| Self::new(Bytes::copy_from_slice(data), credentials.cert_password()))
    }

    /// Raw certificate bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Passphrase protecting the certificate.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Returns true for PEM material (certificate chain plus private key).
    ///
    /// Anything else is treated as a DER-encoded PKCS#12 archive.
    pub fn is_pem(&self) -> bool {
        self.data.trim_ascii_start().starts_with(b"-----BEGIN")
    }

    /// Build the TLS identity, failing on malformed data or a wrong passphrase.
    pub fn identity(&self) -> Result<reqwest::Identity> {
        if self.is_pem() {
            return reqwest::Identity::from_pem(&self.data).map_err(tls_error);
        }
        pkcs12_identity(&self.data, &self.passphrase)
    }
}

fn tls_error(err: reqwest::Error) -> Error {
    Error::with_source(ErrorKind::Tls(err.to_string()), err)
}

fn config_error(err: reqwest::Error) -> Error {
    Error::with_source(ErrorKind::Config(err.to_string()), err)
}

#[cfg(feature = "native-tls")]
fn pkcs12_identity(der: &[u8], passphrase: &str) -> Result<reqwest::Identity> {
    reqwest::Identity::from_pkcs12_der(der, passphrase).map_err(tls_error)
}

#[cfg(not(feature = "native-tls"))]
fn pkcs12_identity(_der: &[u8], _passphrase: &str) -> Result<reqwest::Identity> {
    Err(Error::new(ErrorKind::Tls(
        "PKCS#12 client certificates require the `native-tls` feature".to_string(),
    )))
}

/// A proxy tunnel, optionally presenting a client certificate to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAgent {
    /// Proxy host.
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// `user:password` credential for the proxy.
    pub proxy_auth: Option<String>,
    /// Client certificate presented through the tunnel.
    pub cert: Option<ClientCert>,
}

impl ProxyAgent {
    fn new(proxy: &ProxyConfig, credentials: &dyn Credentials) -> Self {
        Self {
            host: proxy.host.clone(),
            port: proxy.port,
            proxy_auth: proxy.proxy_auth(),
            cert: ClientCert::from_credentials(credentials),
        }
    }
}

/// The active transport agent of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransportAgent {
    /// Direct connection with default TLS settings.
    #[default]
    None,
    /// Direct connection presenting a client certificate.
    ClientCert(ClientCert),
    /// Tunnel through a proxy reached over plain HTTP.
    ProxyPlain(ProxyAgent),
    /// Tunnel through a proxy reached over HTTPS.
    ProxySecure(ProxyAgent),
}

impl TransportAgent {
    /// Client-certificate agent, or `None` if the credentials carry no certificate.
    pub fn client_cert(credentials: &dyn Credentials) -> Option<Self> {
        ClientCert::from_credentials(credentials).map(Self::ClientCert)
    }

    /// Agent tunnelling through an HTTP proxy.
    pub fn plain_proxy(proxy: &ProxyConfig, credentials: &dyn Credentials) -> Self {
        Self::ProxyPlain(ProxyAgent::new(proxy, credentials))
    }

    /// Agent tunnelling through an HTTPS proxy.
    pub fn secure_proxy(proxy: &ProxyConfig, credentials: &dyn Credentials) -> Self {
        Self::ProxySecure(ProxyAgent::new(proxy, credentials))
    }

    /// Returns true unless this is [`TransportAgent::None`].
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Certificate presented by this agent, if any.
    pub fn cert(&self) -> Option<&ClientCert> {
        match self {
            Self::None => None,
            Self::ClientCert(cert) => Some(cert),
            Self::ProxyPlain(proxy) | Self::ProxySecure(proxy) => proxy.cert.as_ref(),
        }
    }

    /// URL of the proxy, if this agent tunnels through one.
    pub fn proxy_url(&self) -> Option<String> {
        match self {
            Self::ProxyPlain(p) => Some(format!("http://{}:{}", p.host, p.port)),
            Self::ProxySecure(p) => Some(format!("https://{}:{}", p.host, p.port)),
            _ => None,
        }
    }

    /// Build the HTTP client for this agent.
    ///
    /// This is where certificate and proxy material is validated before any
    /// request is sent. A malformed certificate or wrong passphrase yields
    /// [`ErrorKind::Tls`]; an unusable proxy address yields [`ErrorKind::Config`].
    pub fn build_client(&self, config: &ClientConfig) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        match (self.proxy_url(), self) {
            (Some(url), Self::ProxyPlain(agent) | Self::ProxySecure(agent)) => {
                let mut proxy = reqwest::Proxy::all(url.as_str()).map_err(config_error)?;
                let auth = agent.proxy_auth.as_deref().and_then(|a| a.split_once(':'));
                if let Some((user, pass)) = auth {
                    proxy = proxy.basic_auth(user, pass);
                }
                builder = builder.proxy(proxy);
            }
            // direct agents ignore HTTP(S)_PROXY from the environment
            _ => builder = builder.no_proxy(),
        }

        if let Some(cert) = self.cert() {
            builder = with_identity(builder, cert)?;
        }

        builder.build().map_err(|e| {
            if self.cert().is_some() {
                tls_error(e)
            } else {
                config_error(e)
            }
        })
    }
}

fn with_identity(
    builder: reqwest::ClientBuilder,
    cert: &ClientCert,
) -> Result<reqwest::ClientBuilder> {
    let identity = cert.identity()?;
    Ok(tls_backend_for(builder, cert).identity(identity))
}

// PEM identities belong to rustls, PKCS#12 identities to native-tls.
#[cfg(feature = "native-tls")]
#[allow(deprecated)]
fn tls_backend_for(builder: reqwest::ClientBuilder, cert: &ClientCert) -> reqwest::ClientBuilder {
    if cert.is_pem() {
        builder.use_rustls_tls()
    } else {
        builder.use_native_tls()
    }
}

#[cfg(not(feature = "native-tls"))]
fn tls_backend_for(builder: reqwest::ClientBuilder, _cert: &ClientCert) -> reqwest::ClientBuilder {
    builder
}
