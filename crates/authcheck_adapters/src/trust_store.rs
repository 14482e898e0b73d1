//! Exports the CA bundle location to TLS stacks that read it from the
//! environment (OpenSSL and Python `requests`).

use std::path::{Path, PathBuf};

use authcheck_core::config::TlsSettings;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use directories::ProjectDirs;
use tracing::{debug, warn};

pub const SSL_CERT_FILE: &str = "SSL_CERT_FILE";
pub const REQUESTS_CA_BUNDLE: &str = "REQUESTS_CA_BUNDLE";

const BUNDLED_FILE_NAME: &str = "cacert.pem";
const PEM_LINE_WIDTH: usize = 64;

/// Well-known system bundle locations, most common first
const SYSTEM_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/cert.pem",
    "/usr/local/etc/openssl/cert.pem",
    "/opt/homebrew/etc/openssl@3/cert.pem",
];

/// Pick the bundle to export: the configured one if it exists, otherwise the
/// first system bundle found among `candidates`.
pub fn resolve_bundle(configured: Option<&Path>, candidates: &[&str]) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured CA bundle does not exist, falling back to system bundle");
    }

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

/// Directory the compiled-in root certificates are written to
pub fn bundled_dir() -> PathBuf {
    ProjectDirs::from("com", "authcheck", "authcheck")
        .map(|d| d.data_local_dir().join("certs"))
        .unwrap_or_else(|| PathBuf::from("certs"))
}

/// Write the compiled-in Mozilla root set to `dir` as a PEM bundle.
///
/// The file is rewritten on every call so it tracks the linked root set.
pub fn write_bundled_roots(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(BUNDLED_FILE_NAME);
    std::fs::write(&path, bundled_roots_pem())?;
    Ok(path)
}

fn bundled_roots_pem() -> String {
    webpki_root_certs::TLS_SERVER_ROOT_CERTS
        .iter()
        .map(|cert| pem_encode(cert.as_ref()))
        .collect()
}

fn pem_encode(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for line in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

/// Point `SSL_CERT_FILE` and `REQUESTS_CA_BUNDLE` at the resolved bundle,
/// falling back to the compiled-in roots written under [`bundled_dir`].
///
/// Must run before any thread that reads the environment is started.
pub fn export_trust_store(settings: &TlsSettings) -> Option<PathBuf> {
    export_with_candidates(settings, SYSTEM_BUNDLES, &bundled_dir())
}

fn export_with_candidates(
    settings: &TlsSettings,
    candidates: &[&str],
    fallback_dir: &Path,
) -> Option<PathBuf> {
    let bundle = match resolve_bundle(settings.ca_bundle.as_deref(), candidates) {
        Some(bundle) => bundle,
        None => match write_bundled_roots(fallback_dir) {
            Ok(path) => {
                debug!(path = %path.display(), "no system CA bundle, using bundled roots");
                path
            }
            Err(e) => {
                warn!(?e, "failed to write bundled CA roots, leaving TLS environment untouched");
                return None;
            }
        },
    };

    std::env::set_var(SSL_CERT_FILE, &bundle);
    std::env::set_var(REQUESTS_CA_BUNDLE, &bundle);
    debug!(bundle = %bundle.display(), "exported CA bundle");

    Some(bundle)
}
