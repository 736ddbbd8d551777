use crate::config::HostnameResolution;
use crate::{Result, TesseraError};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// Maps a hostname to the canonical form stored on data nodes.
pub trait HostnameResolver: Send + Sync {
    fn canonical_hostname(&self, hostname: &str) -> Result<String>;
}

pub fn resolver_for(resolution: HostnameResolution) -> Arc<dyn HostnameResolver> {
    match resolution {
        HostnameResolution::Dns => Arc::new(DnsHostnameResolver::new()),
        HostnameResolution::Verbatim => Arc::new(VerbatimHostnameResolver),
    }
}

/// Lowercases and drops a trailing root dot without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimHostnameResolver;

impl HostnameResolver for VerbatimHostnameResolver {
    fn canonical_hostname(&self, hostname: &str) -> Result<String> {
        normalize(hostname)
    }
}

/// Forward and reverse name lookups.
pub trait NameService: Send + Sync {
    fn lookup_host(&self, hostname: &str) -> io::Result<Vec<IpAddr>>;

    fn lookup_addr(&self, addr: &IpAddr) -> io::Result<String>;
}

/// The system resolver (`/etc/hosts`, then DNS).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNameService;

impl NameService for SystemNameService {
    fn lookup_host(&self, hostname: &str) -> io::Result<Vec<IpAddr>> {
        dns_lookup::lookup_host(hostname)
    }

    fn lookup_addr(&self, addr: &IpAddr) -> io::Result<String> {
        dns_lookup::lookup_addr(addr)
    }
}

/// Canonical name is the reverse lookup of the first address the name
/// resolves to. When the reverse lookup fails the address itself is the
/// canonical name, so aliases never canonicalize to themselves.
#[derive(Clone)]
pub struct DnsHostnameResolver {
    names: Arc<dyn NameService>,
}

impl DnsHostnameResolver {
    pub fn new() -> Self {
        Self::with_name_service(Arc::new(SystemNameService))
    }

    pub fn with_name_service(names: Arc<dyn NameService>) -> Self {
        Self { names }
    }
}

impl Default for DnsHostnameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HostnameResolver for DnsHostnameResolver {
    fn canonical_hostname(&self, hostname: &str) -> Result<String> {
        let normalized = normalize(hostname)?;
        let addrs = self.names.lookup_host(&normalized).map_err(|error| {
            TesseraError::Config(format!(
                "host ({}) is unknown so cannot determine canonical hostname: {}",
                hostname, error
            ))
        })?;

        let Some(addr) = addrs.first() else {
            return Err(TesseraError::Config(format!(
                "host ({}) resolved to no addresses",
                hostname
            )));
        };

        match self.names.lookup_addr(addr) {
            Ok(name) => normalize(&name),
            Err(error) => {
                tracing::debug!("reverse lookup of {} for {} failed: {}", addr, hostname, error);
                Ok(addr.to_string())
            }
        }
    }
}

fn normalize(hostname: &str) -> Result<String> {
    if hostname.is_empty() {
        return Err(TesseraError::Config(
            "hostname cannot be zero length".to_string(),
        ));
    }

    let trimmed = hostname.strip_suffix('.').unwrap_or(hostname);
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(TesseraError::Config(format!(
            "hostname is malformed: '{}'",
            hostname
        )));
    }

    Ok(trimmed.to_ascii_lowercase())
}
