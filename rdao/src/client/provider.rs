//! Server address selection

use std::fmt::Debug;

use super::error::{ClientError, Result};

/// Picks the base address (`scheme://host:port`) for the next call.
pub trait ServiceProvider: Debug + Send + Sync {
    fn select_server(&self) -> Result<String>;
}

/// Reads the address from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvProvider {
    var: String,
}

impl EnvProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl ServiceProvider for EnvProvider {
    fn select_server(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(addr) if !addr.trim().is_empty() => Ok(addr.trim().to_string()),
            _ => Err(ClientError::ServerSelection(format!(
                "environment variable {} is not set",
                self.var
            ))),
        }
    }
}

/// Always returns the same address.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    addr: String,
}

impl StaticProvider {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl ServiceProvider for StaticProvider {
    fn select_server(&self) -> Result<String> {
        if self.addr.is_empty() {
            return Err(ClientError::ServerSelection("empty server address".into()));
        }
        Ok(self.addr.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_provider_missing_var() {
        let provider = EnvProvider::new("RDAO_TEST_PROVIDER_UNSET_9F2C");
        let err = provider.select_server().unwrap_err();
        assert!(matches!(err, ClientError::ServerSelection(msg) if msg.contains("RDAO_TEST_PROVIDER_UNSET_9F2C")));
    }

    #[test]
    fn test_static_provider() {
        assert_eq!(
            StaticProvider::new("http://127.0.0.1:6060").select_server().unwrap(),
            "http://127.0.0.1:6060"
        );
        assert!(StaticProvider::new("").select_server().is_err());
    }
}
