// ============================================================================
// Configuration
// ============================================================================
// Lue depuis l'environnement (après chargement optionnel d'un fichier .env)
//
// | Variable                 | Défaut                                   |
// |--------------------------|------------------------------------------|
// | COINFOLIO_STORE_URL      | (absent = mode hors-ligne)               |
// | COINFOLIO_DATA_FILE      | ./coinfolio-store.json                   |
// | COINFOLIO_TIMEOUT_SECS   | 10                                       |
// | COINFOLIO_LOG_DIR        | <data_local_dir>/coinfolio/logs          |
// | RUST_LOG                 | coinfolio=debug,info                     |
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;

pub const ENV_STORE_URL: &str = "COINFOLIO_STORE_URL";
pub const ENV_DATA_FILE: &str = "COINFOLIO_DATA_FILE";
pub const ENV_TIMEOUT_SECS: &str = "COINFOLIO_TIMEOUT_SECS";
pub const ENV_LOG_DIR: &str = "COINFOLIO_LOG_DIR";

const DEFAULT_DATA_FILE: &str = "coinfolio-store.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Backend clé-valeur à utiliser
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// Service CRUD distant
    Remote { base_url: Url, timeout: Duration },

    /// Store local persisté dans un fichier JSON
    Local { data_file: PathBuf },
}

/// Configuration complète de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: StoreBackend,
    pub log_dir: PathBuf,
}

impl Config {
    /// Charge `.env` s'il existe puis lit l'environnement du processus
    pub fn from_env() -> Result<Self> {
        // Un .env absent n'est pas une erreur
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Construit la configuration à partir d'une fonction de lookup
    ///
    /// CONCEPT RUST : Injection de dépendance par closure
    /// - from_env() passe std::env::var
    /// - les tests passent une HashMap, sans toucher à l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get(ENV_STORE_URL) {
            Some(raw) => {
                let base_url = parse_base_url(&raw)?;
                let timeout = match get(ENV_TIMEOUT_SECS) {
                    Some(secs) => parse_timeout(&secs)?,
                    None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                };
                StoreBackend::Remote { base_url, timeout }
            }
            None => StoreBackend::Local {
                data_file: get(ENV_DATA_FILE)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            },
        };

        let log_dir = get(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        Ok(Self { backend, log_dir })
    }

    /// Vrai si aucun service distant n'est configuré
    pub fn is_offline(&self) -> bool {
        matches!(self.backend, StoreBackend::Local { .. })
    }
}

/// Répertoire de logs par défaut
///
/// - Linux/WSL : ~/.local/share/coinfolio/logs
/// - macOS : ~/Library/Application Support/coinfolio/logs
/// - Windows : C:\Users\<user>\AppData\Local\coinfolio\logs
/// - Sinon : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("coinfolio").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("{} n'est pas une URL valide : {}", ENV_STORE_URL, raw))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("{} doit utiliser http ou https, reçu : {}", ENV_STORE_URL, url.scheme());
    }

    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{} doit être un nombre de secondes : {}", ENV_TIMEOUT_SECS, raw))?;

    if secs == 0 {
        bail!("{} doit être supérieur à 0", ENV_TIMEOUT_SECS);
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_are_offline() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.is_offline());
        assert_eq!(
            cfg.backend,
            StoreBackend::Local {
                data_file: PathBuf::from(DEFAULT_DATA_FILE)
            }
        );
    }

    #[test]
    fn test_remote_backend() {
        let cfg = config(&[
            (ENV_STORE_URL, "https://kv.example.com/api/"),
            (ENV_TIMEOUT_SECS, "3"),
            (ENV_LOG_DIR, "/tmp/coinfolio-logs"),
        ])
        .unwrap();

        match cfg.backend {
            StoreBackend::Remote { base_url, timeout } => {
                assert_eq!(base_url.host_str(), Some("kv.example.com"));
                assert_eq!(timeout, Duration::from_secs(3));
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        assert_eq!(cfg.log_dir, PathBuf::from("/tmp/coinfolio-logs"));
    }

    #[test]
    fn test_blank_url_means_offline() {
        let cfg = config(&[(ENV_STORE_URL, "   "), (ENV_DATA_FILE, "/tmp/kv.json")]).unwrap();
        assert_eq!(
            cfg.backend,
            StoreBackend::Local {
                data_file: PathBuf::from("/tmp/kv.json")
            }
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[(ENV_STORE_URL, "not a url")]).is_err());
        assert!(config(&[(ENV_STORE_URL, "ftp://kv.example.com")]).is_err());
        assert!(config(&[(ENV_STORE_URL, "http://kv"), (ENV_TIMEOUT_SECS, "soon")]).is_err());
        assert!(config(&[(ENV_STORE_URL, "http://kv"), (ENV_TIMEOUT_SECS, "0")]).is_err());
    }
}
