//! Configuração do nrx carregada a partir de `nrx.toml`.
//!
//! A struct [`NrxConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `NRX_API_URL` e `NRX_POLL_INTERVAL_MS` têm
//! precedência sobre o arquivo; flags da CLI têm precedência sobre ambos.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::DEFAULT_API_URL;
use crate::error::NrxError;
use crate::lifecycle::LifecycleSettings;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "nrx.toml";

/// Menor intervalo de polling aceito, para não sobrecarregar o serviço.
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

/// Configuração de nível superior carregada de `nrx.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NrxConfig {
    /// URL base do serviço de remix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Prazo máximo de cada chamada de rede, em milissegundos.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Prazo para estabelecer a conexão TCP, em milissegundos.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Estilo usado quando a CLI não informa nenhum.
    #[serde(default)]
    pub default_style: Option<String>,
}

// Valor padrão para a URL do serviço.
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

// Valor padrão para o intervalo de polling: 2000ms.
fn default_poll_interval_ms() -> u64 {
    2000
}

// Valor padrão para o prazo de cada requisição: 30000ms.
fn default_request_timeout_ms() -> u64 {
    30_000
}

// Valor padrão para o prazo de conexão: 10000ms.
fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for NrxConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            default_style: None,
        }
    }
}

impl NrxConfig {
    /// Carrega `nrx.toml` do diretório atual e aplica as variáveis de ambiente.
    pub fn load() -> Result<Self, NrxError> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Lê a configuração de `path`. Usa valores padrão se o arquivo não existir.
    pub fn from_file(path: &Path) -> Result<Self, NrxError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<NrxConfig>(&contents)?)
    }

    /// Aplica sobrescritas vindas do ambiente. `lookup` abstrai `std::env::var`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), NrxError> {
        if let Some(url) = lookup("NRX_API_URL")
            && !url.is_empty()
        {
            self.api_url = url;
        }

        if let Some(raw) = lookup("NRX_POLL_INTERVAL_MS") {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| {
                NrxError::Config(format!("NRX_POLL_INTERVAL_MS is not a number: {raw}"))
            })?;
        }

        Ok(())
    }

    /// Aplica as flags globais da CLI.
    pub fn with_overrides(mut self, api_url: Option<String>, poll_interval_ms: Option<u64>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(ms) = poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            poll_interval: self.poll_interval(),
            request_timeout: self.request_timeout(),
        }
    }
}
