//! Tipos de erro do cliente do serviço de remix.
//!
//! [`ApiError`] separa falhas transitórias (rede, 5xx, prazo esgotado) das
//! permanentes (validação, recurso inexistente). O gerenciador de jobs usa
//! [`ApiError::is_transient`] para decidir entre pular um ciclo de polling
//! ou encerrar o job.

use reqwest::StatusCode;
use thiserror::Error;

/// Erros que podem ocorrer ao interagir com o serviço de remix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Falha de rede, resposta 5xx ou corpo que não pôde ser decodificado.
    #[error("transport error: {0}")]
    Transport(String),

    /// A chamada não terminou dentro do prazo dado pelo chamador.
    #[error("request timed out")]
    Timeout,

    /// O serviço rejeitou a entrada (formato, parâmetros fora dos limites).
    #[error("rejected by service (status {status}): {message}")]
    Validation { status: u16, message: String },

    /// O job ou artefato não existe no serviço.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// `true` para falhas que podem desaparecer numa nova tentativa.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout)
    }

    /// Classifica uma resposta HTTP sem sucesso.
    ///
    /// O corpo no formato `{"detail": ...}` é desembrulhado na mensagem.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = detail_message(status, body);
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                ApiError::Transport(format!("service returned {status}: {message}"))
            }
            s if s.is_client_error() => ApiError::Validation {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Transport(format!("service returned {s}: {message}")),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

fn detail_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned())
        .map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });

    match detail {
        Some(text) if !text.trim().is_empty() => text,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
