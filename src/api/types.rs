//! Tipos de dados trocados com o serviço de remix.
//!
//! As structs de requisição/resposta derivam `Serialize`/`Deserialize` no
//! formato JSON exposto pelos endpoints `/upload`, `/remix` e `/status`.
//! [`InputArtifact`] e [`ResultLocator`] são os valores já traduzidos que o
//! restante do crate consome.

use serde::{Deserialize, Serialize};

/// Resposta do endpoint `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Identificador opaco atribuído pelo serviço ao arquivo enviado.
    pub file_id: String,
    /// Nome do arquivo como o serviço o registrou.
    pub filename: String,
    /// Duração do áudio em segundos, quando o serviço consegue medir.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Mensagem informativa ("Upload successful").
    #[serde(default)]
    pub message: Option<String>,
}

/// Artefato de entrada selecionado pelo usuário, já aceito pelo serviço.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputArtifact {
    /// Identificador opaco usado nas submissões (`file_id`).
    pub artifact_id: String,
    /// Nome exibido ao usuário.
    pub display_name: String,
    /// Duração em segundos, se conhecida.
    pub duration_secs: Option<f64>,
}

impl From<UploadResponse> for InputArtifact {
    fn from(body: UploadResponse) -> Self {
        Self {
            artifact_id: body.file_id,
            display_name: body.filename,
            duration_secs: body.duration,
        }
    }
}

/// Corpo da requisição `POST /remix`. Imutável depois de construído.
///
/// Os nomes de campo internos seguem o modelo do cliente; `serde(rename)`
/// produz os nomes esperados pelo serviço (`file_id`, `style`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemixRequest {
    #[serde(rename = "file_id")]
    pub artifact_id: String,
    #[serde(rename = "style")]
    pub style_id: String,
    pub energy: f64,
    pub brightness: f64,
}

/// Resposta do `POST /remix` quando o job é aceito.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: i64,
}

/// Detalhes opcionais do resultado reportados junto com o status.
///
/// O serviço inclui outras chaves (ex.: `output_path`) que são ignoradas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Descrição legível do estágio atual do pipeline.
    #[serde(default)]
    pub stage: Option<String>,
    /// Modo do backend que produziu o resultado ("real", "mock", ...).
    #[serde(default)]
    pub mode: Option<String>,
}

/// Resposta do endpoint `GET /status/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusResponse {
    /// Interpreta a string de status do serviço.
    pub fn remote_status(&self) -> RemoteStatus {
        RemoteStatus::parse(&self.status)
    }

    /// Estágio reportado dentro de `result`, se houver.
    pub fn stage(&self) -> Option<String> {
        self.result.as_ref().and_then(|r| r.stage.clone())
    }

    /// Modo do backend reportado dentro de `result`, se houver.
    pub fn mode(&self) -> Option<String> {
        self.result.as_ref().and_then(|r| r.mode.clone())
    }
}

/// Status de um job do ponto de vista do serviço.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Processing,
    Completed,
    Failed,
    /// Qualquer valor não reconhecido, preservado para log.
    Unknown(String),
}

impl RemoteStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processing" => RemoteStatus::Processing,
            "completed" => RemoteStatus::Completed,
            "failed" => RemoteStatus::Failed,
            _ => RemoteStatus::Unknown(raw.to_string()),
        }
    }
}

/// Resposta do endpoint `GET /styles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesResponse {
    pub styles: Vec<String>,
}

/// Localizador opaco para baixar o artefato final de um job concluído.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLocator {
    pub job_id: String,
    pub url: String,
}
