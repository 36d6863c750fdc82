//! Interface de linha de comando do nrx baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (remix, styles,
//! system, status, download) e flags globais (--api-url,
//! --poll-interval-ms, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// nrx: cliente de terminal para o Neural Remix Engine.
#[derive(Debug, Parser)]
#[command(name = "nrx", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL base do serviço de remix (sobrescreve `nrx.toml` e `NRX_API_URL`).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Envia um arquivo de áudio e acompanha o remix até o fim.
    Remix {
        /// Arquivo de áudio de entrada (MP3, WAV, FLAC, M4A).
        file: PathBuf,

        /// Estilo do catálogo (ex.: lofi_chill). Usa o primeiro se omitido.
        #[arg(long)]
        style: Option<String>,

        /// Nível de energia, de 0.5 (calmo) a 2.0 (intenso).
        #[arg(long, allow_negative_numbers = true)]
        energy: Option<f64>,

        /// Brilho, de 0.5 (escuro) a 2.0 (brilhante).
        #[arg(long, allow_negative_numbers = true)]
        brightness: Option<f64>,

        /// Salva o áudio final neste caminho quando o job terminar.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Imprime o registro final do job em JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Lista os estilos oferecidos pelo serviço.
    Styles,

    /// Mostra os metadados do sistema de remix.
    System,

    /// Consulta o status de um job uma única vez.
    Status {
        /// Identificador do job.
        job_id: String,
    },

    /// Baixa o áudio de um job concluído.
    Download {
        /// Identificador do job.
        job_id: String,

        /// Caminho de destino.
        #[arg(long, short)]
        output: PathBuf,
    },
}
