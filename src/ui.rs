//! Interface de terminal do nrx: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`JobProgress`] só lê snapshots do job; nunca
//! altera o estado.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{InputArtifact, JobStatusResponse, RemoteStatus};
use crate::error::NrxError;
use crate::params::{ParameterState, brightness_label, energy_label, style_display_name};
use crate::state_machine::{Job, JobOutcome, JobState};

/// Mensagem final de um remix concluído, conforme o modo do backend.
pub fn completion_message(mode: Option<&str>) -> &'static str {
    match mode {
        Some("real") => "Remix complete! Using real AI models.",
        Some("mock") => "Remix complete! (Mock mode - install ML dependencies for real AI)",
        _ => "Remix complete!",
    }
}

/// Texto exibido ao lado da barra enquanto o job processa.
pub fn stage_message(job: &Job) -> String {
    match (&job.stage_description, job.state) {
        (Some(stage), _) => stage.clone(),
        (None, JobState::Submitting) => "Submitting remix...".to_string(),
        (None, _) => "Processing your remix...".to_string(),
    }
}

/// Indicador visual de progresso para um job de remix no terminal.
pub struct JobProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Estilo verde para mensagens de sucesso.
    green: Style,
    // Estilo vermelho para mensagens de falha.
    red: Style,
    // Estilo amarelo para avisos.
    yellow: Style,
}

impl JobProgress {
    /// Inicia a barra com o nome do arquivo e retorna a instância de progresso.
    pub fn start(artifact: &InputArtifact, params: &ParameterState) -> Self {
        let dim = Style::new().dim();
        let duration = artifact
            .duration_secs
            .map(|secs| format!(" ({secs:.0}s)"))
            .unwrap_or_default();
        println!(
            "  {} {}{duration} {}",
            Style::new().cyan().bold().apply_to("♫"),
            artifact.display_name,
            dim.apply_to(format!(
                "· {} · energy {:.1} ({}) · brightness {:.1} ({})",
                params.style().map(style_display_name).unwrap_or_default(),
                params.energy(),
                energy_label(params.energy()),
                params.brightness(),
                brightness_label(params.brightness()),
            ))
        );

        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_message("Submitting remix...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a barra a partir de um snapshot do job.
    pub fn update(&self, job: &Job) {
        self.pb.set_position(u64::from(job.progress));
        self.pb.set_message(stage_message(job));
    }

    /// Exibe um aviso acima da barra sem interrompê-la.
    pub fn warn(&self, message: &str) {
        self.pb.println(format!(
            "  {} {message}",
            self.yellow.apply_to("!")
        ));
    }

    /// Finaliza a barra e exibe o resultado final do job.
    ///
    /// Sucesso é mostrado em verde com checkmark; falha em vermelho com X.
    pub fn complete(&self, job: &Job) {
        self.pb.finish_and_clear();
        match job.outcome() {
            Some(JobOutcome::Success) => {
                println!(
                    "  {} {}",
                    self.green.apply_to("✓"),
                    completion_message(job.result_mode.as_deref())
                );
                if let Some(reference) = &job.result {
                    println!("    {}", reference.url);
                }
            }
            Some(JobOutcome::Failure(message)) => {
                println!("  {} Remix failed: {message}", self.red.apply_to("✗"));
            }
            None => {
                println!("  Job left in state {}", job.state);
            }
        }
    }

    /// Imprime o registro final do job formatado em JSON.
    pub fn print_summary(&self, job: &Job) -> Result<(), NrxError> {
        let style = match job.state {
            JobState::Completed => &self.green,
            JobState::Failed => &self.red,
            _ => &self.yellow,
        };
        println!();
        println!("{}", style.apply_to("─── Job Record ───"));
        println!("{}", serde_json::to_string_pretty(job)?);
        Ok(())
    }
}

/// Lista os estilos do catálogo, com o nome formatado.
pub fn print_styles(styles: &[String]) {
    let dim = Style::new().dim();
    for style in styles {
        println!("  {:<14} {}", style, dim.apply_to(style_display_name(style)));
    }
}

/// Imprime um snapshot de status avulso (`nrx status`).
pub fn print_status(job_id: &str, status: &JobStatusResponse) {
    let label = match status.remote_status() {
        RemoteStatus::Completed => Style::new().green().bold(),
        RemoteStatus::Failed => Style::new().red().bold(),
        _ => Style::new().yellow(),
    };
    let job_id = status.job_id.as_deref().unwrap_or(job_id);
    println!("  {job_id}: {}", label.apply_to(&status.status));
    println!("    progress: {}%", status.progress.clamp(0, 100));
    if let Some(stage) = status.stage() {
        println!("    stage:    {stage}");
    }
    if let Some(mode) = status.mode() {
        println!("    mode:     {mode}");
    }
    if let Some(error) = &status.error {
        println!("    error:    {error}");
    }
}
