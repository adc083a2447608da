//! Janela de envio da telemetria.
//!
//! Só sucessos avançam a janela. Depois de uma falha o próximo ciclo tenta de
//! novo, sem esperar outro intervalo inteiro.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TelemetryScheduler {
    interval: Duration,
    last_upload: Option<Duration>,
}

impl TelemetryScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_upload: None,
        }
    }

    /// `true` se já passou `interval` desde o último envio bem-sucedido
    /// (ou se nunca houve um).
    pub fn should_upload(&self, now: Duration) -> bool {
        match self.last_upload {
            Some(last) => now.saturating_sub(last) >= self.interval,
            None => true,
        }
    }

    /// Registra um envio bem-sucedido em `now`.
    pub fn record_upload(&mut self, now: Duration) {
        self.last_upload = Some(now);
    }

    pub fn last_upload(&self) -> Option<Duration> {
        self.last_upload
    }
}
