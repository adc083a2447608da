//! Tipos transitórios do ciclo de medição.
//!
//! Nada aqui é persistido: cada ciclo produz uma [`DistanceSample`], talvez um
//! [`EntryId`] de telemetria e termina com um [`CycleReport`].

use std::fmt;
use std::time::Duration;

use crate::error::TelemetryError;

// ──────────────────────────────────────────────
// Hardware
// ──────────────────────────────────────────────

/// Nível lógico de um pino.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Direção de um pino ao ser configurado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output { initial: Level },
}

// ──────────────────────────────────────────────
// Distância
// ──────────────────────────────────────────────

/// Uma leitura do sensor ultrassônico.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceSample {
    /// Distância em centímetros, arredondada a 2 casas.
    Valid(f64),
    /// O eco não chegou dentro do timeout.
    Invalid,
}

impl DistanceSample {
    /// Retorna a distância em cm, se a leitura for válida.
    pub fn centimeters(self) -> Option<f64> {
        match self {
            DistanceSample::Valid(cm) => Some(cm),
            DistanceSample::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, DistanceSample::Valid(_))
    }
}

impl fmt::Display for DistanceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceSample::Valid(cm) => write!(f, "{cm:.2} cm"),
            DistanceSample::Invalid => f.write_str("erro de leitura"),
        }
    }
}

// ──────────────────────────────────────────────
// Beep
// ──────────────────────────────────────────────

/// Período total (ligado + desligado) de um bipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BeepCadence(Duration);

impl BeepCadence {
    pub(crate) fn new(period: Duration) -> Self {
        Self(period)
    }

    pub fn period(self) -> Duration {
        self.0
    }

    /// Duração de cada metade do ciclo (buzzer ligado, depois desligado).
    pub fn half(self) -> Duration {
        self.0 / 2
    }
}

// ──────────────────────────────────────────────
// Telemetria
// ──────────────────────────────────────────────

/// Identificador opaco devolvido pelo serviço ao gravar um ponto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryId(pub String);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resultado de uma tentativa de upload dentro de um ciclo.
#[derive(Debug)]
pub enum UploadOutcome {
    Sent(EntryId),
    Failed(TelemetryError),
}

// ──────────────────────────────────────────────
// Ciclo
// ──────────────────────────────────────────────

/// O que o buzzer fez no fim do ciclo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    /// Um ciclo completo liga/desliga com a cadência indicada.
    Beeped(BeepCadence),
    /// Buzzer forçado em nível baixo e pausa curta.
    Rested,
}

/// Resumo de uma iteração do loop principal, usado na linha de status.
#[derive(Debug)]
pub struct CycleReport {
    pub distance: DistanceSample,
    pub upload: Option<UploadOutcome>,
    pub action: CycleAction,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distância: {}", self.distance)?;
        match &self.upload {
            Some(UploadOutcome::Sent(entry)) => write!(f, " | Enviado (entrada: {entry})"),
            Some(UploadOutcome::Failed(e)) => write!(f, " | Falha no envio: {e}"),
            None => Ok(()),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
