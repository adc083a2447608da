//! Erros do nó Sonar.
//!
//! Só [`HardwareError`] é fatal para o loop; timeouts de sensor e falhas de
//! telemetria são tratados dentro do próprio ciclo.

use std::fmt;
use std::time::Duration;

/// Falha na camada de GPIO.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("Falha ao acessar o GPIO: {0}")]
    Unavailable(String),

    #[error("Falha ao configurar o pino {pin}: {reason}")]
    Configure { pin: u8, reason: String },

    #[error("Pino {0} não foi configurado")]
    UnknownPin(u8),

    #[error("Pino {pin} não está configurado como {expected}")]
    WrongMode { pin: u8, expected: &'static str },
}

/// Fase da espera pelo eco.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoPhase {
    /// Esperando o eco subir (início do pulso).
    Rise,
    /// Esperando o eco descer (fim do pulso).
    Fall,
}

impl fmt::Display for EchoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EchoPhase::Rise => f.write_str("subida"),
            EchoPhase::Fall => f.write_str("descida"),
        }
    }
}

/// Erros de uma medição.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Timeout de {} ms esperando a {phase} do eco", .waited.as_millis())]
    Timeout { phase: EchoPhase, waited: Duration },

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

/// Erros do upload de telemetria. Nunca fatais.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Erro de transporte: {0}")]
    Transport(String),

    #[error("Erro da API: status {status}")]
    Service { status: u16 },
}

/// Falha ao gravar o arquivo de configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao gravar config: {0}")]
    Io(#[from] std::io::Error),
}

/// Erro que encerra o nó.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Configuração inválida: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}
