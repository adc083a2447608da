//! # Sonar Core
//!
//! Lógica do nó de proximidade: leitura do HC-SR04, cadência do buzzer,
//! janela de envio da telemetria e o loop que junta tudo. O acesso a
//! hardware, relógio e rede fica atrás de traits, então tudo aqui roda em
//! teste sem Raspberry Pi.
//!
//! ## Módulos
//! - [`types`] – Leituras, cadência, relatório de ciclo
//! - [`config`] – Configuração unificada via TOML
//! - [`error`] – Erros de sensor, GPIO e telemetria
//! - [`clock`] – Relógio monotônico (real e virtual)
//! - [`hardware`] – Trait de GPIO e sessão com limpeza garantida
//! - [`sensor`] – Medição de distância
//! - [`alerts`] – Cadência e acionamento do buzzer
//! - [`scheduler`] – Janela de envio da telemetria
//! - [`telemetry`] – Trait do cliente de telemetria
//! - [`monitor`] – Loop principal
//! - [`sim`] – Bancada simulada

pub mod types;
pub mod config;
pub mod error;
pub mod clock;
pub mod hardware;
pub mod sensor;
pub mod alerts;
pub mod scheduler;
pub mod telemetry;
pub mod monitor;
pub mod sim;

// Re-exports convenientes
pub use types::{BeepCadence, CycleAction, CycleReport, DistanceSample, EntryId, Level, PinMode, UploadOutcome};
pub use config::AppConfig;
pub use error::{ConfigError, HardwareError, NodeError, SensorError, TelemetryError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use hardware::{GpioBackend, HardwareSession, PinMap};
pub use monitor::ProximityMonitor;
pub use telemetry::TelemetryUploader;
