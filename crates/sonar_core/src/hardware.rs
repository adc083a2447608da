//! Sessão de GPIO com liberação garantida.
//!
//! [`HardwareSession`] configura os três pinos ao abrir e, no `Drop`, força o
//! buzzer em nível baixo e libera o backend. Isso cobre saída normal, Ctrl+C,
//! erro propagado e panic com unwind.

use crate::config::AppConfig;
use crate::error::HardwareError;
use crate::types::{Level, PinMode};
use tracing::{debug, info, warn};

/// Camada de acesso aos pinos. Todas as chamadas são síncronas.
pub trait GpioBackend {
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), HardwareError>;
    fn set_output(&mut self, pin: u8, level: Level) -> Result<(), HardwareError>;
    fn read_input(&mut self, pin: u8) -> Result<Level, HardwareError>;
    /// Devolve os pinos ao sistema. Deve ser idempotente.
    fn release(&mut self);
}

/// Números BCM dos pinos usados pelo nó.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub trigger: u8,
    pub echo: u8,
    pub buzzer: u8,
}

impl PinMap {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            trigger: config.sensor.trigger_pin,
            echo: config.sensor.echo_pin,
            buzzer: config.alert.buzzer_pin,
        }
    }
}

/// Posse exclusiva do backend enquanto o nó roda.
pub struct HardwareSession<B: GpioBackend> {
    backend: B,
    pins: PinMap,
}

impl<B: GpioBackend> HardwareSession<B> {
    /// Configura TRIG e buzzer como saída em nível baixo e ECHO como entrada.
    pub fn open(mut backend: B, pins: PinMap) -> Result<Self, HardwareError> {
        let low = PinMode::Output { initial: Level::Low };
        let setup = [(pins.trigger, low), (pins.echo, PinMode::Input), (pins.buzzer, low)];

        for (pin, mode) in setup {
            if let Err(e) = backend.configure(pin, mode) {
                backend.release();
                return Err(e);
            }
        }

        info!(
            "GPIO configurado: TRIG={} ECHO={} BUZZER={}",
            pins.trigger, pins.echo, pins.buzzer
        );
        Ok(Self { backend, pins })
    }

    pub fn gpio(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GpioBackend> Drop for HardwareSession<B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.set_output(self.pins.buzzer, Level::Low) {
            warn!("Não foi possível desligar o buzzer: {e}");
        }
        self.backend.release();
        debug!("Pinos liberados");
        info!("Limpeza do GPIO concluída");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sim::{DistanceProfile, SimulatedRig};
    use std::time::Duration;

    fn pins() -> PinMap {
        PinMap::from_config(&AppConfig::default())
    }

    #[test]
    fn open_configures_all_pins() {
        let rig = SimulatedRig::new(ManualClock::new(Duration::ZERO), pins(), DistanceProfile::Absent);
        let probe = rig.probe();
        let _session = HardwareSession::open(rig, pins()).unwrap();

        assert_eq!(probe.pin_mode(23), Some(PinMode::Output { initial: Level::Low }));
        assert_eq!(probe.pin_mode(24), Some(PinMode::Input));
        assert_eq!(probe.pin_mode(27), Some(PinMode::Output { initial: Level::Low }));
    }

    #[test]
    fn drop_forces_buzzer_low_and_releases() {
        let rig = SimulatedRig::new(ManualClock::new(Duration::ZERO), pins(), DistanceProfile::Absent);
        let probe = rig.probe();
        let mut session = HardwareSession::open(rig, pins()).unwrap();
        session.gpio().set_output(27, Level::High).unwrap();
        assert_eq!(probe.buzzer_level(), Level::High);

        drop(session);
        assert_eq!(probe.buzzer_level(), Level::Low);
        assert!(probe.is_released());
    }

    #[test]
    fn failed_open_still_releases() {
        let bad = PinMap { trigger: 23, echo: 24, buzzer: 99 };
        let rig = SimulatedRig::new(ManualClock::new(Duration::ZERO), pins(), DistanceProfile::Absent);
        let probe = rig.probe();

        assert!(HardwareSession::open(rig, bad).is_err());
        assert!(probe.is_released());
    }

    #[test]
    fn cleanup_runs_on_panic() {
        let rig = SimulatedRig::new(ManualClock::new(Duration::ZERO), pins(), DistanceProfile::Absent);
        let probe = rig.probe();
        let mut session = HardwareSession::open(rig, pins()).unwrap();
        session.gpio().set_output(27, Level::High).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _owned = session;
            panic!("falha inesperada");
        }));

        assert!(result.is_err());
        assert!(probe.is_released());
        assert_eq!(probe.buzzer_level(), Level::Low);
    }
}
