//! Alerta sonoro – cadência do buzzer em função da distância.
//!
//! Quanto mais perto o objeto, mais rápido o bipe: a cadência vai linearmente
//! de `min_delay` (0 cm) a `max_delay` (no limiar `max_distance_cm`).

use std::time::Duration;

use crate::clock::Clock;
use crate::config::AlertConfig;
use crate::error::HardwareError;
use crate::hardware::GpioBackend;
use crate::types::{BeepCadence, Level};

/// Controla o buzzer.
#[derive(Debug, Clone)]
pub struct AlertController {
    buzzer_pin: u8,
    max_distance_cm: f64,
    min_delay: Duration,
    max_delay: Duration,
    idle: Duration,
}

impl AlertController {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            buzzer_pin: config.buzzer_pin,
            max_distance_cm: config.max_distance_cm,
            min_delay: config.min_delay(),
            max_delay: config.max_delay(),
            idle: config.idle(),
        }
    }

    /// O buzzer só toca abaixo do limiar.
    pub fn in_range(&self, distance_cm: f64) -> bool {
        distance_cm < self.max_distance_cm
    }

    /// Cadência para uma distância. Sempre dentro de `[min_delay, max_delay]`,
    /// inclusive para distâncias negativas, acima do limiar ou NaN.
    pub fn cadence_for(&self, distance_cm: f64) -> BeepCadence {
        let clamped = if distance_cm.is_nan() {
            0.0
        } else {
            distance_cm.clamp(0.0, self.max_distance_cm)
        };
        let ratio = clamped / self.max_distance_cm;

        // Interpolação em nanossegundos inteiros para os extremos serem exatos
        let span = self.max_delay.saturating_sub(self.min_delay);
        let offset = Duration::from_nanos((span.as_nanos() as f64 * ratio).round() as u64);
        let delay = (self.min_delay + offset).clamp(self.min_delay, self.max_delay);

        BeepCadence::new(delay)
    }

    /// Liga ou desliga o buzzer. Idempotente.
    pub fn drive<B: GpioBackend>(&self, gpio: &mut B, active: bool) -> Result<(), HardwareError> {
        gpio.set_output(self.buzzer_pin, Level::from(active))
    }

    /// Um ciclo completo: ligado por metade da cadência, desligado pela outra.
    pub fn beep<B: GpioBackend, C: Clock>(
        &self,
        gpio: &mut B,
        clock: &C,
        cadence: BeepCadence,
    ) -> Result<(), HardwareError> {
        self.drive(gpio, true)?;
        clock.sleep(cadence.half());
        self.drive(gpio, false)?;
        clock.sleep(cadence.half());
        Ok(())
    }

    /// Buzzer desligado e pausa curta, para não ler o sensor sem parar.
    pub fn rest<B: GpioBackend, C: Clock>(&self, gpio: &mut B, clock: &C) -> Result<(), HardwareError> {
        self.drive(gpio, false)?;
        clock.sleep(self.idle);
        Ok(())
    }
}
