//! Medição de distância com o HC-SR04.
//!
//! Disparo de 10 µs no TRIG, depois duas esperas ativas no ECHO (subida e
//! descida), cada uma limitada por timeout. As esperas não dormem: qualquer
//! sleep ali perderia pulsos curtos.

use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::config::SensorConfig;
use crate::error::{EchoPhase, HardwareError, SensorError};
use crate::hardware::GpioBackend;
use crate::types::{DistanceSample, Level};

/// Velocidade do som ao nível do mar (343 m/s) em cm/s.
pub const SPEED_OF_SOUND_CM_S: f64 = 34_300.0;

/// Converte o tempo de ida e volta do eco em centímetros (2 casas).
pub fn distance_from_round_trip(round_trip: Duration) -> f64 {
    let cm = round_trip.as_secs_f64() * SPEED_OF_SOUND_CM_S / 2.0;
    (cm * 100.0).round() / 100.0
}

/// Sensor ultrassônico ligado a um par TRIG/ECHO.
#[derive(Debug, Clone)]
pub struct RangeSensor {
    trigger_pin: u8,
    echo_pin: u8,
    trigger_pulse: Duration,
    echo_timeout: Duration,
}

impl RangeSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            trigger_pin: config.trigger_pin,
            echo_pin: config.echo_pin,
            trigger_pulse: config.trigger_pulse(),
            echo_timeout: config.echo_timeout(),
        }
    }

    /// Deixa o TRIG em nível baixo e espera o sensor estabilizar.
    pub fn settle<B: GpioBackend, C: Clock>(
        &self,
        gpio: &mut B,
        clock: &C,
        wait: Duration,
    ) -> Result<(), HardwareError> {
        gpio.set_output(self.trigger_pin, Level::Low)?;
        clock.sleep(wait);
        Ok(())
    }

    /// Faz uma leitura. Timeout vira [`DistanceSample::Invalid`]; só falhas
    /// de GPIO sobem como erro.
    pub fn measure<B: GpioBackend, C: Clock>(
        &self,
        gpio: &mut B,
        clock: &C,
    ) -> Result<DistanceSample, HardwareError> {
        match self.try_measure(gpio, clock) {
            Ok(cm) => Ok(DistanceSample::Valid(cm)),
            Err(SensorError::Timeout { phase, waited }) => {
                debug!("Sem eco ({phase}) após {:?}", waited);
                Ok(DistanceSample::Invalid)
            }
            Err(SensorError::Hardware(e)) => Err(e),
        }
    }

    /// Leitura crua, com o motivo da falha.
    pub fn try_measure<B: GpioBackend, C: Clock>(
        &self,
        gpio: &mut B,
        clock: &C,
    ) -> Result<f64, SensorError> {
        gpio.set_output(self.trigger_pin, Level::High)?;
        clock.sleep(self.trigger_pulse);
        gpio.set_output(self.trigger_pin, Level::Low)?;

        let pulse_start = self.wait_for_echo(gpio, clock, Level::High, EchoPhase::Rise)?;
        let pulse_end = self.wait_for_echo(gpio, clock, Level::Low, EchoPhase::Fall)?;

        Ok(distance_from_round_trip(pulse_end.saturating_sub(pulse_start)))
    }

    /// Espera ativa até o ECHO atingir `target`; retorna o instante observado.
    fn wait_for_echo<B: GpioBackend, C: Clock>(
        &self,
        gpio: &mut B,
        clock: &C,
        target: Level,
        phase: EchoPhase,
    ) -> Result<Duration, SensorError> {
        let started = clock.now();
        loop {
            let now = clock.now();
            if gpio.read_input(self.echo_pin)? == target {
                return Ok(now);
            }
            let waited = now.saturating_sub(started);
            if waited > self.echo_timeout {
                return Err(SensorError::Timeout { phase, waited });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AppConfig;
    use crate::hardware::{HardwareSession, PinMap};
    use crate::sim::{DistanceProfile, SimulatedRig};

    fn session(profile: DistanceProfile) -> (HardwareSession<SimulatedRig<ManualClock>>, ManualClock) {
        let clock = ManualClock::new(Duration::from_micros(1));
        let pins = PinMap::from_config(&AppConfig::default());
        let rig = SimulatedRig::new(clock.clone(), pins, profile);
        (HardwareSession::open(rig, pins).unwrap(), clock)
    }

    #[test]
    fn one_millisecond_round_trip_is_17_15_cm() {
        assert_eq!(distance_from_round_trip(Duration::from_millis(1)), 17.15);
    }

    #[test]
    fn conversion_rounds_to_two_decimals() {
        // 1234 µs → 21.163 cm
        assert_eq!(distance_from_round_trip(Duration::from_micros(1234)), 21.16);
        assert_eq!(distance_from_round_trip(Duration::ZERO), 0.0);
    }

    #[test]
    fn measures_simulated_object() {
        let (mut session, clock) = session(DistanceProfile::Fixed(17.15));
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        let sample = sensor.measure(session.gpio(), &clock).unwrap();
        let cm = sample.centimeters().expect("leitura válida");
        assert!((cm - 17.15).abs() < 0.05, "distância: {cm}");
    }

    #[test]
    fn echo_already_high_counts_from_first_read() {
        let clock = ManualClock::new(Duration::from_micros(1));
        let pins = PinMap::from_config(&AppConfig::default());
        let rig = SimulatedRig::new(clock.clone(), pins, DistanceProfile::Fixed(17.15))
            .with_echo_latency(Duration::ZERO);
        let mut session = HardwareSession::open(rig, pins).unwrap();
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        let cm = sensor
            .try_measure(session.gpio(), &clock)
            .expect("eco sem latência não pode dar timeout");
        assert!((cm - 17.15).abs() < 0.1, "distância: {cm}");
    }

    #[test]
    fn missing_echo_yields_invalid_sample() {
        let (mut session, clock) = session(DistanceProfile::Absent);
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        let before = clock.peek();
        let sample = sensor.measure(session.gpio(), &clock).unwrap();
        assert_eq!(sample, DistanceSample::Invalid);

        // Desistiu logo depois dos 100 ms, sem bloquear indefinidamente
        let spent = clock.peek() - before;
        assert!(spent > Duration::from_millis(100));
        assert!(spent < Duration::from_millis(101));
    }

    #[test]
    fn timeout_reports_rise_phase() {
        let (mut session, clock) = session(DistanceProfile::Absent);
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        match sensor.try_measure(session.gpio(), &clock) {
            Err(SensorError::Timeout { phase, waited }) => {
                assert_eq!(phase, EchoPhase::Rise);
                assert!(waited > Duration::from_millis(100));
            }
            other => panic!("esperava timeout, veio {other:?}"),
        }
    }

    #[test]
    fn stuck_echo_times_out_on_fall() {
        // Objeto a ~20 m: eco alto por mais de 100 ms
        let (mut session, clock) = session(DistanceProfile::Fixed(2000.0));
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        assert!(matches!(
            sensor.try_measure(session.gpio(), &clock),
            Err(SensorError::Timeout { phase: EchoPhase::Fall, .. })
        ));
    }

    #[test]
    fn trigger_pulse_lasts_ten_microseconds() {
        let (mut session, clock) = session(DistanceProfile::Fixed(30.0));
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        let before = clock.peek();
        sensor.measure(session.gpio(), &clock).unwrap();
        // Disparo + latência do eco + ida e volta de 30 cm (~1.75 ms)
        assert!(clock.peek() - before > Duration::from_micros(10));
    }

    #[test]
    fn gpio_failure_propagates() {
        let (mut session, clock) = session(DistanceProfile::Fixed(30.0));
        session.gpio().release();
        let sensor = RangeSensor::new(&AppConfig::default().sensor);

        assert!(sensor.measure(session.gpio(), &clock).is_err());
    }
}
