//! Bancada simulada: HC-SR04 + buzzer sem Raspberry Pi.
//!
//! Usada nos testes (com [`ManualClock`](crate::clock::ManualClock)) e no modo
//! `--simulate` do nó (com [`SystemClock`](crate::clock::SystemClock)). O eco
//! é modelado a partir da borda de descida do TRIG: sobe depois de
//! `echo_latency` e fica alto pelo tempo de ida e volta da distância atual.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::HardwareError;
use crate::hardware::{GpioBackend, PinMap};
use crate::sensor::SPEED_OF_SOUND_CM_S;
use crate::types::{Level, PinMode};

/// Atraso típico entre o fim do disparo e a subida do eco no HC-SR04.
const DEFAULT_ECHO_LATENCY: Duration = Duration::from_micros(450);

/// Distância vista pelo sensor simulado. `None` = sem eco.
#[derive(Debug, Clone)]
pub enum DistanceProfile {
    Fixed(f64),
    Absent,
    /// Uma leitura por disparo; a última se repete.
    Sequence(Vec<Option<f64>>),
    /// Onda triangular entre `near_cm` e `far_cm`.
    Sweep { near_cm: f64, far_cm: f64, period: Duration },
}

impl DistanceProfile {
    fn distance(&self, trigger_index: usize, at: Duration) -> Option<f64> {
        match self {
            DistanceProfile::Fixed(cm) => Some(*cm),
            DistanceProfile::Absent => None,
            DistanceProfile::Sequence(seq) => seq
                .get(trigger_index)
                .or_else(|| seq.last())
                .copied()
                .flatten(),
            DistanceProfile::Sweep { near_cm, far_cm, period } => {
                let period = period.as_secs_f64();
                if period <= 0.0 {
                    return Some(*near_cm);
                }
                let phase = (at.as_secs_f64() % period) / period;
                let tri = 1.0 - (2.0 * phase - 1.0).abs();
                Some(near_cm + (far_cm - near_cm) * tri)
            }
        }
    }
}

#[derive(Debug, Default)]
struct RigState {
    modes: HashMap<u8, PinMode>,
    outputs: HashMap<u8, Level>,
    buzzer_log: Vec<(Duration, Level)>,
    /// Janela [subida, descida) do último eco
    echo_window: Option<(Duration, Duration)>,
    triggers: usize,
    released: bool,
}

/// Backend de GPIO simulado.
pub struct SimulatedRig<C: Clock> {
    clock: C,
    pins: PinMap,
    profile: DistanceProfile,
    echo_latency: Duration,
    state: Rc<RefCell<RigState>>,
}

impl<C: Clock> SimulatedRig<C> {
    pub fn new(clock: C, pins: PinMap, profile: DistanceProfile) -> Self {
        Self {
            clock,
            pins,
            profile,
            echo_latency: DEFAULT_ECHO_LATENCY,
            state: Rc::new(RefCell::new(RigState::default())),
        }
    }

    pub fn with_echo_latency(mut self, latency: Duration) -> Self {
        self.echo_latency = latency;
        self
    }

    /// Handle para inspecionar a bancada depois que ela foi movida para a sessão.
    pub fn probe(&self) -> RigProbe {
        RigProbe {
            state: Rc::clone(&self.state),
            buzzer: self.pins.buzzer,
        }
    }

    fn fire(&mut self, at: Duration) {
        let mut state = self.state.borrow_mut();
        let index = state.triggers;
        state.triggers += 1;
        state.echo_window = self.profile.distance(index, at).map(|cm| {
            let round_trip = Duration::from_secs_f64(2.0 * cm.max(0.0) / SPEED_OF_SOUND_CM_S);
            let rise = at + self.echo_latency;
            (rise, rise + round_trip)
        });
    }

    fn expect_mode(&self, pin: u8, output: bool) -> Result<(), HardwareError> {
        let state = self.state.borrow();
        if state.released {
            return Err(HardwareError::Unavailable("bancada já liberada".into()));
        }
        match (state.modes.get(&pin), output) {
            (None, _) => Err(HardwareError::UnknownPin(pin)),
            (Some(PinMode::Output { .. }), true) | (Some(PinMode::Input), false) => Ok(()),
            (Some(_), true) => Err(HardwareError::WrongMode { pin, expected: "saída" }),
            (Some(_), false) => Err(HardwareError::WrongMode { pin, expected: "entrada" }),
        }
    }
}

impl<C: Clock> GpioBackend for SimulatedRig<C> {
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), HardwareError> {
        let known = [self.pins.trigger, self.pins.echo, self.pins.buzzer];
        if !known.contains(&pin) {
            return Err(HardwareError::Configure {
                pin,
                reason: "pino não existe na bancada".into(),
            });
        }
        let mut state = self.state.borrow_mut();
        state.modes.insert(pin, mode);
        if let PinMode::Output { initial } = mode {
            state.outputs.insert(pin, initial);
        }
        Ok(())
    }

    fn set_output(&mut self, pin: u8, level: Level) -> Result<(), HardwareError> {
        self.expect_mode(pin, true)?;
        let now = self.clock.now();
        let previous = self.state.borrow_mut().outputs.insert(pin, level);

        if pin == self.pins.trigger && previous == Some(Level::High) && level == Level::Low {
            self.fire(now);
        }
        if pin == self.pins.buzzer {
            self.state.borrow_mut().buzzer_log.push((now, level));
        }
        Ok(())
    }

    fn read_input(&mut self, pin: u8) -> Result<Level, HardwareError> {
        self.expect_mode(pin, false)?;
        if pin != self.pins.echo {
            return Ok(Level::Low);
        }
        let now = self.clock.now();
        let high = match self.state.borrow().echo_window {
            Some((rise, fall)) => now >= rise && now < fall,
            None => false,
        };
        Ok(Level::from(high))
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        state.modes.clear();
        state.released = true;
    }
}

/// Visão somente leitura da bancada.
#[derive(Clone)]
pub struct RigProbe {
    state: Rc<RefCell<RigState>>,
    buzzer: u8,
}

impl RigProbe {
    pub fn pin_mode(&self, pin: u8) -> Option<PinMode> {
        self.state.borrow().modes.get(&pin).copied()
    }

    pub fn buzzer_level(&self) -> Level {
        self.state
            .borrow()
            .outputs
            .get(&self.buzzer)
            .copied()
            .unwrap_or(Level::Low)
    }

    /// Transições do buzzer com o instante de cada escrita.
    pub fn buzzer_log(&self) -> Vec<(Duration, Level)> {
        self.state.borrow().buzzer_log.clone()
    }

    pub fn triggers(&self) -> usize {
        self.state.borrow().triggers
    }

    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }
}
