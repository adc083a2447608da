//! Backend de GPIO do Raspberry Pi via `rppal`.
//!
//! Os pinos do `rppal` voltam ao modo original quando dropados, então
//! `release()` só precisa esvaziar o mapa.

use std::collections::HashMap;

use rppal::gpio::{self, Gpio, InputPin, OutputPin};
use sonar_core::{GpioBackend, HardwareError, Level, PinMode};
use tracing::debug;

enum Line {
    Input(InputPin),
    Output(OutputPin),
}

/// Acesso aos pinos BCM pelo `/dev/gpiomem`.
pub struct RpiGpio {
    gpio: Option<Gpio>,
    lines: HashMap<u8, Line>,
}

impl RpiGpio {
    pub fn new() -> Result<Self, HardwareError> {
        let gpio = Gpio::new().map_err(|e| HardwareError::Unavailable(e.to_string()))?;
        Ok(Self {
            gpio: Some(gpio),
            lines: HashMap::new(),
        })
    }
}

fn to_rppal(level: Level) -> gpio::Level {
    match level {
        Level::Low => gpio::Level::Low,
        Level::High => gpio::Level::High,
    }
}

fn from_rppal(level: gpio::Level) -> Level {
    match level {
        gpio::Level::Low => Level::Low,
        gpio::Level::High => Level::High,
    }
}

impl GpioBackend for RpiGpio {
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), HardwareError> {
        let gpio = self
            .gpio
            .as_ref()
            .ok_or_else(|| HardwareError::Unavailable("GPIO já liberado".into()))?;
        let raw = gpio.get(pin).map_err(|e| HardwareError::Configure {
            pin,
            reason: e.to_string(),
        })?;

        let line = match mode {
            PinMode::Input => Line::Input(raw.into_input()),
            PinMode::Output { initial: Level::Low } => Line::Output(raw.into_output_low()),
            PinMode::Output { initial: Level::High } => Line::Output(raw.into_output_high()),
        };
        self.lines.insert(pin, line);
        debug!("Pino {pin} configurado como {mode:?}");
        Ok(())
    }

    fn set_output(&mut self, pin: u8, level: Level) -> Result<(), HardwareError> {
        match self.lines.get_mut(&pin) {
            Some(Line::Output(out)) => {
                out.write(to_rppal(level));
                Ok(())
            }
            Some(Line::Input(_)) => Err(HardwareError::WrongMode { pin, expected: "saída" }),
            None => Err(HardwareError::UnknownPin(pin)),
        }
    }

    fn read_input(&mut self, pin: u8) -> Result<Level, HardwareError> {
        match self.lines.get(&pin) {
            Some(Line::Input(input)) => Ok(from_rppal(input.read())),
            Some(Line::Output(_)) => Err(HardwareError::WrongMode { pin, expected: "entrada" }),
            None => Err(HardwareError::UnknownPin(pin)),
        }
    }

    fn release(&mut self) {
        self.lines.clear();
        self.gpio = None;
    }
}
