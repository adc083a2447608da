//! Loop principal: medir → (enviar)? → bipar | descansar.
//!
//! Tudo roda numa única thread. A ordem dentro de um ciclo é fixa: a leitura
//! vem antes da decisão de envio, que vem antes do buzzer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::alerts::AlertController;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::HardwareError;
use crate::hardware::{GpioBackend, HardwareSession};
use crate::scheduler::TelemetryScheduler;
use crate::sensor::RangeSensor;
use crate::telemetry::TelemetryUploader;
use crate::types::{CycleAction, CycleReport, UploadOutcome};

/// Nó de proximidade: sensor, buzzer e telemetria sobre uma sessão de GPIO.
pub struct ProximityMonitor<B: GpioBackend, C: Clock, U: TelemetryUploader> {
    session: HardwareSession<B>,
    clock: C,
    sensor: RangeSensor,
    alert: AlertController,
    settle: Duration,
    telemetry: Option<(TelemetryScheduler, U)>,
}

impl<B: GpioBackend, C: Clock, U: TelemetryUploader> ProximityMonitor<B, C, U> {
    /// `uploader = None` desliga a telemetria.
    pub fn new(session: HardwareSession<B>, clock: C, config: &AppConfig, uploader: Option<U>) -> Self {
        let telemetry = uploader.map(|u| (TelemetryScheduler::new(config.telemetry.send_interval()), u));
        Self {
            session,
            clock,
            sensor: RangeSensor::new(&config.sensor),
            alert: AlertController::new(&config.alert),
            settle: config.sensor.settle(),
            telemetry,
        }
    }

    pub fn scheduler(&self) -> Option<&TelemetryScheduler> {
        self.telemetry.as_ref().map(|(scheduler, _)| scheduler)
    }

    /// TRIG em nível baixo e espera inicial do sensor.
    pub fn settle(&mut self) -> Result<(), HardwareError> {
        debug!("Aguardando o sensor estabilizar ({:?})", self.settle);
        self.sensor.settle(self.session.gpio(), &self.clock, self.settle)
    }

    /// Executa um ciclo completo.
    pub fn cycle(&mut self) -> Result<CycleReport, HardwareError> {
        let now = self.clock.now();
        let distance = self.sensor.measure(self.session.gpio(), &self.clock)?;

        let Some(cm) = distance.centimeters() else {
            self.alert.rest(self.session.gpio(), &self.clock)?;
            return Ok(CycleReport {
                distance,
                upload: None,
                action: CycleAction::Rested,
            });
        };

        let upload = self.maybe_upload(cm, now);

        let action = if self.alert.in_range(cm) {
            let cadence = self.alert.cadence_for(cm);
            self.alert.beep(self.session.gpio(), &self.clock, cadence)?;
            CycleAction::Beeped(cadence)
        } else {
            self.alert.rest(self.session.gpio(), &self.clock)?;
            CycleAction::Rested
        };

        Ok(CycleReport {
            distance,
            upload,
            action,
        })
    }

    fn maybe_upload(&mut self, cm: f64, now: Duration) -> Option<UploadOutcome> {
        let (scheduler, uploader) = self.telemetry.as_mut()?;
        if !scheduler.should_upload(now) {
            return None;
        }

        match uploader.upload(cm) {
            Ok(entry) => {
                scheduler.record_upload(now);
                debug!("Leitura {cm:.2} cm gravada (entrada {entry})");
                Some(UploadOutcome::Sent(entry))
            }
            Err(e) => {
                debug!("Falha ao enviar telemetria: {e}");
                Some(UploadOutcome::Failed(e))
            }
        }
    }

    /// Roda ciclos até `stop` ser sinalizado. Erros de GPIO encerram o loop;
    /// a limpeza fica com o `Drop` da sessão.
    pub fn run(
        &mut self,
        stop: &AtomicBool,
        mut on_cycle: impl FnMut(&CycleReport),
    ) -> Result<(), HardwareError> {
        while !stop.load(Ordering::SeqCst) {
            let report = self.cycle()?;
            on_cycle(&report);
        }
        info!("Loop encerrado");
        Ok(())
    }
}
