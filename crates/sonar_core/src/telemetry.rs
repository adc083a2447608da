//! Interface com o serviço de telemetria.

use crate::error::TelemetryError;
use crate::types::EntryId;

/// Envia uma leitura e devolve o identificador da entrada gravada.
///
/// Implementações são bloqueantes e aplicam o próprio timeout de transporte.
pub trait TelemetryUploader {
    fn upload(&mut self, distance_cm: f64) -> Result<EntryId, TelemetryError>;
}
