//! # Sonar Node
//!
//! Mede a distância com um HC-SR04, bipa mais rápido conforme o objeto se
//! aproxima e envia a leitura ao ThingSpeak respeitando o limite de taxa.
//! Precisa de acesso ao `/dev/gpiomem` (usuário no grupo `gpio` ou sudo).
//!
//! ## Uso
//! ```bash
//! sonar_node                         # Config ao lado do executável
//! sonar_node --config /etc/sonar.toml
//! sonar_node --simulate              # Sem Raspberry Pi, sensor simulado
//! ```

mod rpi_gpio;
mod thingspeak;

use rpi_gpio::RpiGpio;
use sonar_core::config::TelemetryConfig;
use sonar_core::sim::{DistanceProfile, SimulatedRig};
use sonar_core::{
    AppConfig, CycleReport, GpioBackend, HardwareSession, NodeError, PinMap, ProximityMonitor, SystemClock,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thingspeak::ThingSpeakClient;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Argumentos ──
    let args: Vec<String> = std::env::args().collect();
    let simulate = args.iter().any(|a| a == "--simulate");
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);

    // ── Carregar config ──
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    // ── Ctrl+C ──
    // Sem o handler o Ctrl+C mata o processo antes do Drop da sessão
    let stop = match install_stop_flag() {
        Ok(stop) => stop,
        Err(e) => {
            error!("Falha ao instalar handler de Ctrl+C: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, simulate, &stop) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!();
            error!("Erro inesperado: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Flag levantada por SIGINT/SIGTERM. Só pode ser instalada uma vez.
fn install_stop_flag() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    Ok(stop)
}

fn run(config: &AppConfig, simulate: bool, stop: &AtomicBool) -> Result<(), NodeError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(NodeError::InvalidConfig(errors));
    }

    let uploader = build_uploader(&config.telemetry);
    let pins = PinMap::from_config(config);
    let clock = SystemClock::new();

    print_banner(config, uploader.is_some(), simulate);

    if simulate {
        let profile = DistanceProfile::Sweep {
            near_cm: 5.0,
            far_cm: 80.0,
            period: Duration::from_secs(30),
        };
        let session = HardwareSession::open(SimulatedRig::new(clock, pins, profile), pins)?;
        drive(ProximityMonitor::new(session, clock, config, uploader), stop)
    } else {
        let session = HardwareSession::open(RpiGpio::new()?, pins)?;
        drive(ProximityMonitor::new(session, clock, config, uploader), stop)
    }
}

/// Roda o loop; a sessão de GPIO é limpa quando `monitor` sai de escopo.
fn drive<B: GpioBackend>(
    mut monitor: ProximityMonitor<B, SystemClock, ThingSpeakClient>,
    stop: &AtomicBool,
) -> Result<(), NodeError> {
    monitor.settle()?;
    monitor.run(stop, print_status)?;
    println!("\nInterrompido pelo usuário");
    Ok(())
}

fn build_uploader(telemetry: &TelemetryConfig) -> Option<ThingSpeakClient> {
    if !telemetry.enabled {
        info!("Telemetria desligada na configuração");
        return None;
    }
    if !telemetry.is_active() {
        warn!("Telemetria desligada: api_key vazia");
        return None;
    }
    match ThingSpeakClient::new(telemetry) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("Falha ao criar cliente HTTP: {e}");
            None
        }
    }
}

fn print_banner(config: &AppConfig, telemetry: bool, simulate: bool) {
    println!();
    println!("══════════════════════════════════════════════");
    println!("   📡 SONAR NODE – ATIVO{}", if simulate { " (simulado)" } else { "" });
    println!("══════════════════════════════════════════════");
    println!("  Buzzer:    ativo abaixo de {} cm", config.alert.max_distance_cm);
    println!(
        "  Cadência:  {}–{} ms",
        config.alert.min_delay_ms, config.alert.max_delay_ms
    );
    if telemetry {
        let channel = &config.telemetry;
        println!("  Canal:     {} ({})", channel.channel_id, channel.field);
        println!("  Intervalo: {:.0}s", channel.send_interval_secs);
    } else {
        println!("  Telemetria: desligada");
    }
    println!("  Ctrl+C para parar");
    println!("══════════════════════════════════════════════");
    println!();
}

/// Reescreve a linha de status no lugar.
fn print_status(report: &CycleReport) {
    let line = report.to_string();
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "\r{line:<72}");
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_starts_lowered_and_installs_once() {
        let stop = install_stop_flag().unwrap();
        assert!(!stop.load(Ordering::SeqCst));

        // Segunda instalação falha; `main` trata isso como fatal
        assert!(install_stop_flag().is_err());
    }
}
