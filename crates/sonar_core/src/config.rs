//! Configuração unificada via TOML.
//!
//! O arquivo é opcional: sem ele o nó roda com os valores padrão abaixo
//! (pinos BCM 23/24/27, limiar de 50 cm, envio a cada 20 s).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuração do sensor HC-SR04.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Pino BCM do TRIG
    pub trigger_pin: u8,
    /// Pino BCM do ECHO
    pub echo_pin: u8,
    /// Largura do pulso de disparo (µs)
    pub trigger_pulse_us: u64,
    /// Timeout de cada espera pelo eco (ms)
    pub echo_timeout_ms: u64,
    /// Espera inicial para o sensor estabilizar (ms)
    pub settle_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            trigger_pin: 23,
            echo_pin: 24,
            trigger_pulse_us: 10,
            echo_timeout_ms: 100,
            settle_ms: 2000,
        }
    }
}

impl SensorConfig {
    pub fn trigger_pulse(&self) -> Duration {
        Duration::from_micros(self.trigger_pulse_us)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Configuração do alerta sonoro.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Pino BCM do buzzer
    pub buzzer_pin: u8,
    /// Buzzer ativo abaixo desta distância (cm)
    pub max_distance_cm: f64,
    /// Cadência mais rápida, objeto colado no sensor (ms)
    pub min_delay_ms: u64,
    /// Cadência mais lenta, objeto no limiar (ms)
    pub max_delay_ms: u64,
    /// Pausa quando fora de alcance ou em erro de leitura (ms)
    pub idle_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            buzzer_pin: 27,
            max_distance_cm: 50.0,
            min_delay_ms: 50,
            max_delay_ms: 500,
            idle_ms: 100,
        }
    }
}

impl AlertConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

/// Configuração do envio ao ThingSpeak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Endpoint de update
    pub api_url: String,
    /// Write API Key (vazio = telemetria desligada)
    pub api_key: String,
    /// Só informativo, aparece no banner
    pub channel_id: String,
    /// Campo do canal que recebe a distância
    pub field: String,
    /// Intervalo mínimo entre envios bem-sucedidos (s)
    pub send_interval_secs: f64,
    /// Timeout da requisição HTTP (s)
    pub timeout_secs: f64,
    /// Limite de taxa do serviço; o intervalo precisa ser maior (s)
    pub service_rate_limit_secs: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.thingspeak.com/update".into(),
            api_key: String::new(),
            channel_id: String::new(),
            field: "field1".into(),
            send_interval_secs: 20.0,
            timeout_secs: 5.0,
            service_rate_limit_secs: 15.0,
        }
    }
}

impl TelemetryConfig {
    /// Telemetria só roda com a chave preenchida.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_secs_f64(self.send_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// Configuração raiz do nó.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor: SensorConfig,
    pub alert: AlertConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("sonar.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let sensor = &self.sensor;
        let alert = &self.alert;
        let telemetry = &self.telemetry;

        let pins = [sensor.trigger_pin, sensor.echo_pin, alert.buzzer_pin];
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            errors.push(format!("Pinos repetidos: TRIG {}, ECHO {}, buzzer {}", pins[0], pins[1], pins[2]));
        }
        if sensor.trigger_pulse_us == 0 {
            errors.push("Pulso de disparo não pode ser 0".into());
        }
        if sensor.echo_timeout_ms == 0 {
            errors.push("Timeout do eco não pode ser 0".into());
        }

        if !(alert.max_distance_cm > 0.0) {
            errors.push(format!("Distância máxima inválida: {}", alert.max_distance_cm));
        }
        if alert.min_delay_ms > alert.max_delay_ms {
            errors.push(format!(
                "Cadência mínima ({} ms) maior que a máxima ({} ms)",
                alert.min_delay_ms, alert.max_delay_ms
            ));
        }

        if telemetry.enabled {
            let durations = [
                ("Intervalo de envio", telemetry.send_interval_secs),
                ("Timeout HTTP", telemetry.timeout_secs),
                ("Limite do serviço", telemetry.service_rate_limit_secs),
            ];
            for (name, secs) in durations {
                if !is_positive_duration(secs) {
                    errors.push(format!("{name} inválido: {secs}s"));
                }
            }
            if !(telemetry.send_interval_secs > telemetry.service_rate_limit_secs) {
                errors.push(format!(
                    "Intervalo de envio ({}s) precisa ser maior que o limite do serviço ({}s)",
                    telemetry.send_interval_secs, telemetry.service_rate_limit_secs
                ));
            }
            if telemetry.field.trim().is_empty() {
                errors.push("Campo do canal não pode ser vazio".into());
            }
        }

        errors
    }
}

/// Segundos que viram um `Duration` positivo sem estourar.
fn is_positive_duration(secs: f64) -> bool {
    secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
}
