use crate::{
    animator::{
        CubicBezier,
        FillerPolicy,
    },
    presenter::{
        Payline,
        classic_paylines,
        grand_paylines,
    },
    symbols::{
        SEVEN,
        Symbol,
        SymbolSet,
    },
    wager::WagerBounds,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LOG_DIR: &str = "~/.reelspin/logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_FRAME_INTERVAL_MS: u64 = 30;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Three reels, one visible row.
    #[default]
    Classic,
    /// Five columns, three rows, five paylines.
    Grand,
}

impl Variant {
    /// Path segment of the variant's spin endpoint.
    pub fn api_name(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Grand => "grand",
        }
    }

    pub fn spec(self) -> VariantSpec {
        match self {
            Variant::Classic => VariantSpec {
                variant: self,
                title: "Classic",
                reel_count: 3,
                rows: 1,
                wager: WagerBounds::CLASSIC,
                reset_floor: 10,
                alphabet: SymbolSet::classic(),
                filler: FillerPolicy::CLASSIC,
                easing: CubicBezier::CLASSIC,
                paylines: classic_paylines(),
                rest_symbol: Some(Symbol::from(SEVEN)),
            },
            Variant::Grand => VariantSpec {
                variant: self,
                title: "Grand",
                reel_count: 5,
                rows: 3,
                wager: WagerBounds::GRAND,
                reset_floor: 50,
                alphabet: SymbolSet::grand(),
                filler: FillerPolicy::GRAND,
                easing: CubicBezier::GRAND,
                paylines: grand_paylines(),
                rest_symbol: None,
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Fixed shape and rules of one machine.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantSpec {
    pub variant: Variant,
    pub title: &'static str,
    pub reel_count: usize,
    pub rows: usize,
    pub wager: WagerBounds,
    /// Below this balance a failed spin offers a reset.
    pub reset_floor: u64,
    pub alphabet: SymbolSet,
    pub filler: FillerPolicy,
    pub easing: CubicBezier,
    pub paylines: Vec<Payline>,
    pub rest_symbol: Option<Symbol>,
}

/// Reel timing. Reel `i` stops after `base_spin_ms + i * reel_stop_interval_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub base_spin_ms: u64,
    pub reel_stop_interval_ms: u64,
    pub frame_interval_ms: u64,
}

impl TimingConfig {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Classic => Self {
                base_spin_ms: 1500,
                reel_stop_interval_ms: 500,
                frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            },
            Variant::Grand => Self {
                base_spin_ms: 1200,
                reel_stop_interval_ms: 300,
                frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            },
        }
    }

    pub fn reel_duration(&self, reel_index: usize) -> Duration {
        Duration::from_millis(
            self.base_spin_ms + reel_index as u64 * self.reel_stop_interval_ms,
        )
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Scales reel timings by `factor`; frame cadence is left alone.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor).round() as u64;
        Self {
            base_spin_ms: scale(self.base_spin_ms),
            reel_stop_interval_ms: scale(self.reel_stop_interval_ms),
            frame_interval_ms: self.frame_interval_ms,
        }
    }
}

/// Optional JSON config file. Every field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub variant: Option<Variant>,
    pub base_spin_ms: Option<u64>,
    pub reel_stop_interval_ms: Option<u64>,
    pub frame_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("invalid config file {}", path.display()))
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub variant: Option<Variant>,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
    pub turbo: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub server_url: String,
    pub variant: Variant,
    pub timing: TimingConfig,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn resolve(overrides: ConfigOverrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let variant = overrides.variant.or(file.variant).unwrap_or_default();

        let defaults = TimingConfig::for_variant(variant);
        let mut timing = TimingConfig {
            base_spin_ms: file.base_spin_ms.unwrap_or(defaults.base_spin_ms),
            reel_stop_interval_ms: file
                .reel_stop_interval_ms
                .unwrap_or(defaults.reel_stop_interval_ms),
            frame_interval_ms: file.frame_interval_ms.unwrap_or(defaults.frame_interval_ms),
        };
        if overrides.turbo {
            timing = timing.scaled(0.5);
        }
        if timing.frame_interval_ms == 0 {
            return Err(eyre!("frame_interval_ms must be greater than zero"));
        }

        let server_url = overrides
            .server_url
            .or(file.server_url)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(eyre!("server URL must start with http:// or https://: {server_url}"));
        }

        let log_dir = overrides
            .log_dir
            .or(file.log_dir)
            .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
        let log_dir = PathBuf::from(shellexpand::tilde(&log_dir).into_owned());

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            variant,
            timing,
            request_timeout: Duration::from_millis(
                file.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            log_dir,
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
