//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! data = "data/nifty_daily.csv"
//! initial_capital = 100000.0
//! instrument = "NIFTY"
//!
//! [[strategy]]
//! name = "trend"
//! weight = 0.8
//! signal = { type = "sma_trend", window = 200 }
//!
//! [strategy.engine]
//! risk_per_trade = 0.01
//! atr_multiplier = 2.0
//! transaction_cost = 10.0
//! slippage = 0.5
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::engine::{EngineConfig, EngineError, PositionSizing};
use regimelab_core::strategy::{BuyAndHold, MeanReversion, NoOp, SignalProvider, SmaTrend};

/// Errors from loading or validating a backtest config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config has no [[strategy]] tables")]
    NoStrategies,
    #[error("duplicate strategy name '{0}'")]
    DuplicateStrategy(String),
    #[error("strategy '{name}': weight {weight} must be in (0, 1]")]
    InvalidWeight { name: String, weight: f64 },
    #[error("strategy weights sum to {0}, which exceeds 1")]
    OverAllocated(f64),
    #[error("strategy '{name}': {reason}")]
    InvalidSignal { name: String, reason: String },
    #[error("strategy '{name}': {source}")]
    InvalidEngine {
        name: String,
        #[source]
        source: EngineError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// CSV bar file. May be overridden on the command line.
    #[serde(default)]
    pub data: Option<PathBuf>,
    pub initial_capital: f64,
    #[serde(default = "default_instrument")]
    pub instrument: String,
}

fn default_instrument() -> String {
    "INDEX".to_string()
}

/// One `[[strategy]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub signal: SignalConfig,
    /// Share of `initial_capital`. Unweighted strategies split what is left.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub engine: EngineParams,
}

/// Signal provider selection (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalConfig {
    SmaTrend {
        #[serde(default = "default_trend_window")]
        window: usize,
    },
    MeanReversion {
        #[serde(default = "default_mean_window")]
        mean_window: usize,
        #[serde(default = "default_regime_window")]
        regime_window: usize,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default = "default_entry_atr")]
        entry_atr: f64,
    },
    BuyAndHold,
    NoOp,
}

fn default_trend_window() -> usize {
    200
}
fn default_mean_window() -> usize {
    20
}
fn default_regime_window() -> usize {
    200
}
fn default_atr_period() -> usize {
    14
}
fn default_entry_atr() -> f64 {
    1.0
}

impl SignalConfig {
    fn validate(&self) -> Result<(), String> {
        match *self {
            SignalConfig::SmaTrend { window } if window == 0 => {
                Err("sma_trend window must be >= 1".into())
            }
            SignalConfig::MeanReversion {
                mean_window,
                regime_window,
                atr_period,
                entry_atr,
            } => {
                if mean_window == 0 || regime_window == 0 || atr_period == 0 {
                    return Err("mean_reversion windows must be >= 1".into());
                }
                if !(entry_atr.is_finite() && entry_atr >= 0.0) {
                    return Err(format!("mean_reversion entry_atr {entry_atr} must be >= 0"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Build the signal provider this config describes.
    pub fn build(&self) -> Box<dyn SignalProvider> {
        match *self {
            SignalConfig::SmaTrend { window } => Box::new(SmaTrend::new(window)),
            SignalConfig::MeanReversion {
                mean_window,
                regime_window,
                atr_period,
                entry_atr,
            } => Box::new(MeanReversion::new(
                mean_window,
                regime_window,
                atr_period,
                entry_atr,
            )),
            SignalConfig::BuyAndHold => Box::new(BuyAndHold),
            SignalConfig::NoOp => Box::new(NoOp),
        }
    }
}

/// Engine parameters for one strategy; capital comes from the weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub risk_per_trade: f64,
    pub max_drawdown: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub transaction_cost: f64,
    pub slippage: f64,
    pub sizing: PositionSizing,
    pub stop_loss: bool,
    pub kill_switch: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        let base = EngineConfig::new(1.0);
        Self {
            risk_per_trade: base.risk_per_trade,
            max_drawdown: base.max_drawdown,
            atr_period: base.atr_period,
            atr_multiplier: base.atr_multiplier,
            transaction_cost: base.transaction_cost,
            slippage: base.slippage,
            sizing: base.sizing,
            stop_loss: base.stop_loss,
            kill_switch: base.kill_switch,
        }
    }
}

impl EngineParams {
    pub fn to_engine_config(&self, initial_capital: f64) -> EngineConfig {
        EngineConfig {
            initial_capital,
            risk_per_trade: self.risk_per_trade,
            max_drawdown: self.max_drawdown,
            atr_period: self.atr_period,
            atr_multiplier: self.atr_multiplier,
            transaction_cost: self.transaction_cost,
            slippage: self.slippage,
            sizing: self.sizing,
            stop_loss: self.stop_loss,
            kill_switch: self.kill_switch,
        }
    }
}

/// A fully resolved strategy, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySpec {
    pub name: String,
    pub signal: SignalConfig,
    pub engine: EngineConfig,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, signal: SignalConfig, engine: EngineConfig) -> Self {
        Self {
            name: name.into(),
            signal,
            engine,
        }
    }
}

impl BacktestConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check strategy names, weights and every resolved engine config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.specs().map(|_| ())
    }

    /// Resolve each `[[strategy]]` into a runnable spec with its capital share.
    pub fn specs(&self) -> Result<Vec<StrategySpec>, ConfigError> {
        if self.strategy.is_empty() {
            return Err(ConfigError::NoStrategies);
        }

        let mut names = BTreeSet::new();
        let mut explicit = 0.0;
        let mut unweighted = 0usize;
        for s in &self.strategy {
            if !names.insert(s.name.as_str()) {
                return Err(ConfigError::DuplicateStrategy(s.name.clone()));
            }
            s.signal.validate().map_err(|reason| ConfigError::InvalidSignal {
                name: s.name.clone(),
                reason,
            })?;
            match s.weight {
                Some(w) if !(w > 0.0 && w <= 1.0) => {
                    return Err(ConfigError::InvalidWeight {
                        name: s.name.clone(),
                        weight: w,
                    });
                }
                Some(w) => explicit += w,
                None => unweighted += 1,
            }
        }
        if explicit > 1.0 + 1e-9 {
            return Err(ConfigError::OverAllocated(explicit));
        }

        let remainder = if unweighted > 0 {
            (1.0 - explicit) / unweighted as f64
        } else {
            0.0
        };

        self.strategy
            .iter()
            .map(|s| {
                let weight = s.weight.unwrap_or(remainder);
                let engine = s.engine.to_engine_config(self.backtest.initial_capital * weight);
                engine.validate().map_err(|source| ConfigError::InvalidEngine {
                    name: s.name.clone(),
                    source,
                })?;
                Ok(StrategySpec::new(s.name.clone(), s.signal.clone(), engine))
            })
            .collect()
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
