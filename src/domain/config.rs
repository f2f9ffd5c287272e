use crate::domain::error::{DualComError, DualComResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Stop bits, stored as the operator-facing label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1.5")]
    OnePointFive,
    #[serde(rename = "2")]
    Two,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl TryFrom<u8> for DataBits {
    type Error = DualComError;

    fn try_from(value: u8) -> DualComResult<Self> {
        match value {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(DualComError::config(format!(
                "Invalid data bits: {} (expected 5, 6, 7 or 8)",
                other
            ))),
        }
    }
}

impl From<DataBits> for u8 {
    fn from(bits: DataBits) -> u8 {
        match bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl StopBits {
    pub fn label(&self) -> &'static str {
        match self {
            StopBits::One => "1",
            StopBits::OnePointFive => "1.5",
            StopBits::Two => "2",
        }
    }
}

impl FromStr for StopBits {
    type Err = DualComError;

    fn from_str(s: &str) -> DualComResult<Self> {
        match s.trim() {
            "1" => Ok(StopBits::One),
            "1.5" => Ok(StopBits::OnePointFive),
            "2" => Ok(StopBits::Two),
            other => Err(DualComError::config(format!(
                "Invalid stop bits: '{}' (expected 1, 1.5 or 2)",
                other
            ))),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Parity {
    pub fn label(&self) -> &'static str {
        match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
        }
    }
}

impl FromStr for Parity {
    type Err = DualComError;

    fn from_str(s: &str) -> DualComResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            other => Err(DualComError::config(format!(
                "Invalid parity: '{}' (expected none, odd or even)",
                other
            ))),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Framing parameters of one serial link.
///
/// Immutable for the lifetime of an open session; a change requires
/// disconnect followed by connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl PortConfig {
    /// Port with the default 115200 8N1 framing
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: default_parity(),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Reject framing that no transport could honour
    pub fn validate(&self) -> DualComResult<()> {
        if self.port.trim().is_empty() {
            return Err(DualComError::config("No port selected"));
        }
        if self.baud_rate == 0 {
            return Err(DualComError::config("Baud rate must be greater than zero"));
        }
        Ok(())
    }
}

impl fmt::Display for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        write!(
            f,
            "{} @ {} {}{}{}",
            self.port, self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}

/// One quick-string slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSlot {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "hex")]
    pub is_hex: bool,
}

impl MacroSlot {
    pub fn new(label: impl Into<String>, content: impl Into<String>, is_hex: bool) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            is_hex,
        }
    }

    /// Blank slot carrying only a label
    pub fn blank(label: impl Into<String>) -> Self {
        Self::new(label, "", false)
    }

    /// A slot with nothing but whitespace is unused and hidden from presentation
    pub fn is_unused(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Application-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Entries kept per send-history ring
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Quick-string slots per session
    #[serde(default = "default_macro_capacity")]
    pub macro_capacity: usize,
}

/// Persisted state of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: DataBits,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: StopBits,
    #[serde(default = "default_parity")]
    pub parity: Parity,
    #[serde(default = "default_codec_name")]
    pub send_encoding: String,
    #[serde(default = "default_codec_name")]
    pub recv_encoding: String,
    #[serde(default = "default_auto_newline")]
    pub auto_newline: bool,
    #[serde(default)]
    pub send_history_text: Vec<String>,
    #[serde(default)]
    pub send_history_hex: Vec<String>,
    #[serde(default)]
    pub quick_strings: Vec<MacroSlot>,
}

impl SessionSettings {
    /// Framing part of the settings
    pub fn port_config(&self) -> PortConfig {
        PortConfig {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity,
        }
    }

    pub fn set_port_config(&mut self, config: &PortConfig) {
        self.port = config.port.clone();
        self.baud_rate = config.baud_rate;
        self.data_bits = config.data_bits;
        self.stop_bits = config.stop_bits;
        self.parity = config.parity;
    }
}

/// Settings for both sessions plus global options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkbenchSettings {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub session1: SessionSettings,
    #[serde(default)]
    pub session2: SessionSettings,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    crate::core::history::DEFAULT_HISTORY_CAPACITY
}

fn default_macro_capacity() -> usize {
    crate::core::macros::DEFAULT_MACRO_CAPACITY
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_data_bits() -> DataBits {
    DataBits::Eight
}

fn default_stop_bits() -> StopBits {
    StopBits::One
}

fn default_parity() -> Parity {
    Parity::None
}

fn default_codec_name() -> String {
    "UTF-8".to_string()
}

fn default_auto_newline() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            history_limit: default_history_limit(),
            macro_capacity: default_macro_capacity(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: default_parity(),
            send_encoding: default_codec_name(),
            recv_encoding: default_codec_name(),
            auto_newline: default_auto_newline(),
            send_history_text: Vec::new(),
            send_history_hex: Vec::new(),
            quick_strings: Vec::new(),
        }
    }
}
