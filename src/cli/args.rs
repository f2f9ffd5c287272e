use crate::domain::config::{DataBits, Parity, PortConfig, StopBits};
use crate::domain::error::DualComResult;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for DualCom
#[derive(Parser, Debug)]
#[command(
    name = "dualcom",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dual serial port debugging workbench",
    long_about = "Drive two serial ports side by side: send text or hex, watch both receive streams, and manage per-port quick-string tables."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports present on this machine
    Ports,
    /// Parse a quick-string import file
    Import(ImportArgs),
    /// Open a port, send one payload and print the replies
    Send(SendArgs),
    /// Print traffic of one or both ports until Ctrl-C
    Monitor(MonitorArgs),
    /// Edit or send stored quick strings
    Macro(MacroArgs),
    /// Settings file management
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

/// Serial framing shared by the commands that open a port
#[derive(ClapArgs, Debug, Clone)]
pub struct PortArgs {
    /// Serial port path
    #[arg(short, long)]
    pub port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    pub baud: u32,

    /// Data bits (5-8)
    #[arg(long, default_value = "8")]
    pub data_bits: u8,

    /// Stop bits (1, 1.5, 2)
    #[arg(long, default_value = "1")]
    pub stop_bits: StopBits,

    /// Parity (none, odd, even)
    #[arg(long, default_value = "none")]
    pub parity: Parity,
}

impl PortArgs {
    pub fn to_port_config(&self) -> DualComResult<PortConfig> {
        let config = PortConfig::new(self.port.clone())
            .with_baud_rate(self.baud)
            .with_data_bits(DataBits::try_from(self.data_bits)?)
            .with_stop_bits(self.stop_bits)
            .with_parity(self.parity);
        config.validate()?;
        Ok(config)
    }
}

/// Codec and display options of a session
#[derive(ClapArgs, Debug, Clone)]
pub struct CodecArgs {
    /// Codec used to encode text payloads
    #[arg(long, default_value = "UTF-8")]
    pub send_encoding: String,

    /// Codec used to decode received bytes
    #[arg(long, default_value = "UTF-8")]
    pub recv_encoding: String,

    /// Render received bytes as hex
    #[arg(long)]
    pub hex_display: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ImportArgs {
    /// File to import
    pub file: String,

    /// Store the result into this session's settings (1 or 2)
    #[arg(short, long)]
    pub session: Option<u8>,
}

#[derive(ClapArgs, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub port: PortArgs,

    #[command(flatten)]
    pub codec: CodecArgs,

    /// Payload to send
    pub data: String,

    /// Treat the payload as hex byte pairs
    #[arg(short = 'x', long)]
    pub hex: bool,

    /// Do not append CRLF to text payloads
    #[arg(long)]
    pub no_newline: bool,

    /// How long to keep printing replies after the last send
    #[arg(short, long, default_value = "500")]
    pub listen_ms: u64,

    /// Resend the payload this many times
    #[arg(long, default_value = "1")]
    pub count: u32,

    /// Delay between repeated sends
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,
}

#[derive(ClapArgs, Debug)]
pub struct MonitorArgs {
    /// Port for session 1 (defaults to the stored setting)
    #[arg(long)]
    pub port1: Option<String>,

    /// Port for session 2 (defaults to the stored setting)
    #[arg(long)]
    pub port2: Option<String>,

    /// Baud rate for ports given on the command line
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Render received bytes as hex
    #[arg(long)]
    pub hex_display: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct MacroArgs {
    /// Session whose table is edited (1 or 2)
    #[arg(short, long, default_value = "1")]
    pub session: u8,

    #[command(subcommand)]
    pub command: MacroCommand,
}

/// Quick-string subcommands. Indexes are 1-based, as shown in `list`.
#[derive(Subcommand, Debug)]
pub enum MacroCommand {
    /// Show quick strings
    List {
        /// Include unused slots
        #[arg(short, long)]
        all: bool,
    },
    /// Set the content of a slot
    Set {
        index: usize,
        content: String,
        /// Content is hex byte pairs
        #[arg(short = 'x', long)]
        hex: bool,
    },
    /// Delete a slot and close the gap
    Delete { index: usize },
    /// Open the session's stored port and send a slot
    Send {
        index: usize,
        /// How long to keep printing replies
        #[arg(short, long, default_value = "500")]
        listen_ms: u64,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current settings
    Show,
    /// Print the settings file in use
    Path,
    /// Create a project settings file
    Init {
        /// Directory to create `.dualcom/` in
        #[arg(short, long)]
        dir: Option<String>,
    },
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_command() {
        let args = Args::try_parse_from([
            "dualcom", "send", "-p", "COM3", "--baud", "9600", "--parity", "even", "-x", "AA 55",
        ])
        .unwrap();
        match args.command {
            Command::Send(send) => {
                assert!(send.hex);
                assert_eq!(send.data, "AA 55");
                let config = send.port.to_port_config().unwrap();
                assert_eq!(config.to_string(), "COM3 @ 9600 8E1");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_data_bits_rejected() {
        let args =
            Args::try_parse_from(["dualcom", "send", "-p", "COM3", "--data-bits", "9", "hi"]).unwrap();
        match args.command {
            Command::Send(send) => assert!(send.port.to_port_config().is_err()),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_macro_command() {
        let args = Args::try_parse_from(["dualcom", "macro", "-s", "2", "set", "3", "AT+GMR"]).unwrap();
        match args.command {
            Command::Macro(m) => {
                assert_eq!(m.session, 2);
                assert!(matches!(m.command, MacroCommand::Set { index: 3, hex: false, .. }));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_output_flag() {
        let args = Args::try_parse_from(["dualcom", "ports", "-o", "json"]).unwrap();
        assert_eq!(args.output, OutputFormat::Json);
    }
}
