//! Command line and session configuration

use clap::Parser;
use inkwell_config::ToolConfig;

/// Simulated session shape
#[derive(Parser, Debug, Clone)]
#[command(name = "inkwell", about = "Replay a shared pen session across simulated participants")]
pub struct Cli {
    /// Number of participants joined to the bus
    #[arg(long, short = 'n', default_value_t = 3, env = "INKWELL_PARTICIPANTS")]
    pub participants: u32,

    /// Strokes drawn by the holder before the undo and erase phases
    #[arg(long, default_value_t = 4)]
    pub strokes: u32,

    /// Samples recorded per stroke
    #[arg(long, default_value_t = 8)]
    pub samples: u32,

    /// Frame time in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// Disable double-click undo on every pen
    #[arg(long)]
    pub no_double_click: bool,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Tool tunables: environment first, then command line overrides
    pub fn tool_config(&self) -> ToolConfig {
        let mut config = ToolConfig::from_env();
        if self.no_double_click {
            config.use_double_click = false;
        }
        config
    }
}
