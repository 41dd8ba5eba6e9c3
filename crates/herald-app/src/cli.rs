use std::path::PathBuf;

use clap::Parser;

/// Herald: realtime presence and notification client.
#[derive(Parser, Debug, Default)]
#[command(name = "herald", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Broker WebSocket URL, overriding `[connection] url`.
    #[arg(long)]
    pub url: Option<String>,

    /// Client id to register with. A visitor id is generated when unset.
    #[arg(long)]
    pub client_id: Option<String>,

    /// Location announced on connect.
    #[arg(long)]
    pub location: Option<String>,

    /// Directory that relative sound assets are resolved against.
    #[arg(long)]
    pub asset_dir: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::parse_from([
            "herald",
            "--client-id",
            "editor-7",
            "--location",
            "admin",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.client_id.as_deref(), Some("editor-7"));
        assert_eq!(args.location.as_deref(), Some("admin"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }
}
