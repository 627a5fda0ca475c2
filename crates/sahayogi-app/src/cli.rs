use clap::Parser;

/// Sahayogi — terminal client for the Socratic AI tutor.
#[derive(Parser, Debug)]
#[command(name = "sahayogi", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Tracing filter override (e.g. debug, sahayogi_tutor=debug).
    #[arg(long)]
    pub log_filter: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
