use clap::{Parser, Subcommand};

/// `Parley` - persona-aware dialogue and speech gateway.
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Persona-aware dialogue and speech gateway.", long_about = None)]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Send messages through the full dialogue stack
    Chat {
        /// Session id (a random one is generated when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Single message mode (don't enter interactive mode)
        message: Option<String>,
    },

    /// Show which persona a piece of text resolves to
    Resolve {
        text: String,
    },

    /// Show configuration and storage health
    Status,
}
