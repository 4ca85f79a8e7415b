use std::net::{IpAddr, SocketAddr};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use goatmusic::{
    config::{self, Settings, TokenPolicy},
    error, server,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the relay server
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Host to bind to (overrides SERVER_ADDRESS)
    #[clap(long)]
    pub host: Option<IpAddr>,

    /// Port to bind to (overrides SERVER_ADDRESS)
    #[clap(long)]
    pub port: Option<u16>,

    /// Token expiry handling: passthrough, reactive or proactive
    #[clap(long)]
    pub policy: Option<TokenPolicy>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => serve(opt).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

async fn serve(opt: ServeOptions) {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    let mut addr: SocketAddr = match settings.server_address.parse() {
        Ok(addr) => addr,
        Err(e) => error!("Failed to parse server address: {}", e),
    };
    if let Some(host) = opt.host {
        addr.set_ip(host);
    }
    if let Some(port) = opt.port {
        addr.set_port(port);
    }
    settings.server_address = addr.to_string();

    if let Some(policy) = opt.policy {
        settings.token_policy = policy;
    }

    let state = match server::AppState::in_memory(settings) {
        Ok(state) => state,
        Err(e) => error!("Failed to build HTTP client: {}", e),
    };

    if let Err(e) = server::start_api_server(state).await {
        error!("Server stopped: {}", e);
    }
}
