//! Prosody mod_rest OAuth example
//!
//! Registers a client with a Prosody server, walks the user through the
//! authorization-code grant and sends one stanza through `mod_rest`.
//!
//! ```bash
//! PROSODY_BASE_URL=https://xmpp.example.com:5281 prosody-rest-oauth \
//!   --scope xmpp \
//!   --payload '{"ping": true, "to": "example.com"}'
//! ```
//!
//! The redirect URI defaults to the out-of-band URN, for which Prosody shows
//! the authorization code after consent. Paste it, or the full redirect URL
//! when using a web redirect URI, at the prompt. The input is not echoed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prosody_rest_oauth::{
    session_config, AuthorizationParams, ProsodyRestSession, TokenRequest, DEFAULT_CLIENT_NAME,
    DEFAULT_CLIENT_URI, OOB_REDIRECT_URI,
};

const DEFAULT_PAYLOAD: &str = r#"{"disco": true, "to": "jabber.org"}"#;

/// OAuth 2 client for Prosody's mod_rest
#[derive(Parser, Debug)]
#[command(name = "prosody-rest-oauth")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server base URL, e.g. https://xmpp.example.com:5281 (prompted when absent)
    #[arg(long, env = "PROSODY_BASE_URL")]
    base_url: Option<String>,

    /// Client name shown on the consent page
    #[arg(long, env = "PROSODY_CLIENT_NAME", default_value = DEFAULT_CLIENT_NAME)]
    client_name: String,

    /// Link to a page describing the client
    #[arg(long, env = "PROSODY_CLIENT_URI", default_value = DEFAULT_CLIENT_URI)]
    client_uri: String,

    /// Redirect URI to register
    #[arg(long, env = "PROSODY_REDIRECT_URI", default_value = OOB_REDIRECT_URI)]
    redirect_uri: String,

    /// Scope to request (repeatable)
    #[arg(long = "scope", env = "PROSODY_SCOPES", value_delimiter = ' ')]
    scopes: Vec<String>,

    /// JSON payload to POST to /rest
    #[arg(long, env = "PROSODY_REST_PAYLOAD", default_value = DEFAULT_PAYLOAD)]
    payload: String,

    /// Do not send a PKCE challenge
    #[arg(long)]
    no_pkce: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "prosody_rest_oauth=debug"
    } else {
        "prosody_rest_oauth=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().context("Failed to write prompt")?;

    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("Unexpected end of input");
    }
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let payload: serde_json::Value =
        serde_json::from_str(&cli.payload).context("Payload is not valid JSON")?;

    let base_url = match cli.base_url {
        Some(url) => url,
        None => prompt("Base URL: ")?,
    };

    let config = session_config()
        .base_url(base_url)
        .client_name(cli.client_name)
        .client_uri(cli.client_uri)
        .redirect_uri(cli.redirect_uri)
        .scopes(cli.scopes.into_iter().filter(|s| !s.is_empty()).collect())
        .use_pkce(!cli.no_pkce)
        .build()
        .context("Invalid configuration")?;

    let session = ProsodyRestSession::connect(config)
        .await
        .context("Failed to discover the server or register a client")?;
    tracing::debug!(client_id = session.client_id(), "Client registered");

    let auth = session
        .authorization_url(AuthorizationParams::default())
        .context("Failed to build the authorization URL")?;
    println!("Open the following URL and authorize the client:");
    println!("{}", auth.url);

    let input = rpassword::prompt_password("Paste Authorization code: ")
        .context("Failed to read the authorization code")?;
    session
        .fetch_token(TokenRequest::from_input(&input))
        .await
        .context("Failed to obtain an access token")?;

    let reply = session
        .xmpp(&payload)
        .await
        .context("mod_rest request failed")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&reply).context("Failed to format the reply")?
    );

    Ok(())
}
