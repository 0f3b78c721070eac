//! # TradeDesk App Library
//!
//! The orchestration layer a UI shell embeds to run purchase, sale and
//! return forms. Business rules live in `tradedesk-core`; every remote call
//! goes through `tradedesk-client`. This crate holds the sessions in between.
//!
//! ## Module Organization
//! ```text
//! tradedesk_app/
//! ├── lib.rs          ◄─── You are here (startup & logging)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── backend.rs  ◄─── Shared backend handle
//! │   ├── session.rs  ◄─── One open form (Arc<Mutex<FormSession>>)
//! │   └── config.rs   ◄─── Display configuration
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── form.rs     ◄─── Open, edit, select, load commands
//! │   └── save.rs     ◄─── Save flow commands
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use tradedesk_app::commands::{dispatch, open_form, save, SaveOutcome};
//! use tradedesk_core::{FormAction, FormMode, TransactionKind};
//!
//! # async fn demo() -> Result<(), tradedesk_app::error::ApiError> {
//! let (backend, config) = tradedesk_app::start()?;
//! let session = open_form(&backend, &config, TransactionKind::Sale, FormMode::Create).await?;
//! dispatch(&session, FormAction::AddRow)?;
//! match save(&backend, &session).await? {
//!     SaveOutcome::Saved { receipt, .. } => println!("saved {}", receipt.invoice_number),
//!     other => println!("needs confirmation: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod error;
pub mod state;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tradedesk_client::ClientConfig;

use error::ApiError;
use state::{BackendState, DeskConfig};

/// Loads configuration and connects to the backend.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Desk Startup                                      │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Client Config ───────────────────────────────────────────────► │
/// │     • client.toml from the platform config directory                    │
/// │     • TRADEDESK_* environment overrides                                 │
/// │                                                                         │
/// │  3. Connect ──────────────────────────────────────────────────────────► │
/// │     • HTTP backend with bearer token and timeout                        │
/// │                                                                         │
/// │  4. Display Config ───────────────────────────────────────────────────► │
/// │     • currency, print format, default markup                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn start() -> Result<(BackendState, DeskConfig), ApiError> {
    init_tracing();

    info!("Starting TradeDesk");

    let client_config = ClientConfig::load_or_default(None);
    let backend = BackendState::connect(&client_config)?;
    info!(
        base_url = %client_config.server.base_url,
        history = backend.history_enabled(),
        "Backend configured"
    );

    let config = DeskConfig::from_env();
    Ok((backend, config))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tradedesk=trace` - Show trace for tradedesk crates only
/// - Default: INFO, DEBUG for tradedesk crates
///
/// A second call (e.g. a shell that installed its own subscriber) keeps
/// the existing subscriber and logs that at debug level through it.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tradedesk=debug,reqwest=warn"));

    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        debug!(error = %e, "Tracing subscriber already installed, keeping it");
    }
}
