//! # tradedesk-client: Backend Collaborators
//!
//! Everything the transaction forms need from the outside world, behind one
//! trait.
//!
//! ## Modules
//! - [`backend`] - The `Backend` trait and response envelope
//! - [`http`] - REST implementation (reqwest)
//! - [`memory`] - In-process implementation for tests and demos
//! - [`config`] - Client settings (TOML + environment)
//! - [`error`] - Client error types
//!
//! ## Usage
//! ```rust,no_run
//! use tradedesk_client::{Backend, ClientConfig, HttpBackend};
//! use tradedesk_core::TransactionKind;
//!
//! # async fn demo() -> tradedesk_client::ClientResult<()> {
//! let config = ClientConfig::load_or_default(None);
//! let backend = HttpBackend::new(&config)?;
//! let catalog = backend.catalog(TransactionKind::Sale).await?;
//! println!("{} items", catalog.items.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;

pub use backend::{ApiResponse, Backend};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
