//! # State Module
//!
//! Application state shared by the form commands.
//!
//! Each concern gets its own state type so a command declares exactly what
//! it touches: the backend handle, one form session, or the display
//! settings.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      UI shell                                   │   │
//! │  │  one BackendState, one DeskConfig,                              │   │
//! │  │  one SessionState per open purchase / sale / return form        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ BackendState │  │ SessionState │  │   DeskConfig     │              │
//! │  │              │  │              │  │                  │              │
//! │  │ Arc<dyn      │  │  Arc<Mutex<  │  │  currency        │              │
//! │  │   Backend>   │  │  FormSession │  │  print format    │              │
//! │  │              │  │  >>          │  │  default markup  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • BackendState: backends are Send + Sync, shared by Arc               │
//! │  • SessionState: Arc<Mutex<T>>, never held across an .await            │
//! │  • DeskConfig: read-only after initialization                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod config;
mod session;

pub use backend::BackendState;
pub use config::DeskConfig;
pub use session::{FormSession, SessionState};
