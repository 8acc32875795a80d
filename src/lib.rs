//! # verbena-core
//!
//! Transactional core of the Verbena festival-experience marketplace:
//! the booking match state machine, the prepaid wallet ledger that funds
//! it, and the dispute/trust subsystem that can reverse or penalize those
//! transactions after the fact. Listing CRUD, search, auth, and all
//! presentation concerns live in sibling services — this crate owns the
//! money and the booking status, nothing else.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── MatchService ── WalletService ── DisputeService (service/)
//!     │        │               │                │
//!     ├── MatchRegistry   LedgerStore    DisputeRegistry + UserRegistry
//!     │        (domain/)     (ledger/)          (domain/)
//!     │
//!     ├── EventBus ──► notifier (fire-and-forget)
//!     │           └──► persistence writer ──► PostgreSQL mirrors
//!     │
//!     └── ExperienceCatalog ◄── listing-service push (internal/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod service;
