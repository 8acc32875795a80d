//! Persistence layer: PostgreSQL event log and row mirrors.
//!
//! The in-memory registries are authoritative; this layer mirrors them
//! write-behind for audit queries and restart recovery. The writer task
//! consumes the event bus and lands each mutation in the tables below.
//!
//! Expected schema (managed by `sqlx migrate` in deployment):
//!
//! ```sql
//! CREATE TABLE events (
//!     id          BIGSERIAL PRIMARY KEY,
//!     match_id    UUID,
//!     event_type  TEXT NOT NULL,
//!     payload     JSONB NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//!
//! CREATE TABLE matches (
//!     id            UUID PRIMARY KEY,
//!     experience_id UUID NOT NULL,
//!     host_id       UUID NOT NULL,
//!     requester_id  UUID NOT NULL,
//!     status        TEXT NOT NULL,
//!     participants  INT NOT NULL,
//!     total_price   NUMERIC,
//!     start_date    TIMESTAMPTZ,
//!     fee_charged   NUMERIC,
//!     refund        JSONB,
//!     dispute_id    UUID,
//!     reject_reason TEXT,
//!     created_at    TIMESTAMPTZ NOT NULL,
//!     updated_at    TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE wallet_transactions (
//!     id            UUID PRIMARY KEY,
//!     user_id       UUID NOT NULL,
//!     kind          TEXT NOT NULL,
//!     amount        NUMERIC NOT NULL,
//!     related_match UUID,
//!     status        TEXT NOT NULL,
//!     created_at    TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE disputes (
//!     id           UUID PRIMARY KEY,
//!     match_id     UUID NOT NULL,
//!     opener_id    UUID NOT NULL,
//!     reason       TEXT NOT NULL,
//!     description  TEXT NOT NULL,
//!     status       TEXT NOT NULL,
//!     resolution   JSONB,
//!     admin_action JSONB,
//!     resolved_by  UUID,
//!     admin_notes  TEXT,
//!     created_at   TIMESTAMPTZ NOT NULL,
//!     resolved_at  TIMESTAMPTZ
//! );
//!
//! -- One non-terminal dispute per match, enforced at the durable layer
//! -- as well as in the registry.
//! CREATE UNIQUE INDEX disputes_one_active_per_match
//!     ON disputes (match_id)
//!     WHERE status IN ('open', 'under_review');
//! ```

pub mod models;
pub mod postgres;
pub mod writer;

pub use postgres::PostgresPersistence;
pub use writer::WriterContext;
