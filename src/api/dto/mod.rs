//! Data Transfer Objects for REST request/response serialization.
//!
//! Money amounts are serialized as decimal strings to keep exact cents
//! on the wire.

pub mod common_dto;
pub mod dispute_dto;
pub mod match_dto;
pub mod wallet_dto;

pub use common_dto::*;
pub use dispute_dto::*;
pub use match_dto::*;
pub use wallet_dto::*;
