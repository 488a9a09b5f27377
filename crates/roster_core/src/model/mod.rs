//! Domain model for roster members and teams.
//!
//! # Responsibility
//! - Define the two persisted record shapes and their relationship contract.
//! - Keep relationship writes on the owning (foreign-key) side only.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned integer key.
//! - The member -> team link is owned by `Member::team_id`; the team side is
//!   derived by query and never stored.

pub mod member;
pub mod team;
