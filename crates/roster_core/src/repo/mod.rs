//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for members and teams.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository constructors validate schema and query registry up front;
//!   a misconfigured query fails at construction, never on first call.
//! - Repository APIs return semantic errors (`NotFound`, `NonUniqueResult`,
//!   `Constraint`) in addition to DB transport errors.

pub mod member_repo;
pub mod query;
pub mod team_repo;
