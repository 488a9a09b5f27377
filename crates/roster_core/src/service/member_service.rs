//! Member use-case service.
//!
//! # Responsibility
//! - Provide enrollment and lookup entry points for core callers.
//! - Delegate persistence to the member repository contract.

use crate::model::member::{Member, MemberId, MemberLinkError};
use crate::model::team::Team;
use crate::page::{Page, PageRequest};
use crate::repo::member_repo::{MemberDto, MemberRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error surfaced by member use-cases: repository failures plus
/// relationship-link failures raised before anything hits the store.
#[derive(Debug)]
pub enum MemberServiceError {
    Repo(RepoError),
    Link(MemberLinkError),
}

impl Display for MemberServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Link(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemberServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Link(err) => Some(err),
        }
    }
}

impl From<RepoError> for MemberServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MemberLinkError> for MemberServiceError {
    fn from(value: MemberLinkError) -> Self {
        Self::Link(value)
    }
}

pub type MemberServiceResult<T> = Result<T, MemberServiceError>;

/// Use-case service wrapper for member persistence and queries.
pub struct MemberService<R: MemberRepository> {
    repo: R,
}

impl<R: MemberRepository> MemberService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Enrolls a new member with no team and returns the stored state.
    pub fn enroll(
        &self,
        username: impl Into<String>,
        age: u32,
    ) -> MemberServiceResult<Member> {
        Ok(self.repo.save(Member::with_age(username, age))?)
    }

    /// Enrolls a new member directly into a persisted team.
    ///
    /// # Errors
    /// - `MemberServiceError::Link` when `team` was never saved.
    pub fn enroll_in_team(
        &self,
        username: impl Into<String>,
        age: u32,
        team: &Team,
    ) -> MemberServiceResult<Member> {
        let member = Member::with_team(username, age, team)?;
        Ok(self.repo.save(member)?)
    }

    /// Gets one member by id.
    pub fn member(&self, id: MemberId) -> MemberServiceResult<Option<Member>> {
        Ok(self.repo.find_by_id(id)?)
    }

    /// All enrolled members.
    pub fn roster(&self) -> MemberServiceResult<Vec<Member>> {
        Ok(self.repo.find_all()?)
    }

    /// Removes a member by id.
    pub fn remove(&self, id: MemberId) -> MemberServiceResult<()> {
        Ok(self.repo.delete(id)?)
    }

    /// Every username on the roster.
    pub fn usernames(&self) -> MemberServiceResult<Vec<String>> {
        Ok(self.repo.find_username_list()?)
    }

    /// Flat member/team projection; teamless members are excluded.
    pub fn with_teams(&self) -> MemberServiceResult<Vec<MemberDto>> {
        Ok(self.repo.find_member_dto()?)
    }

    /// One page of members with the exact given age.
    pub fn page_by_age(
        &self,
        age: u32,
        request: &PageRequest,
    ) -> MemberServiceResult<Page<Member>> {
        Ok(self.repo.find_by_age(age, request)?)
    }
}
