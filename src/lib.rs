//! # Volunteers (volunteer management API)
//!
//! `volunteers` serves the backend of a volunteer management site: organizers
//! publish volunteer opportunities ("posts") and volunteers apply to them
//! ("applications"). Both live in MongoDB collections.
//!
//! ## Sessions
//!
//! `POST /jwt` signs the submitted identity (at least an `email`) into an
//! HS256 JWT and stores it in the `token` `HttpOnly` cookie. Protected routes
//! resolve that cookie into a [`api::handlers::auth::Principal`]; a missing or
//! invalid cookie ends the request with `401`. Email-scoped listings also
//! require the requested email to match the session email (`403` otherwise).
//!
//! ## Volunteer slots
//!
//! Every post carries a `numberOfVolunteers` counter. Submitting an application
//! reserves one slot with a single conditional decrement, so a post never goes
//! below zero; a full post rejects the application with `409`.

pub mod api;
pub mod cli;
pub mod repository;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
