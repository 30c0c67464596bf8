#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! GitHub implementation of [`promptlift_git_provider::RepoHost`] backed by
//! the REST contents API.

mod client;

pub use client::GitHubProvider;
pub use promptlift_github_models as models;
