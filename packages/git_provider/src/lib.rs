#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Repository hosting abstraction for `PromptLift`.
//!
//! [`RepoHost`] is the seam between the flattener and a concrete hosting
//! API such as GitHub.

mod flatten;
mod provider;

pub use flatten::{
    DEFAULT_FLATTEN_RETRY_DELAY, FlattenError, flatten, flatten_repo, flatten_with_retry,
};
pub use promptlift_git_provider_models as models;
pub use provider::{RepoHost, RepoHostError};
