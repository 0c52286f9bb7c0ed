pub mod auth;
pub mod client;
pub mod error;
pub mod openai;

pub use auth::{
    build_auth, resolve_key, AuthAugmentation, AuthScheme, ProfileSettings, Protocol, QueryParam,
};
pub use client::{ApiClient, HttpReply};
pub use error::ProviderError;
