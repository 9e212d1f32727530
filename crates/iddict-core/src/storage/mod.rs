//! Store traits.
//!
//! One trait per entity kind. Backends implement the data operations;
//! attribute accessors and mutators come with default implementations that
//! read and write the embedded base record.
//!
//! Every data operation takes a [`CancellationToken`]. A token cancelled
//! before the call fails with [`StoreError::Cancelled`](crate::StoreError::Cancelled);
//! a token cancelled while a stream is being consumed stops the stream
//! without retracting the rows already yielded.
//!
//! # Implementations
//!
//! Implementations are provided in separate crates:
//! - `iddict-sqlite` - embedded SQLite document store

mod application;
mod authorization;
mod scope;
mod token;

pub use application::ApplicationStore;
pub use authorization::{AuthorizationQuery, AuthorizationStore};
pub use scope::ScopeStore;
pub use token::{TokenQuery, TokenStore};

use futures_util::stream::BoxStream;

#[doc(no_inline)]
pub use tokio_util::sync::CancellationToken;

use crate::error::StoreResult;

/// Rows handed to caller-supplied query pipelines.
pub type Rows<T> = std::vec::IntoIter<T>;

/// Lazily produced, finite, single-pass sequence of results.
pub type EntityStream<T> = BoxStream<'static, StoreResult<T>>;
