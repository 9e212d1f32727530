//! Entity records persisted by the stores.

mod application;
mod authorization;
mod scope;
mod token;

pub use application::Application;
pub use authorization::Authorization;
pub use scope::Scope;
pub use token::Token;
