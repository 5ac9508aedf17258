//! Plain data shared by the auth core, the book service and the stores.

pub mod book;
pub mod user;
pub mod validation;

pub use book::{Book, NewBook, UpdateBookInput};
pub use user::{
    NewRefreshSession, NewUser, RefreshSession, SignInInput, SignUpInput, User, normalize_email,
};
pub use validation::ValidationError;
