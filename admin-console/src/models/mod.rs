pub mod auth;
pub mod listing;
pub mod user;

pub use auth::{LoginRequest, RefreshRequest, RefreshResponse, TokenPair};
pub use listing::{Column, DetailView, Listing, TableRow, TableView};
pub use user::{ConsoleSession, UserProfile};
