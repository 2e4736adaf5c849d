mod accounts;
mod campaigns;
pub mod dto;
mod favorites;
mod news;
pub mod response;
mod router;
mod subscriptions;
mod uploads;
pub mod validation;

pub use router::{AppState, create_router};
