pub mod card;
pub mod session;
