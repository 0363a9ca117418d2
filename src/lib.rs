//! Authenticated scraper for the ming800 school management server.
//!
//! The server renders every record as HTML tables; [`scraper`] turns those
//! tables into typed records, [`session`] holds the authenticated connection
//! and [`walker`] traverses the class and student listings.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod scraper;
pub mod session;
pub mod utils;
pub mod walker;

pub use config::Config;
pub use error::{AppError, Result};
pub use model::{Category, Class, ClassEvent, ClassSummary, Student};
pub use session::{Session, SessionConfig};
pub use walker::{WalkHandler, WalkOptions, WalkSummary, Walker};
