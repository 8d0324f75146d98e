pub mod config;
pub mod correlate;
pub mod dtd;
pub mod error;
pub mod href;
pub mod middleware;
pub mod model;
pub mod naming;
pub mod ontology;
pub mod platform;
pub mod protocols;
pub mod registry;
pub mod thing;

pub use dtd::{DtdManager, TwinSettings, WotDtdManager};
pub use error::DtdError;
pub use thing::Thing;
