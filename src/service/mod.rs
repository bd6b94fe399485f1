//! Service registry framework (`§4.5`): the ordered list of services and
//! their fixed lifecycle callback contract. Grounded on the project's
//! `async_trait`-based handler traits, generalised from per-connection
//! command handlers to per-recovery lifecycle callbacks.

pub mod admin;
pub mod lum;
pub mod nbd;
pub mod rdev;
pub mod registry;
pub mod vrt;

pub use registry::{Service, ServiceRegistry};
