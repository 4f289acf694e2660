pub mod projection;
pub mod service;

pub use projection::{project, project_environment};
pub use service::{with_tx_returning, Service, TxBody};
