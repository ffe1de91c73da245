//! External service integrations.

pub mod crm_client {
    pub use crate::crm_client::*;
}

pub mod crm_models {
    pub use crate::crm_models::*;
}

pub mod mailer {
    pub use crate::mailer::*;
}
