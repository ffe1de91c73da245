// Domain-layer modules: lead reconciliation and its pure helpers
pub mod reconciler {
    pub use crate::reconciler::*;
}

pub mod notification {
    pub use crate::notification::*;
}

pub mod phone {
    pub use crate::phone::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
