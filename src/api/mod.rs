// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod intake_handler {
    pub use crate::intake_handler::*;
}

pub mod routes {
    pub use crate::routes::*;
}
