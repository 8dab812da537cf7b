// Form and browser logic with shared errors/models
pub mod intake_form {
    pub use crate::intake_form::*;
}

pub mod response_browser {
    pub use crate::response_browser::*;
}

pub mod response_detail {
    pub use crate::response_detail::*;
}

pub mod validation {
    pub use crate::validation::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
