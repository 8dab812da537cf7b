//! Data access layer.

pub mod store {
    pub use crate::store::*;
}

pub mod pg_store {
    pub use crate::pg_store::*;
}

pub mod db {
    pub use crate::db::*;
}
