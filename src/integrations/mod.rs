//! Hosted backend integrations.

pub mod supabase_client {
    pub use crate::supabase_client::*;
}
