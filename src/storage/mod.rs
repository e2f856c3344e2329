//! Remote object storage
//!
//! Used twice by the pipeline: as the authenticated fallback when an input URL cannot be
//! fetched directly, and to publish rendered outputs.

mod supabase;
mod traits;

pub use supabase::{SupabaseStorage, derive_object_path};
pub use traits::ObjectStore;
