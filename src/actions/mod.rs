//! File actions on confirmed duplicate groups.
//!
//! Currently only deletion: duplicates go to the system trash by default,
//! or are removed permanently when configured so.

pub mod delete;

pub use delete::{
    delete_duplicates, delete_file, BatchDeleteResult, DeleteConfig, DeleteError,
    DeleteProgressCallback, DeleteResult,
};
