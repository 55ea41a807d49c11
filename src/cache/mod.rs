//! Shared binary cache for pinned terraform versions
//!
//! Layout of the cache directory:
//!
//! | Path | Purpose |
//! |------|---------|
//! | `terraform-<version>` | installed binary, mode 0755 |
//! | `.terraform-init.lock` | advisory lock file, zero-length |
//!
//! The lock covers the whole directory; see [`lock::CacheLock`].

pub mod binary;
pub mod lock;

pub use binary::{BinaryCache, CachedBinary};
pub use lock::CacheLock;
