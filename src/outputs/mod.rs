//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the collected announcements of one run to a JSON file
//!
//! # Output Structure
//!
//! One aggregate file per date range; re-running the same range overwrites it.
//!
//! ```text
//! folder/
//! ├── okx_announcements_2024-01-01_2024-01-31.json
//! └── okx_announcements_2024-02-01_2024-02-29.json
//! ```

pub mod json;
