//! dev-vault - Sync development secrets between a cloud secret manager and
//! local files.
//!
//! Only secrets whose names end in `-dev` are ever touched.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── list          # List -dev secrets in the store
//! │   ├── pull          # Store -> local files
//! │   ├── push          # Local files -> new secret versions
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── manifest      # dev-vault.json loading, path resolution
//!     ├── settings      # Region, project, credentials
//!     ├── select        # Target selection from the manifest
//!     ├── store/        # SecretApi trait and implementations
//!     ├── index         # Name+path lookup over a store listing
//!     ├── dotenv        # JSON object <-> .env conversion
//!     ├── atomic        # Crash-safe file writes
//!     └── sync          # List / pull / push orchestration
//! ```

pub mod cli;
pub mod core;
pub mod error;
