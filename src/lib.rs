//! Script-free browser fingerprinting.
//!
//! The probe page is plain HTML and CSS built so that a browser, merely by
//! laying it out, requests a distinguishable set of URLs: media queries,
//! `@supports` blocks and `@font-face` fallbacks decide which backgrounds and
//! fonts get fetched. The server records which of those requests arrive for a
//! visit.

pub mod app_dirs;
pub mod client_hints;
pub mod compile;
pub mod html;
pub mod page;
pub mod report;
pub mod server;
pub mod settings;
pub mod signal;
pub mod storage;
pub mod urls;

pub use compile::{compile, CompiledProbe};
pub use page::{PageAssembler, ProbePage, RenderError};
pub use server::{router, run_server, AppState, ServerError};
pub use settings::ServerSettings;
pub use signal::{
  Breakpoints, Catalog, CatalogError, RangeFeature, ResourceType, SignalKind, SignalSource,
};
pub use storage::{MemoryStorage, SqliteStorage, StorageError, VisitId, VisitReport, VisitStorage};
pub use urls::{PathUrlFactory, UrlFactory};
