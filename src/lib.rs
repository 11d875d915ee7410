pub mod catalog;
pub mod color;
pub mod config;
pub mod forms;
pub mod guard;
pub mod manifest;
pub mod orchestrator;
pub mod pages;
pub mod postal;
pub mod product;
pub mod request;
pub mod selection;
pub mod selector;
pub mod server;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod visualizer;

pub use catalog::{Catalog, CatalogError, CatalogIssue, Resolved};
pub use color::Rgb;
pub use config::Config;
pub use forms::{FilledForm, FormKind, FormRules};
pub use guard::{FieldError, FieldGuard};
pub use manifest::{CatalogManifest, ManifestError};
pub use orchestrator::{SubmissionDesk, SubmitError, SubmitOutcome};
pub use pages::Page;
pub use postal::{Address, AddressFields, LookupError, PostalClient, PostalCode};
pub use product::{Bonus, ColorCategory, LineSummary, ProductLineConfig, ProductLineId, WoodColor};
pub use request::RequestRecord;
pub use selection::{LineChange, Selection, SelectionError, SelectionSummary};
pub use selector::{ColorSelector, SelectorView};
pub use server::{AppState, router};
pub use session::{PageSession, SessionError, SessionRegistry};
pub use storage::{AssetStore, Swatch};
pub use visualizer::Visualizer;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A toast for the visitor. The client decides how to show it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
