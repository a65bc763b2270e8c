pub mod activity;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod notify;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod subscription;
pub mod view;

pub use activity::{ActivityLog, ActivityLogEntry, EntryKind};
pub use config::Config;
pub use dashboard::{Dashboard, PreparedUpload, UploadReceipt};
pub use error::{AuthError, ConfigError, ExportError, StoreError, UploadError};
pub use notify::{Notice, NoticeBuffer, NoticeKind, Notifier, TracingNotifier};
pub use session::{Authenticator, LocalAuthenticator, Session};
pub use snapshot::{Snapshot, SnapshotSummary};
pub use stats::DatasetStats;
pub use store::{InMemorySnapshotStore, PostgresSnapshotStore, SnapshotStore};
pub use subscription::{subscribe_recent, Delivery, RecentSnapshots};
pub use view::{EquipmentPage, EquipmentView};

pub use equiplog_parser as parser;
