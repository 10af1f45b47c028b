//! Client side of the student record manager: the REST gateway, the
//! paginated list controller with debounced search, the awaitable
//! confirmation dialog and the create/edit submit handler.

pub mod config;
pub mod confirm;
pub mod debounce;
pub mod editor;
pub mod gateway;
pub mod list;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_settings, ClientSettings};
pub use confirm::{ConfirmController, ConfirmOptions, Confirmation, DialogInput};
pub use debounce::Debounced;
pub use editor::{RecordEditor, RecordForm, SubmitError, ValidationErrors};
pub use gateway::{GatewayError, HttpRecordGateway, ProfileImage, RecordGateway, RecordPayload};
pub use list::{DeleteOutcome, ListController, ListSnapshot, RefreshOutcome};
pub use notify::{BroadcastNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
