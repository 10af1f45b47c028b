//! Create/edit form submission.

use std::{fmt, sync::Arc};

use shared::{
    domain::{Record, RecordId},
    protocol::RecordBody,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    gateway::{GatewayError, ProfileImage, RecordGateway, RecordPayload},
    notify::{Notice, Notifier},
};

pub const NPM_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Npm,
    Nama,
    Kelas,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Nama => "nama",
            Self::Kelas => "kelas",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .field.label(), .message)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every field problem found in one pass, shown next to the fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|err| err.field == field)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordForm {
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    pub minat: String,
    /// Image already stored on the server; shown as preview only.
    pub profile: Option<String>,
    /// Image picked in this submission.
    pub image: Option<ProfileImage>,
}

impl RecordForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            npm: record.npm.clone(),
            nama: record.nama.clone(),
            kelas: record.kelas.clone(),
            minat: record.minat.clone().unwrap_or_default(),
            profile: record.profile.clone(),
            image: None,
        }
    }

    /// Checks the fields and builds the request payload. Nothing is sent
    /// when this fails.
    pub fn validate(&self) -> Result<RecordPayload, ValidationErrors> {
        let npm = self.npm.trim();
        let nama = self.nama.trim();
        let kelas = self.kelas.trim();

        let mut errors = Vec::new();
        if npm.chars().count() != NPM_LEN || !npm.chars().all(|c| c.is_ascii_digit()) {
            errors.push(FieldError {
                field: Field::Npm,
                message: "NPM 8 digit",
            });
        }
        if nama.is_empty() {
            errors.push(FieldError {
                field: Field::Nama,
                message: "Nama wajib",
            });
        }
        if kelas.is_empty() {
            errors.push(FieldError {
                field: Field::Kelas,
                message: "Kelas wajib",
            });
        }
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let minat = self.minat.trim();
        let payload = RecordPayload::new(RecordBody {
            npm: npm.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
            minat: (!minat.is_empty()).then(|| minat.to_string()),
            profile: None,
        });
        Ok(match self.image.clone() {
            Some(image) => payload.with_image(image),
            None => payload,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(RecordId),
}

pub struct RecordEditor {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
    mode: EditorMode,
}

impl RecordEditor {
    pub fn create(gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            mode: EditorMode::Create,
        }
    }

    /// Opens an existing record for editing, prefilled from the server.
    pub async fn edit(
        gateway: Arc<dyn RecordGateway>,
        notifier: Arc<dyn Notifier>,
        id: RecordId,
    ) -> Result<(Self, RecordForm), GatewayError> {
        let record = match gateway.get(id).await {
            Ok(record) => record,
            Err(err) => {
                notifier.notify(Notice::error(format!("Gagal memuat data: {err}")));
                return Err(err);
            }
        };
        let form = RecordForm::from_record(&record);
        Ok((
            Self {
                gateway,
                notifier,
                mode: EditorMode::Edit(id),
            },
            form,
        ))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Validates, then creates or updates. A gateway failure produces one
    /// error notice and leaves the form with the caller for another attempt.
    pub async fn submit(&self, form: &RecordForm) -> Result<Record, SubmitError> {
        let payload = form.validate().inspect_err(|errors| {
            debug!(%errors, "editor: submission blocked by validation");
        })?;

        let result = match self.mode {
            EditorMode::Create => self.gateway.create(payload).await,
            EditorMode::Edit(id) => self.gateway.update(id, payload).await,
        };

        match result {
            Ok(record) => {
                info!(id = record.id.0, mode = %self.mode, "editor: record saved");
                let message = match self.mode {
                    EditorMode::Create => "Berhasil ditambahkan",
                    EditorMode::Edit(_) => "Berhasil diperbarui",
                };
                self.notifier.notify(Notice::success(message));
                Ok(record)
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error(format!("Gagal menyimpan: {err}")));
                Err(err.into())
            }
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Edit(id) => write!(f, "edit {id}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
