//! In-memory collaborators for controller tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{Record, RecordId},
    protocol::{ListQuery, ListResult},
};
use tokio::sync::oneshot;

use crate::{
    gateway::{GatewayError, RecordGateway, RecordPayload},
    notify::{Notice, NoticeLevel, Notifier},
};

pub(crate) fn record(id: i64, nama: &str) -> Record {
    Record {
        id: RecordId(id),
        npm: format!("{:08}", 20230000 + id),
        nama: nama.to_string(),
        kelas: "4IA01".to_string(),
        minat: None,
        profile: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    records: Mutex<Vec<Record>>,
    list_calls: Mutex<Vec<ListQuery>>,
    held_lists: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    created: Mutex<Vec<RecordPayload>>,
    updated: Mutex<Vec<(RecordId, RecordPayload)>>,
    deleted: Mutex<Vec<RecordId>>,
    fail_lists: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeGateway {
    pub(crate) fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// `count` records named "Budi 1".."Budi count", ids 1..=count.
    pub(crate) fn seeded(count: i64) -> Self {
        Self::with_records(
            (1..=count)
                .map(|id| record(id, &format!("Budi {id}")))
                .collect(),
        )
    }

    pub(crate) fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub(crate) fn created(&self) -> Vec<RecordPayload> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn updated(&self) -> Vec<(RecordId, RecordPayload)> {
        self.updated.lock().unwrap().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<RecordId> {
        self.deleted.lock().unwrap().clone()
    }

    pub(crate) fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds the `call`-th list request (0-based) until the sender fires.
    pub(crate) fn hold_list_call(&self, call: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_lists.lock().unwrap().insert(call, rx);
        tx
    }

    fn page_of(&self, query: &ListQuery) -> ListResult {
        let records = self.records.lock().unwrap();
        let needle = query.q.trim().to_lowercase();
        let mut matching: Vec<Record> = records
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || [
                        r.npm.as_str(),
                        r.nama.as_str(),
                        r.kelas.as_str(),
                        r.minat.as_deref().unwrap_or_default(),
                    ]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as u64;
        let limit = query.limit.max(1) as usize;
        let offset = (query.page.max(1) as usize - 1) * limit;
        ListResult {
            rows: matching.into_iter().skip(offset).take(limit).collect(),
            total,
        }
    }

    fn write_failure(&self) -> Option<GatewayError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| GatewayError::Server {
                status: 500,
                message: "database is locked".to_string(),
            })
    }
}

#[async_trait]
impl RecordGateway for FakeGateway {
    async fn list(&self, query: &ListQuery) -> Result<ListResult, GatewayError> {
        let held = {
            let mut calls = self.list_calls.lock().unwrap();
            calls.push(query.clone());
            let call = calls.len() - 1;
            self.held_lists.lock().unwrap().remove(&call)
        };
        if let Some(release) = held {
            let _ = release.await;
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(GatewayError::Server {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.page_of(query))
    }

    async fn get(&self, id: RecordId) -> Result<Record, GatewayError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(GatewayError::NotFound(id))
    }

    async fn create(&self, payload: RecordPayload) -> Result<Record, GatewayError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        self.created.lock().unwrap().push(payload.clone());

        let mut records = self.records.lock().unwrap();
        let id = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        let record = Record {
            id: RecordId(id),
            npm: payload.fields.npm,
            nama: payload.fields.nama,
            kelas: payload.fields.kelas,
            minat: payload.fields.minat,
            profile: payload.image.map(|image| format!("upload_{id}_{}", image.filename)),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, payload: RecordPayload) -> Result<Record, GatewayError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        self.updated.lock().unwrap().push((id, payload.clone()));

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(GatewayError::NotFound(id))?;
        record.npm = payload.fields.npm;
        record.nama = payload.fields.nama;
        record.kelas = payload.fields.kelas;
        if payload.fields.minat.is_some() {
            record.minat = payload.fields.minat;
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: RecordId) -> Result<(), GatewayError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(GatewayError::NotFound(id));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
