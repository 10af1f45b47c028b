use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Rows per page. The list view never asks for anything else.
pub const PAGE_SIZE: u32 = 10;

pub const RECORDS_PATH: &str = "/api/mahasiswa";
pub const UPLOADS_PATH: &str = "/uploads";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub q: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: 1,
            limit: PAGE_SIZE,
        }
    }
}

impl ListQuery {
    pub fn new(q: impl Into<String>, page: u32) -> Self {
        Self {
            q: q.into(),
            page,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// One page of records plus the number of matches across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    pub rows: Vec<Record>,
    pub total: u64,
}

impl From<ListResponse<Record>> for ListResult {
    fn from(value: ListResponse<Record>) -> Self {
        Self {
            rows: value.data,
            total: value.total,
        }
    }
}

/// JSON body for create and update. A `profile` here names an image already
/// on the server; uploads go through multipart instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBody {
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// `max(1, ceil(total / limit))`.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_never_drops_below_one() {
        assert_eq!(total_pages(0, PAGE_SIZE), 1);
        assert_eq!(total_pages(1, PAGE_SIZE), 1);
        assert_eq!(total_pages(10, PAGE_SIZE), 1);
        assert_eq!(total_pages(11, PAGE_SIZE), 2);
        assert_eq!(total_pages(15, PAGE_SIZE), 2);
        assert_eq!(total_pages(100, PAGE_SIZE), 10);
    }

    #[test]
    fn list_query_serializes_as_query_params() {
        let query = ListQuery::new("Budi", 2);
        let encoded = serde_json::to_value(&query).expect("encode");
        assert_eq!(encoded["q"], "Budi");
        assert_eq!(encoded["page"], 2);
        assert_eq!(encoded["limit"], 10);
    }

    #[test]
    fn record_body_omits_absent_optional_fields() {
        let body = RecordBody {
            npm: "20230001".into(),
            nama: "Budi".into(),
            kelas: "4IA01".into(),
            ..RecordBody::default()
        };
        let encoded = serde_json::to_value(&body).expect("encode");
        assert!(encoded.get("minat").is_none());
        assert!(encoded.get("profile").is_none());
    }
}
