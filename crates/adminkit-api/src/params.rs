// ── Typed request/response shapes for the nine provider verbs ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FilterPayload, Identifier, PaginationPayload, Record, SortPayload};

/// Point in time until which a cached result may be served without refetching.
pub type ValidUntil = DateTime<Utc>;

// ── Reads ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetListParams {
    pub pagination: PaginationPayload,
    pub sort: SortPayload,
    #[serde(default)]
    pub filter: FilterPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetListResult {
    pub data: Vec<Record>,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOneParams {
    pub id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOneResult {
    pub data: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyParams {
    pub ids: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManyResult {
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyReferenceParams {
    pub target: String,
    pub id: Identifier,
    pub pagination: PaginationPayload,
    pub sort: SortPayload,
    #[serde(default)]
    pub filter: FilterPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManyReferenceResult {
    pub data: Vec<Record>,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

// ── Writes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub id: Identifier,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_data: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub data: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManyParams {
    pub ids: Vec<Identifier>,
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub data: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteParams {
    pub id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_data: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub data: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteManyParams {
    pub ids: Vec<Identifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteManyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Identifier>>,
}
