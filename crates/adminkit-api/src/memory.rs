// ── In-memory data provider ──
//
// A complete `DataProvider` over per-resource ordered maps. Used by the
// CLI (persisted to a JSON file between runs) and by tests that need a
// real provider behind the core runtime.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::params::{
    CreateParams, CreateResult, DeleteManyParams, DeleteManyResult, DeleteParams, DeleteResult,
    GetListParams, GetListResult, GetManyParams, GetManyReferenceParams, GetManyReferenceResult,
    GetManyResult, GetOneParams, GetOneResult, UpdateManyParams, UpdateManyResult, UpdateParams,
    UpdateResult,
};
use crate::provider::DataProvider;
use crate::types::{FilterPayload, Identifier, PaginationPayload, Record, SortOrder, SortPayload};

type Table = IndexMap<Identifier, Record>;

/// In-memory provider keyed by resource name, preserving insertion order.
#[derive(Default)]
pub struct MemoryDataProvider {
    tables: DashMap<String, Table>,
}

impl MemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `{ "<resource>": [ {"id": .., ...}, ... ], ... }`.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        let Value::Object(resources) = value else {
            return Err(Error::Deserialization {
                message: "expected an object mapping resource names to record arrays".into(),
            });
        };

        let provider = Self::new();
        for (resource, records) in resources {
            let Value::Array(items) = records else {
                return Err(Error::Deserialization {
                    message: format!("resource '{resource}' must be an array of records"),
                });
            };
            let mut table = Table::with_capacity(items.len());
            for item in items {
                let record = Record::from_value(item).ok_or_else(|| Error::Deserialization {
                    message: format!("every '{resource}' record needs an integer or string id"),
                })?;
                table.insert(record.id.clone(), record);
            }
            provider.tables.insert(resource, table);
        }
        Ok(provider)
    }

    /// Dump every resource back into the `from_json` shape, resources sorted by name.
    pub fn to_json(&self) -> Value {
        let mut names = self.resources();
        names.sort();
        let mut out = Map::with_capacity(names.len());
        for name in names {
            if let Some(table) = self.tables.get(&name) {
                let records = table.values().map(Record::to_value).collect();
                out.insert(name, Value::Array(records));
            }
        }
        Value::Object(out)
    }

    pub fn resources(&self) -> Vec<String> {
        self.tables.iter().map(|r| r.key().clone()).collect()
    }

    /// Insert or replace a record directly, bypassing the provider verbs.
    pub fn insert(&self, resource: &str, record: Record) {
        self.tables
            .entry(resource.to_owned())
            .or_default()
            .insert(record.id.clone(), record);
    }

    fn query(
        &self,
        resource: &str,
        filter: &FilterPayload,
        sort: &SortPayload,
        pagination: PaginationPayload,
    ) -> Result<(Vec<Record>, u64), Error> {
        let table = self
            .tables
            .get(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;

        let mut matching: Vec<Record> = table
            .values()
            .filter(|r| matches_filter(r, filter))
            .cloned()
            .collect();
        drop(table);

        matching.sort_by(|a, b| {
            let ord = compare_values(a.field(&sort.field).as_ref(), b.field(&sort.field).as_ref());
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        Ok((paginate(matching, pagination), total))
    }
}

#[async_trait]
impl DataProvider for MemoryDataProvider {
    async fn get_list(&self, resource: &str, params: GetListParams) -> Result<GetListResult, Error> {
        let (data, total) =
            self.query(resource, &params.filter, &params.sort, params.pagination)?;
        debug!(resource, total, returned = data.len(), "get_list");
        Ok(GetListResult {
            data,
            total,
            valid_until: None,
        })
    }

    async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<GetOneResult, Error> {
        let table = self
            .tables
            .get(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let data = table
            .get(&params.id)
            .cloned()
            .ok_or_else(|| not_found(resource, &params.id))?;
        Ok(GetOneResult {
            data,
            valid_until: None,
        })
    }

    async fn get_many(
        &self,
        resource: &str,
        params: GetManyParams,
    ) -> Result<GetManyResult, Error> {
        let table = self
            .tables
            .get(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let data = params
            .ids
            .iter()
            .filter_map(|id| table.get(id).cloned())
            .collect();
        Ok(GetManyResult {
            data,
            valid_until: None,
        })
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<GetManyReferenceResult, Error> {
        let mut filter = params.filter;
        filter.insert(params.target, params.id.to_value());
        let (data, total) = self.query(resource, &filter, &params.sort, params.pagination)?;
        Ok(GetManyReferenceResult {
            data,
            total,
            valid_until: None,
        })
    }

    async fn update(&self, resource: &str, params: UpdateParams) -> Result<UpdateResult, Error> {
        require_object(&params.data)?;
        let mut table = self
            .tables
            .get_mut(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let record = table
            .get_mut(&params.id)
            .ok_or_else(|| not_found(resource, &params.id))?;
        record.merge(&params.data);
        debug!(resource, id = %params.id, "update");
        Ok(UpdateResult {
            data: record.clone(),
            valid_until: None,
        })
    }

    async fn update_many(
        &self,
        resource: &str,
        params: UpdateManyParams,
    ) -> Result<UpdateManyResult, Error> {
        require_object(&params.data)?;
        let mut table = self
            .tables
            .get_mut(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let mut updated = Vec::with_capacity(params.ids.len());
        for id in params.ids {
            if let Some(record) = table.get_mut(&id) {
                record.merge(&params.data);
                updated.push(id);
            }
        }
        debug!(resource, count = updated.len(), "update_many");
        Ok(UpdateManyResult {
            data: Some(updated),
            valid_until: None,
        })
    }

    async fn create(&self, resource: &str, params: CreateParams) -> Result<CreateResult, Error> {
        require_object(&params.data)?;
        let mut table = self.tables.entry(resource.to_owned()).or_default();

        let id = match params.data.get("id") {
            Some(raw) => {
                let id = Identifier::from_value(raw).ok_or_else(|| Error::InvalidRequest {
                    message: "id must be an integer or a string".into(),
                })?;
                if table.contains_key(&id) {
                    return Err(Error::InvalidRequest {
                        message: format!("{resource} record {id} already exists"),
                    });
                }
                id
            }
            None => next_id(&table),
        };

        let mut record = Record::new(id.clone());
        record.merge(&params.data);
        table.insert(id.clone(), record.clone());
        debug!(resource, id = %id, "create");
        Ok(CreateResult {
            data: record,
            valid_until: None,
        })
    }

    async fn delete(&self, resource: &str, params: DeleteParams) -> Result<DeleteResult, Error> {
        let mut table = self
            .tables
            .get_mut(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let data = table
            .shift_remove(&params.id)
            .ok_or_else(|| not_found(resource, &params.id))?;
        debug!(resource, id = %params.id, "delete");
        Ok(DeleteResult { data })
    }

    async fn delete_many(
        &self,
        resource: &str,
        params: DeleteManyParams,
    ) -> Result<DeleteManyResult, Error> {
        let mut table = self
            .tables
            .get_mut(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_owned()))?;
        let removed: Vec<Identifier> = params
            .ids
            .into_iter()
            .filter(|id| table.shift_remove(id).is_some())
            .collect();
        debug!(resource, count = removed.len(), "delete_many");
        Ok(DeleteManyResult {
            data: Some(removed),
        })
    }
}

// ── Query helpers ───────────────────────────────────────────────────

fn not_found(resource: &str, id: &Identifier) -> Error {
    Error::NotFound {
        resource: resource.to_owned(),
        id: id.to_string(),
    }
}

fn require_object(data: &Value) -> Result<(), Error> {
    if data.is_object() {
        Ok(())
    } else {
        Err(Error::InvalidRequest {
            message: "record data must be a JSON object".into(),
        })
    }
}

fn next_id(table: &Table) -> Identifier {
    let max = table.keys().filter_map(Identifier::as_num).max().unwrap_or(0);
    Identifier::Num(max + 1)
}

fn paginate(records: Vec<Record>, pagination: PaginationPayload) -> Vec<Record> {
    if pagination.per_page == 0 {
        return records;
    }
    let per_page = usize::try_from(pagination.per_page).unwrap_or(usize::MAX);
    let page = usize::try_from(pagination.page.max(1)).unwrap_or(usize::MAX);
    let start = (page - 1).saturating_mul(per_page);
    records.into_iter().skip(start).take(per_page).collect()
}

/// `q` is a case-insensitive full-text match over every field. Other keys
/// compare for equality, with `_neq`, `_gte` and `_lte` suffixes for
/// inequality and range filters. An array filter value means "any of".
fn matches_filter(record: &Record, filter: &FilterPayload) -> bool {
    filter.iter().all(|(key, expected)| {
        if key == "q" {
            return full_text_match(record, expected);
        }
        if let Some(field) = key.strip_suffix("_neq") {
            return !field_matches(record.field(field).as_ref(), expected);
        }
        if let Some(field) = key.strip_suffix("_gte") {
            return compare_values(record.field(field).as_ref(), Some(expected)) != Ordering::Less;
        }
        if let Some(field) = key.strip_suffix("_lte") {
            return compare_values(record.field(field).as_ref(), Some(expected))
                != Ordering::Greater;
        }
        field_matches(record.field(key).as_ref(), expected)
    })
}

fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::Array(items)), Value::Array(wanted)) => {
            wanted.iter().any(|w| items.iter().any(|i| loosely_equal(i, w)))
        }
        (Some(Value::Array(items)), wanted) => items.iter().any(|i| loosely_equal(i, wanted)),
        (Some(value), Value::Array(wanted)) => wanted.iter().any(|w| loosely_equal(value, w)),
        (Some(value), wanted) => loosely_equal(value, wanted),
        (None, wanted) => wanted.is_null(),
    }
}

/// Equality that tolerates `"3"` vs `3`, as filters often arrive as strings.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

fn full_text_match(record: &Record, needle: &Value) -> bool {
    let Some(needle) = needle.as_str() else {
        return true;
    };
    let needle = needle.to_lowercase();
    record.fields.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(&needle),
        Value::Number(n) => n.to_string().contains(&needle),
        _ => false,
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compare_values_orders_nulls_first() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
    }

    #[test]
    fn filter_array_value_means_any_of() {
        let record = Record::new(1).with("status", "draft");
        let mut filter = FilterPayload::new();
        filter.insert("status".into(), json!(["draft", "review"]));
        assert!(matches_filter(&record, &filter));

        filter.insert("status".into(), json!(["published"]));
        assert!(!matches_filter(&record, &filter));
    }

    #[test]
    fn filter_tolerates_string_numbers() {
        let record = Record::new(1).with("author_id", 7);
        let mut filter = FilterPayload::new();
        filter.insert("author_id".into(), json!("7"));
        assert!(matches_filter(&record, &filter));
    }

    #[test]
    fn range_suffixes() {
        let record = Record::new(1).with("views", 10);
        let mut filter = FilterPayload::new();
        filter.insert("views_gte".into(), json!(10));
        filter.insert("views_lte".into(), json!(20));
        assert!(matches_filter(&record, &filter));

        filter.insert("views_neq".into(), json!(10));
        assert!(!matches_filter(&record, &filter));
    }

    #[test]
    fn paginate_is_one_based() {
        let records: Vec<Record> = (1..=5).map(Record::new).collect();
        let page = paginate(records, PaginationPayload::new(2, 2));
        let ids: Vec<_> = page.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![Identifier::Num(3), Identifier::Num(4)]);
    }

    #[test]
    fn paginate_clamps_page_and_runs_past_the_end() {
        let records: Vec<Record> = (1..=5).map(Record::new).collect();
        assert_eq!(paginate(records.clone(), PaginationPayload::new(0, 2)).len(), 2);
        assert!(paginate(records.clone(), PaginationPayload::new(u32::MAX, u32::MAX)).is_empty());
        assert_eq!(paginate(records, PaginationPayload::new(3, 0)).len(), 5);
    }

    #[test]
    fn next_id_follows_numeric_max() {
        let mut table = Table::new();
        assert_eq!(next_id(&table), Identifier::Num(1));
        table.insert(Identifier::Num(41), Record::new(41));
        table.insert(Identifier::Str("x".into()), Record::new("x"));
        assert_eq!(next_id(&table), Identifier::Num(42));
    }
}
