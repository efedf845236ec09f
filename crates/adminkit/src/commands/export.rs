//! `export`: dump a resource to CSV, optionally embedding related records.

use adminkit_api::{GetListParams, Identifier, PaginationPayload, Record};
use adminkit_core::{download_csv, to_csv};
use serde_json::Value;
use tracing::info;

use super::{Session, util};
use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let params = GetListParams {
        // per_page 0 fetches every matching record
        pagination: PaginationPayload::new(1, 0),
        sort: util::parse_sort(args.query.sort.as_deref())?,
        filter: util::parse_filter(&args.query)?,
    };
    let mut records = session.admin.get_list(&args.resource, params).await?.data;

    for spec in &args.related {
        let (field, resource) = parse_related(spec)?;
        let related = session
            .admin
            .fetch_related_records(&records, field, resource)
            .await?;
        let target = embed_key(field);
        for record in &mut records {
            if let Some(embedded) = embed(record.field(field), &related) {
                record.fields.insert(target.clone(), embedded);
            }
        }
        info!(field, resource, count = related.len(), "embedded related records");
    }

    let csv = to_csv(&records)?;
    let filename = args.filename.as_deref().unwrap_or(&args.resource);
    let path = download_csv(&csv, &args.dir, filename)?;
    output::print_output(&path.display().to_string(), global.quiet);
    Ok(())
}

/// Split `field=resource`.
fn parse_related(spec: &str) -> Result<(&str, &str), CliError> {
    match spec.split_once('=') {
        Some((field, resource)) if !field.is_empty() && !resource.is_empty() => {
            Ok((field, resource))
        }
        _ => Err(CliError::Validation {
            field: "related".into(),
            reason: format!("expected field=resource, got '{spec}'"),
        }),
    }
}

/// `author_id` embeds as `author`, `tag_ids` as `tags`; anything else as
/// `<field>_record`.
fn embed_key(field: &str) -> String {
    if let Some(stem) = field.strip_suffix("_ids") {
        format!("{stem}s")
    } else if let Some(stem) = field.strip_suffix("_id") {
        stem.to_owned()
    } else {
        format!("{field}_record")
    }
}

fn embed(
    reference: Option<Value>,
    related: &std::collections::HashMap<Identifier, Record>,
) -> Option<Value> {
    match reference? {
        Value::Array(ids) => Some(Value::Array(
            ids.iter()
                .filter_map(Identifier::from_value)
                .filter_map(|id| related.get(&id).map(Record::to_value))
                .collect(),
        )),
        scalar => Identifier::from_value(&scalar)
            .and_then(|id| related.get(&id))
            .map(Record::to_value),
    }
}
