//! Record command handlers: list, show, create, update, delete.

use adminkit_api::{GetListParams, Identifier, PaginationPayload};
use adminkit_core::{
    ResponseData, crud_create, crud_delete, crud_delete_many, crud_update, crud_update_many,
};

use super::{Session, submit, util};
use crate::cli::{GlobalOpts, ListArgs, OutputFormat, PayloadArgs};
use crate::error::CliError;
use crate::output;

/// Base path of a resource, used to resolve redirects.
fn base_path(resource: &str) -> String {
    format!("/{resource}")
}

// ── Reads ───────────────────────────────────────────────────────────

pub async fn list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let per_page = args
        .per_page
        .unwrap_or(session.admin.config().default_per_page);
    let params = GetListParams {
        pagination: PaginationPayload::new(args.page, per_page),
        sort: util::parse_sort(args.query.sort.as_deref())?,
        filter: util::parse_filter(&args.query)?,
    };

    let result = session.admin.get_list(&args.resource, params).await?;
    let out = output::render_records(&global.output, &result.data)?;
    output::print_output(&out, global.quiet);

    if !global.quiet && matches!(global.output, OutputFormat::Table) {
        eprintln!(
            "{} of {} {} (page {})",
            result.data.len(),
            result.total,
            args.resource,
            args.page
        );
    }
    Ok(())
}

pub async fn show(
    session: &Session,
    resource: &str,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let record = session.admin.get_one(resource, Identifier::from(id)).await?;
    let out = output::render_record(&global.output, &record)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Writes ──────────────────────────────────────────────────────────

pub async fn create(
    session: &Session,
    resource: &str,
    payload: &PayloadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let data = util::payload_value(payload)?;
    let request = crud_create(resource, data, &base_path(resource))?;
    print_response(submit(session, request, global).await?, global)
}

pub async fn update(
    session: &Session,
    resource: &str,
    id: &str,
    payload: &PayloadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let data = util::payload_value(payload)?;
    let id = Identifier::from(id);
    let previous = session.admin.get_one(resource, id.clone()).await?;
    let request = crud_update(resource, id, data, Some(previous), &base_path(resource))?;
    print_response(submit(session, request, global).await?, global)
}

pub async fn update_many(
    session: &Session,
    resource: &str,
    ids: &[String],
    payload: &PayloadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let data = util::payload_value(payload)?;
    let request = crud_update_many(resource, util::parse_ids(ids), data, &base_path(resource))?;
    print_response(submit(session, request, global).await?, global)
}

pub async fn delete(
    session: &Session,
    resource: &str,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = Identifier::from(id);
    let previous = session.admin.get_one(resource, id.clone()).await?;
    if !util::confirm(&format!("Delete {resource} {id}?"), global.yes)? {
        return Err(CliError::Cancelled);
    }
    let request = crud_delete(resource, id, Some(previous), &base_path(resource))?;
    print_response(submit(session, request, global).await?, global)
}

pub async fn delete_many(
    session: &Session,
    resource: &str,
    ids: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ids = util::parse_ids(ids);
    if !util::confirm(&format!("Delete {} {resource}?", ids.len()), global.yes)? {
        return Err(CliError::Cancelled);
    }
    let request = crud_delete_many(resource, ids, &base_path(resource))?;
    print_response(submit(session, request, global).await?, global)
}

// ── Output ──────────────────────────────────────────────────────────

/// Print what the provider returned. An undone change prints nothing.
fn print_response(response: Option<ResponseData>, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(response) = response else {
        return Ok(());
    };
    let out = match &response {
        ResponseData::UpdatedMany(result) => {
            output::render_single(&global.output, &result.data, |ids| join_ids(ids.as_deref()))?
        }
        ResponseData::DeletedMany(result) => {
            output::render_single(&global.output, &result.data, |ids| join_ids(ids.as_deref()))?
        }
        other => match other.records() {
            [record] => output::render_record(&global.output, record)?,
            records => output::render_records(&global.output, records)?,
        },
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn join_ids(ids: Option<&[Identifier]>) -> String {
    ids.unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
