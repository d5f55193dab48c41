use serde_json::json;

use crate::cli::GlobalFlags;
use crate::commands::parse;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(ids: &[String], ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let ids = ids
        .iter()
        .map(|id| parse::trace_id(id))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let valid = ctx
        .service
        .validate_workspace_ownership(&ctx.request.workspace_id, &ids)
        .await?;
    output(
        &json!({ "workspace": ctx.request.workspace_id, "valid": valid }),
        flags.format,
    )
}
