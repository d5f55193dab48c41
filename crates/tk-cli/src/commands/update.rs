use serde_json::json;
use tk_core::entities::TraceUpdate;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::UpdateArgs;
use crate::commands::parse;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: &UpdateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let id = parse::trace_id(&args.id)?;
    let patch = build_patch(args)?;
    if patch.is_empty() {
        anyhow::bail!(
            "At least one of --end-time, --input, --output, --metadata, or --tag must be provided"
        );
    }
    ctx.service.update(&ctx.request, id, &patch).await?;
    output(&json!({ "id": id, "updated": true }), flags.format)
}

fn build_patch(args: &UpdateArgs) -> anyhow::Result<TraceUpdate> {
    Ok(TraceUpdate {
        project_name: args.project.clone(),
        project_id: args.project_id.as_deref().map(parse::project_id).transpose()?,
        end_time: parse::optional_timestamp(args.end_time.as_deref(), "end-time")?,
        input: parse::optional_json(args.input.as_deref(), "input")?,
        output: parse::optional_json(args.output.as_deref(), "output")?,
        metadata: parse::optional_json(args.metadata.as_deref(), "metadata")?,
        tags: if args.tags.is_empty() {
            None
        } else {
            Some(parse::tags(&args.tags))
        },
    })
}
