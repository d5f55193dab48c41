use chrono::Utc;
use serde_json::json;
use tk_core::entities::NewTrace;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CreateArgs;
use crate::commands::parse;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: &CreateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let request = build_request(args)?;
    let id = ctx.service.create(&ctx.request, &request).await?;
    output(&json!({ "id": id }), flags.format)
}

fn build_request(args: &CreateArgs) -> anyhow::Result<NewTrace> {
    let start_time = match args.start_time.as_deref() {
        Some(text) => parse::timestamp(text, "start-time")?,
        None => Utc::now(),
    };
    Ok(NewTrace {
        id: args.id.as_deref().map(parse::trace_id).transpose()?,
        project_name: args.project.clone(),
        name: args.name.clone(),
        start_time,
        end_time: parse::optional_timestamp(args.end_time.as_deref(), "end-time")?,
        input: parse::optional_json(args.input.as_deref(), "input")?,
        output: parse::optional_json(args.output.as_deref(), "output")?,
        metadata: parse::optional_json(args.metadata.as_deref(), "metadata")?,
        tags: parse::tags(&args.tags),
    })
}
