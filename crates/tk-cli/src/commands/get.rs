use crate::cli::GlobalFlags;
use crate::commands::parse;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let id = parse::trace_id(id)?;
    let trace = ctx.service.get(&ctx.request, id).await?;
    output(&trace, flags.format)
}
