use tk_core::entities::TraceSearchCriteria;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::FindArgs;
use crate::commands::parse;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: &FindArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let criteria = TraceSearchCriteria {
        project_name: args.project.clone(),
        project_id: args.project_id.as_deref().map(parse::project_id).transpose()?,
        exclude_placeholders: args.realized_only,
    };
    let page = ctx
        .service
        .find(&ctx.request, args.page, args.size, &criteria)
        .await?;
    output(&page, flags.format)
}
