use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Create(args) => commands::create::run(&args, ctx, flags).await,
        Commands::Update(args) => commands::update::run(&args, ctx, flags).await,
        Commands::Get { id } => commands::get::run(&id, ctx, flags).await,
        Commands::Delete { id } => commands::delete::run(&id, ctx, flags).await,
        Commands::Find(args) => commands::find::run(&args, ctx, flags).await,
        Commands::ValidateWorkspace { ids } => {
            commands::validate_workspace::run(&ids, ctx, flags).await
        }
    }
}
