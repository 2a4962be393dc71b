use std::io;

use crate::actions::ActionDispatcher;
use crate::cli::ActionArgs;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(ctx: &AppContext, args: ActionArgs) -> AppResult<()> {
    let payload = match args.payload {
        Some(payload) => payload,
        None => io::read_to_string(io::stdin())?,
    };

    let session = ctx.session();
    let dispatcher = ActionDispatcher::new(
        &ctx.settings,
        &ctx.credentials,
        &session,
        &ctx.cache,
        &ctx.launcher,
    );

    let report = dispatcher.dispatch(&payload).await?;
    ctx.output.emit_lines(&report.status, &report)
}
