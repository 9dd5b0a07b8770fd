use color_eyre::Result;
use vidledger_core::api::{
    inventory_command, outcome_from_error, upload_command, CommandContext, CommandGroup,
    CommandInfo, ExecutionOutcome, InventoryRequest, UploadRequest,
};

use crate::cli::{CommandGroupCli, InventoryArgs, UploadArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    match group {
        CommandGroupCli::Upload(args) => {
            let info = CommandInfo::new(CommandGroup::Upload, "upload");
            let request = upload_request_from_args(args);
            core_call(info, || upload_command(ctx, &request))
        }
        CommandGroupCli::Inventory(args) => {
            let info = CommandInfo::new(CommandGroup::Inventory, "inventory");
            let request = inventory_request_from_args(args);
            core_call(info, || inventory_command(ctx, &request))
        }
    }
}

fn upload_request_from_args(args: &UploadArgs) -> UploadRequest {
    UploadRequest {
        folder: args.folder.clone(),
        ledger: args.ledger.clone(),
        naming: args.naming.into(),
        dry_run: args.dry_run,
    }
}

fn inventory_request_from_args(args: &InventoryArgs) -> InventoryRequest {
    InventoryRequest {
        output: args.output.clone(),
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    tracing::debug!(command = info.name, "running command");
    let outcome = match action() {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            outcome_from_error(&err)
        }
    };
    Ok((info, outcome))
}
