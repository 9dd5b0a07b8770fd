use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Parser, Subcommand, ValueEnum};
use vidledger_core::NamingPolicy;

pub const VIDLEDGER_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const VIDLEDGER_BEFORE_HELP: &str = concat!(
    "vidledger ",
    env!("CARGO_PKG_VERSION"),
    " – Ledger-checked video uploads to Labelbox\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  upload           Convert and upload videos the inventory CSV does not list yet.\n",
    "  inventory        Write a CSV snapshot of every video already on Labelbox.\n\n",
    "\x1b[1;36mConfiguration\x1b[0m\n",
    "  LABELBOX_API_KEY, VIDEO_FOLDER_PATH and INVENTORY_CSV are read from the\n",
    "  environment or a .env file in the working directory.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "vidledger",
    author,
    version,
    disable_help_subcommand = true,
    before_help = VIDLEDGER_BEFORE_HELP,
    help_template = VIDLEDGER_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct VidledgerCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (failures still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)", global = true)]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Convert and upload every video the inventory CSV does not list yet.",
        override_usage = "vidledger upload [--folder DIR] [--ledger CSV] [--naming mp4|source] [--dry-run]"
    )]
    Upload(UploadArgs),
    #[command(
        about = "Write a CSV snapshot of every externally identified video on Labelbox.",
        override_usage = "vidledger inventory [--output CSV]"
    )]
    Inventory(InventoryArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(
        long,
        value_name = "DIR",
        value_parser = value_parser!(PathBuf),
        help = "Folder to scan (overrides VIDEO_FOLDER_PATH)"
    )]
    pub folder: Option<PathBuf>,
    #[arg(
        long,
        value_name = "CSV",
        value_parser = value_parser!(PathBuf),
        help = "Inventory CSV to check and extend (overrides INVENTORY_CSV)"
    )]
    pub ledger: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value_t = NamingArg::Mp4,
        help = "How video names are derived: converted <stem>.mp4 or the source file name"
    )]
    pub naming: NamingArg,
    #[arg(long, help = "List what would be uploaded without converting or uploading")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct InventoryArgs {
    #[arg(
        long,
        value_name = "CSV",
        value_parser = value_parser!(PathBuf),
        help = "Where to write the snapshot (default labelbox_video_inventory.csv)"
    )]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingArg {
    Mp4,
    Source,
}

impl From<NamingArg> for NamingPolicy {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Mp4 => NamingPolicy::ForceMp4,
            NamingArg::Source => NamingPolicy::SourceName,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        VidledgerCli::command().debug_assert();
    }

    #[test]
    fn upload_flags_parse_into_args() {
        let cli = VidledgerCli::parse_from([
            "vidledger",
            "-vv",
            "upload",
            "--folder",
            "/videos/site",
            "--naming",
            "source",
            "--dry-run",
            "--json",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        let CommandGroupCli::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.folder, Some(PathBuf::from("/videos/site")));
        assert!(args.ledger.is_none());
        assert_eq!(NamingPolicy::from(args.naming), NamingPolicy::SourceName);
        assert!(args.dry_run);
    }

    #[test]
    fn naming_defaults_to_converted_name() {
        let cli = VidledgerCli::parse_from(["vidledger", "upload"]);
        let CommandGroupCli::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(NamingPolicy::from(args.naming), NamingPolicy::ForceMp4);
    }
}
