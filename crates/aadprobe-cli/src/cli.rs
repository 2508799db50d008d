use aadprobe_config::{Variant, FIXTURE_ADDRESS};
use aadprobe_domain::LifecyclePhase;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "aadprobe",
    about = "Verify that Azure AD application objects match their expected lifecycle phase",
    version
)]
pub struct Cli {
    /// YAML probe configuration. ARM_* environment variables override it.
    #[arg(long, env = "AADPROBE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that an application object is in the expected phase.
    Verify {
        /// Directory object ID of the application.
        object_id: String,

        /// created, updated or destroyed.
        #[arg(long)]
        phase: LifecyclePhase,
    },

    /// Probe an application object and print the raw classification.
    Probe {
        /// Directory object ID of the application.
        object_id: String,
    },

    /// Print the HCL for a fixture variant.
    Render {
        /// basic, available-to-other-tenants or complete.
        variant: Variant,

        /// Test id; a random UUID when omitted.
        #[arg(long)]
        id: Option<String>,
    },

    /// Check that a resource in a `terraform show -json` file exists remotely.
    CheckExists {
        /// Path to the JSON state.
        state: PathBuf,

        #[arg(long, default_value = FIXTURE_ADDRESS)]
        address: String,
    },

    /// Check that every application in a `terraform show -json` file is gone.
    CheckDestroy {
        /// Path to the JSON state captured before destroy.
        state: PathBuf,
    },

    /// Run a full create/check/destroy scenario.
    Run {
        case: CaseArg,

        /// Terraform workspace directory (default: a fresh temp dir).
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// `terraform` or `tofu`.
        #[arg(long, default_value = "terraform")]
        binary: String,

        /// Use the in-memory directory instead of Terraform and Azure AD.
        #[arg(long)]
        local: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CaseArg {
    Basic,
    AvailableToOtherTenants,
    Complete,
    Update,
}

impl CaseArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseArg::Basic => "basic",
            CaseArg::AvailableToOtherTenants => "available-to-other-tenants",
            CaseArg::Complete => "complete",
            CaseArg::Update => "update",
        }
    }
}
