use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli_exec;

#[derive(Parser)]
#[command(name = "menuum")]
#[command(about = "Menuum meal planning client", long_about = None)]
struct Cli {
    /// Client config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Password (read from MENUUM_PASSWORD when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account (email verification required before login)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },

    /// Confirm an email address with the code that was sent to it
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long, required_unless_present = "resend")]
        code: Option<String>,
        /// Send a new code instead of verifying
        #[arg(long, conflicts_with = "code")]
        resend: bool,
    },

    /// Password reset and change
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Show whether a usable session is stored
    Status,

    /// Refresh the stored session now
    Refresh,

    /// Weekly meal plans
    Plans {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Nutrition profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Premium subscription
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Email a reset code
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using a reset code
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        new_password: String,
    },
    /// Change the password of the signed-in user
    Change {
        #[arg(long)]
        current_password: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// List generated plans
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a plan with its days and meals
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Request a new plan (generated asynchronously)
    Create {
        #[arg(long)]
        json: bool,
    },
    /// Regenerate one meal of a plan
    Regenerate {
        id: String,
        #[arg(long)]
        day: String,
        #[arg(long)]
        meal: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Upload an avatar image
    Avatar { path: PathBuf },
    /// Remove the avatar
    DeleteAvatar,
}

#[derive(Subcommand)]
enum SubscriptionCommands {
    /// Show the current subscription
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Start a checkout and print its URL
    Checkout {
        /// Yearly instead of monthly billing
        #[arg(long)]
        yearly: bool,
    },
    /// Cancel at the end of the current period
    Cancel,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli_exec::handle_command(cli).await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
