use std::path::Path;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use menuum_client::MenuumClient;
use menuum_client::api::{CheckoutPlan, MenuHistoryItem};
use menuum_client::auth::AuthBackend;
use menuum_client::model::ClientConfig;

use crate::{Cli, Commands, PasswordCommands, PlanCommands, ProfileCommands, SubscriptionCommands};

pub(crate) async fn handle_command(cli: Cli) -> Result<()> {
    let cfg = ClientConfig::load(cli.config.as_deref())?;
    let client = MenuumClient::from_config(&cfg)?;
    let auth = client.auth();

    match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => {
            let password = require_password(password)?;
            let resp = auth.login(&email, &password).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&resp.user).context("serialize user json")?
                );
            } else if client.dispatcher().is_authenticated(OffsetDateTime::now_utc()) {
                println!("Logged in as {}", email);
            } else {
                println!(
                    "{}",
                    resp.message
                        .unwrap_or_else(|| "Login accepted but no session was issued".to_string())
                );
            }
        }
        Commands::Register {
            email,
            password,
            name,
        } => {
            let password = require_password(password)?;
            let resp = auth.register(&email, &password, name.as_deref()).await?;
            println!(
                "{}",
                resp.message
                    .unwrap_or_else(|| format!("Registered {}; check your email", email))
            );
        }
        Commands::Verify {
            email,
            code,
            resend,
        } => {
            let resp = match code {
                Some(code) if !resend => auth.verify_email(&email, &code).await?,
                _ => auth.resend_verification(&email).await?,
            };
            println!("{}", resp.message.unwrap_or_else(|| "OK".to_string()));
        }
        Commands::Password { command } => {
            let resp = match command {
                PasswordCommands::Forgot { email } => auth.forgot_password(&email).await?,
                PasswordCommands::Reset {
                    email,
                    code,
                    new_password,
                } => auth.reset_password(&email, &code, &new_password).await?,
                PasswordCommands::Change {
                    current_password,
                    new_password,
                } => {
                    auth.change_password(&current_password, &new_password)
                        .await?
                }
            };
            println!("{}", resp.message.unwrap_or_else(|| "OK".to_string()));
        }
        Commands::Logout => {
            auth.logout().await;
            println!("Logged out");
        }
        Commands::Whoami { json } => {
            let user = auth.current_user().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&user).context("serialize user json")?
                );
            } else {
                println!("{} <{}>", user.name, user.email);
                println!("id: {}", user.id);
                println!("email_verified: {}", user.email_verified);
            }
        }
        Commands::Status => match auth.store().read() {
            None => println!("Not logged in"),
            Some(bundle) => {
                let expires = bundle
                    .expires_at
                    .format(&Rfc3339)
                    .context("format expiry")?;
                if client.dispatcher().is_authenticated(OffsetDateTime::now_utc()) {
                    println!("Logged in (token expires {})", expires);
                } else {
                    println!("Session needs refresh (token expires {})", expires);
                }
            }
        },
        Commands::Refresh => {
            if let Err(err) = client.dispatcher().refresh().await {
                auth.store().clear();
                return Err(err).context("refresh session (log in again)");
            }
            println!("Session refreshed");
        }
        Commands::Plans { command } => handle_plan_command(&client, command).await?,
        Commands::Profile { command } => handle_profile_command(&client, command).await?,
        Commands::Subscription { command } => {
            handle_subscription_command(&client, command).await?
        }
    }

    Ok(())
}

async fn handle_plan_command(client: &MenuumClient, command: PlanCommands) -> Result<()> {
    let api = client.api();
    match command {
        PlanCommands::List { json } => {
            let plans = api.menu_history().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plans).context("serialize plans json")?
                );
            } else if plans.is_empty() {
                println!("No plans yet");
            } else {
                for plan in &plans {
                    print_plan_row(plan);
                }
            }
        }
        PlanCommands::Show { id, json } => {
            let plan = api.menu(&id).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan).context("serialize plan json")?
                );
            } else {
                println!("id: {}", plan.id);
                println!("week: {}", plan.week_start_date);
                println!("status: {}", plan.status.as_str());
                if let Some(msg) = plan.error_message.as_deref().filter(|m| !m.is_empty()) {
                    println!("error: {}", msg);
                }
                println!("calories: {:.0}", plan.calories_total);
                for day in &plan.days {
                    println!();
                    println!("{} ({:.0} kcal)", day.day_name, day.calories_day);
                    for meal in &day.meals {
                        println!("  {:<10} {} ({:.0} kcal)", meal.meal_type, meal.name, meal.calories);
                    }
                }
            }
        }
        PlanCommands::Create { json } => {
            let plan = api.create_menu().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan).context("serialize plan json")?
                );
            } else {
                println!("Requested plan {} ({})", plan.id, plan.status.as_str());
            }
        }
        PlanCommands::Regenerate { id, day, meal } => {
            let plan = api.regenerate_meal(&id, &day, &meal).await?;
            println!("Regenerated {} {} in plan {}", day, meal, plan.id);
        }
    }
    Ok(())
}

fn print_plan_row(plan: &MenuHistoryItem) {
    println!(
        "{} {} {:<10} {:.0} kcal",
        plan.id,
        plan.week_start_date,
        plan.status.as_str(),
        plan.calories_total
    );
}

async fn handle_profile_command(client: &MenuumClient, command: ProfileCommands) -> Result<()> {
    let api = client.api();
    match command {
        ProfileCommands::Show { json } => {
            let profile = api.profile().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&profile).context("serialize profile json")?
                );
            } else {
                let name = [profile.name.as_deref(), profile.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("id: {}", profile.id);
                if !name.is_empty() {
                    println!("name: {}", name);
                }
                if let Some(goal) = &profile.goal {
                    println!("goal: {}", goal);
                }
                if let Some(calories) = profile.calories {
                    println!("calories: {:.0}", calories);
                }
                if let Some(dislikes) = profile.dislikes.as_ref().filter(|d| !d.is_empty()) {
                    println!("dislikes: {}", dislikes.join(", "));
                }
            }
        }
        ProfileCommands::Avatar { path } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("avatar")
                .to_string();
            let uploaded = api
                .upload_avatar(&file_name, image_mime(&path), bytes)
                .await?;
            println!("Avatar uploaded: {}", uploaded.avatar_url);
        }
        ProfileCommands::DeleteAvatar => {
            api.delete_avatar().await?;
            println!("Avatar removed");
        }
    }
    Ok(())
}

async fn handle_subscription_command(
    client: &MenuumClient,
    command: SubscriptionCommands,
) -> Result<()> {
    let api = client.api();
    match command {
        SubscriptionCommands::Status { json } => {
            let sub = api.subscription_status().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&sub).context("serialize subscription json")?
                );
            } else if let Some(sub) = sub {
                println!("plan: {}", sub.plan);
                println!("status: {}", sub.status);
                if let Some(end) = &sub.current_period_end {
                    println!("current period ends: {}", end);
                }
                if sub.cancel_at_period_end {
                    println!("cancels at period end");
                }
            } else {
                println!("No subscription");
            }
        }
        SubscriptionCommands::Checkout { yearly } => {
            let plan = if yearly {
                CheckoutPlan::PremiumYearly
            } else {
                CheckoutPlan::PremiumMonthly
            };
            let session = api.create_checkout(plan).await?;
            println!("{}", session.session_url);
        }
        SubscriptionCommands::Cancel => {
            api.cancel_subscription().await?;
            println!("Subscription will cancel at the end of the current period");
        }
    }
    Ok(())
}

fn require_password(password: Option<String>) -> Result<String> {
    password
        .or_else(|| std::env::var("MENUUM_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .context("no password given (pass --password or set MENUUM_PASSWORD)")
}

fn image_mime(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mime.to_string())
}
