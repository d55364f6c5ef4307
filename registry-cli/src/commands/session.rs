use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use registry_client::{RestorePhase, storage, token::is_token_expired};
use rpassword::prompt_password;
use shared::models::RegisterRequest;
use std::path::PathBuf;

use super::{Context, output, profile::avatar_data_url, prompt};

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Create an account (does not sign in)
    Register(RegisterArgs),
    /// Show the signed-in account
    Me,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Sign out and remove the stored session
    Logout,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Image to use as the initial avatar
    #[arg(long, short)]
    pub avatar: Option<PathBuf>,
}

pub async fn run(ctx: &Context, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Login(args) => login(ctx, args).await,
        SessionCommand::Register(args) => register(ctx, args).await,
        SessionCommand::Me => me(ctx).await,
        SessionCommand::Refresh => refresh(ctx).await,
        SessionCommand::Logout => logout(ctx).await,
    }
}

async fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;

    let user = ctx.manager.login(&email, &password).await?;
    println!("Logged in as {} ({})", user.label(), user.role);
    println!("session stored at {}", ctx.store.path().display());
    Ok(())
}

async fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let avatar = args.avatar.as_deref().map(avatar_data_url).transpose()?;
    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;

    let request = RegisterRequest {
        email,
        password,
        confirm_password,
        avatar,
    };
    ctx.manager.register(&request).await?;
    println!("Account created. Run `registry session login` to sign in.");
    Ok(())
}

async fn me(ctx: &Context) -> Result<()> {
    let user = ctx.require_session().await?;
    if ctx.json {
        return output::print_json(&user);
    }
    output::print_user(&user);
    let session = ctx.manager.snapshot();
    println!("  token:    {}", token_state(session.access_token(), Utc::now()));
    Ok(())
}

/// Client-side view of the access token; the server has the final say.
fn token_state(token: Option<&str>, now: DateTime<Utc>) -> &'static str {
    match token {
        None => "none",
        Some(token) if is_token_expired(token, now) => "expired (refreshed on the next call)",
        Some(_) => "valid",
    }
}

async fn refresh(ctx: &Context) -> Result<()> {
    match ctx.manager.initialize().await {
        RestorePhase::Anonymous => bail!("not signed in; run `registry session login` first"),
        RestorePhase::Cleared => {
            bail!("your session has expired; run `registry session login` to sign in again")
        }
        _ => {}
    }
    ctx.manager.refresh_token().await?;
    println!("Access token refreshed.");
    Ok(())
}

async fn logout(ctx: &Context) -> Result<()> {
    if !storage::has_session_data(ctx.store.as_ref()) {
        println!("No stored session at {}", ctx.store.path().display());
        return Ok(());
    }
    ctx.manager.logout().await?;
    println!("Signed out; removed session at {}", ctx.store.path().display());
    Ok(())
}
