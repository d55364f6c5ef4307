use anyhow::{Context as _, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Args, Subcommand};
use rpassword::prompt_password;
use shared::models::{AvatarUpdate, PasswordUpdate, ProfileUpdate};
use std::{fs, path::Path};

use super::{Context, output};

/// Largest avatar the API accepts.
pub const MAX_AVATAR_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Change your display name and/or email
    Update(UpdateArgs),
    /// Upload a new avatar image
    Avatar {
        /// PNG, JPEG, GIF, or WebP image of at most 5 MiB
        path: std::path::PathBuf,
    },
    /// Change your password
    Password,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long, short)]
    pub name: Option<String>,

    #[arg(long, short)]
    pub email: Option<String>,
}

pub async fn run(ctx: &Context, command: ProfileCommand) -> Result<()> {
    ctx.require_session().await?;
    match command {
        ProfileCommand::Update(args) => update(ctx, args).await,
        ProfileCommand::Avatar { path } => avatar(ctx, &path).await,
        ProfileCommand::Password => password(ctx).await,
    }
}

async fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let update = ProfileUpdate {
        name: args.name.map(|name| name.trim().to_string()),
        email: args.email.map(|email| email.trim().to_string()),
    };
    if update.is_empty() {
        bail!("nothing to update; pass --name and/or --email");
    }
    let user = ctx.manager.update_profile(&update).await?;
    println!("Profile updated.");
    output::print_user(&user);
    Ok(())
}

async fn avatar(ctx: &Context, path: &Path) -> Result<()> {
    let update = AvatarUpdate {
        avatar: avatar_data_url(path)?,
    };
    let user = ctx.manager.update_avatar(&update).await?;
    println!("Avatar updated.");
    output::print_user(&user);
    Ok(())
}

async fn password(ctx: &Context) -> Result<()> {
    let update = PasswordUpdate {
        old_password: prompt_password("Current password: ")?,
        new_password: prompt_password("New password: ")?,
        confirm_password: prompt_password("Confirm new password: ")?,
    };
    if update.new_password.is_empty() {
        bail!("new password must not be empty");
    }
    if update.new_password != update.confirm_password {
        bail!("password confirmation does not match");
    }
    ctx.call(|gateway| gateway.update_password(&update)).await?;
    println!("Password changed.");
    Ok(())
}

/// Read an image and encode it as a base64 data URL.
///
/// Only image extensions are accepted and the file must not exceed
/// [`MAX_AVATAR_BYTES`].
pub fn avatar_data_url(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => bail!("{} is not an image (expected png, jpg, gif, or webp)", path.display()),
    };

    let size = fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .len();
    if size > MAX_AVATAR_BYTES {
        bail!("{} is larger than 5 MiB", path.display());
    }

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
