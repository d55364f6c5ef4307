use anyhow::{Result, bail};
use clap::Subcommand;
use shared::models::{Role, RoleUpdate};

use super::{Context, confirm, output};

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List every account
    List {
        #[arg(long, short, default_value_t = 1)]
        page: u32,

        #[arg(long, short, default_value_t = 10)]
        limit: u32,
    },
    /// Delete an account
    Delete {
        /// Account id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Change an account's role
    Role {
        /// Account id
        id: String,

        /// `user` or `admin`
        role: Role,
    },
}

pub async fn run(ctx: &Context, command: UsersCommand) -> Result<()> {
    let admin = ctx.require_admin().await?;
    match command {
        UsersCommand::List { page, limit } => {
            let result = ctx
                .call(|gateway| gateway.all_users(page.max(1), limit.max(1)))
                .await?;
            if ctx.json {
                return output::print_json(&result);
            }
            output::print_users(&result.users, &result.pagination);
        }
        UsersCommand::Delete { id, yes } => {
            if id == admin.id {
                bail!("refusing to delete the account you are signed in with");
            }
            if !yes && !confirm(&format!("Delete account {id}?"))? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.call(|gateway| gateway.delete_user(&id)).await?;
            println!("Account {id} deleted.");
        }
        UsersCommand::Role { id, role } => {
            let update = RoleUpdate {
                user_id: id.clone(),
                role,
            };
            ctx.call(|gateway| gateway.update_user_role(&update)).await?;
            println!("Account {id} is now {role}.");
        }
    }
    Ok(())
}
