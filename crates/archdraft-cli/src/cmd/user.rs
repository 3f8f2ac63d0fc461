use crate::output::print_json;
use archdraft_core::flow::{LoginFlow, LoginOutcome};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Create an account
    Register {
        account: String,
        #[arg(long, env = "ARCHDRAFT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check an account's password
    Login {
        account: String,
        #[arg(long, env = "ARCHDRAFT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, db) = super::open_db(root)?;
    let flow = LoginFlow::new(db);
    let rt = super::runtime()?;

    let outcome = rt.block_on(async {
        match subcmd {
            UserSubcommand::Register { account, password } => {
                flow.register(&account, &password).await
            }
            UserSubcommand::Login { account, password } => flow.login(&account, &password).await,
        }
    })?;

    report(&outcome, json)
}

fn report(outcome: &LoginOutcome, json: bool) -> anyhow::Result<()> {
    let ok = matches!(
        outcome,
        LoginOutcome::Registered(_) | LoginOutcome::Success(_)
    );
    if !ok {
        anyhow::bail!("{}", outcome.message());
    }
    if json {
        print_json(&outcome.notice())
    } else {
        println!("{}", outcome.message());
        Ok(())
    }
}
