use crate::output::{print_json, print_table};
use anyhow::Context;
use archdraft_core::flow::project::{parse_fields, PROJECT_NAME_LABEL};
use archdraft_core::flow::{GridRow, ProjectFlow};
use archdraft_core::models::project::Project;
use clap::Subcommand;
use gemini_agent::{ProjectAgent, SpecField};
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Draft a new project with the model (stored when --user is given)
    Generate {
        name: String,
        /// Account the draft is stored for
        #[arg(long)]
        user: Option<String>,
    },
    /// Ask the model again for selected fields only
    Regenerate {
        name: String,
        #[arg(long)]
        user: Option<String>,
        /// Field to regenerate (dotted path, key or label); repeatable
        #[arg(long = "field", short = 'f', required = true)]
        fields: Vec<String>,
    },
    /// List an account's projects
    List {
        #[arg(long)]
        user: String,
    },
    /// Show every field of a stored project
    Show { id: i64 },
    /// Delete a project and everything under it
    Delete { id: i64 },
}

pub fn run(
    root: &Path,
    subcmd: ProjectSubcommand,
    api_key: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (config, db) = super::open_db(root)?;
    let agent = ProjectAgent::new(config.agent.to_agent_config(api_key))
        .context("failed to build the model client")?;
    let flow = ProjectFlow::new(db, agent);
    let rt = super::runtime()?;

    match subcmd {
        ProjectSubcommand::Generate { name, user } => {
            let generated = rt.block_on(flow.generate_project_data(user.as_deref(), &name))?;
            if json {
                return print_json(&generated);
            }
            print_rows(&generated.rows);
            if let Some(id) = generated.project_id {
                println!("\nSaved as project {id}.");
            }
        }
        ProjectSubcommand::Regenerate { name, user, fields } => {
            let fields = parse_fields(&fields)?;
            let rows =
                rt.block_on(flow.regenerate_selected_fields(user.as_deref(), &name, &fields))?;
            if json {
                return print_json(&rows);
            }
            print_rows(&rows);
        }
        ProjectSubcommand::List { user } => {
            let projects = rt.block_on(flow.list_user_projects(Some(&user)))?;
            if json {
                return print_json(&projects);
            }
            if projects.is_empty() {
                println!("No projects.");
                return Ok(());
            }
            let rows = projects
                .into_iter()
                .map(|p| vec![p.id.to_string(), p.name, p.architecture])
                .collect();
            print_table(&["ID", "NAME", "ARCHITECTURE"], rows);
        }
        ProjectSubcommand::Show { id } => {
            let project = rt
                .block_on(flow.get_project_detail(id))?
                .with_context(|| format!("project {id} not found"))?;
            if json {
                return print_json(&project);
            }
            print_project(&project);
        }
        ProjectSubcommand::Delete { id } => {
            if !rt.block_on(flow.delete_project(id))? {
                anyhow::bail!("project {id} not found");
            }
            if json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            println!("Deleted project {id}.");
        }
    }
    Ok(())
}

fn print_rows(rows: &[GridRow]) {
    if rows.is_empty() {
        println!("The model returned nothing. Check GEMINI_API_KEY or try again.");
        return;
    }
    let rows = rows
        .iter()
        .map(|r| vec![r.label.clone(), r.content.clone()])
        .collect();
    print_table(&["FIELD", "CONTENT"], rows);
}

fn print_project(p: &Project) {
    let mut rows = vec![vec![PROJECT_NAME_LABEL.to_string(), p.name.clone()]];
    rows.extend(
        SpecField::all()
            .iter()
            .map(|f| vec![f.label().to_string(), p.field(*f).to_string()]),
    );
    print_table(&["FIELD", "CONTENT"], rows);
}
