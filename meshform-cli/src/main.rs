use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use meshform_appmesh::document::{MeshDocument, RenderedDocument, render_document};

#[derive(Parser)]
#[command(name = "meshform")]
#[command(about = "Validate and render App Mesh documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Region of the stack, overriding the document
    #[arg(long, global = true, env = "MESHFORM_REGION")]
    region: Option<String>,

    /// Account id of the stack, overriding the document
    #[arg(long, global = true, env = "MESHFORM_ACCOUNT")]
    account: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mesh document
    Validate {
        /// Path to the mesh document
        file: PathBuf,
    },
    /// Render a mesh document into a CloudFormation template
    Render {
        /// Path to the mesh document
        file: PathBuf,

        /// Write the template here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show how a rendered document differs from an existing template
    Diff {
        /// Path to the mesh document
        file: PathBuf,

        /// Path to the template to compare against
        template: PathBuf,
    },
    /// Print the policy statements granted by a mesh document
    Grants {
        /// Path to the mesh document
        file: PathBuf,
    },
}

/// Stack settings given on the command line
struct Overrides {
    region: Option<String>,
    account: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let overrides = Overrides {
        region: cli.region,
        account: cli.account,
    };
    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file, &overrides),
        Commands::Render { file, output } => run_render(&file, output.as_deref(), &overrides),
        Commands::Diff { file, template } => run_diff(&file, &template, &overrides).map(|_| ()),
        Commands::Grants { file } => run_grants(&file, &overrides),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_document(path: &Path, overrides: &Overrides) -> Result<RenderedDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut document: MeshDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    document.stack = document
        .stack
        .with_overrides(overrides.region.clone(), overrides.account.clone());

    render_document(document).with_context(|| format!("Invalid document {}", path.display()))
}

fn render_template(rendered: &RenderedDocument) -> Result<String> {
    let template = rendered.to_template()?;
    let mut json = template.to_json_pretty()?;
    json.push('\n');
    Ok(json)
}

fn run_validate(path: &Path, overrides: &Overrides) -> Result<()> {
    let rendered = load_document(path, overrides)?;
    println!(
        "{}",
        format!(
            "{} is valid: {} resource(s), {} grant(s).",
            path.display(),
            rendered.resources.len(),
            rendered.grants.len()
        )
        .green()
        .bold()
    );
    for resource in &rendered.resources {
        println!(
            "  {} {} {}",
            "✓".green(),
            resource.resource.id.resource_type.cyan(),
            resource.identity.arn()
        );
    }
    Ok(())
}

fn run_render(path: &Path, output: Option<&Path>, overrides: &Overrides) -> Result<()> {
    let rendered = load_document(path, overrides)?;
    let template = render_template(&rendered)?;

    match output {
        Some(output) => {
            fs::write(output, &template)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} {} ({} resource(s))",
                "Wrote".green(),
                output.display(),
                rendered.resources.len()
            );
        }
        None => print!("{}", template),
    }
    Ok(())
}

/// Returns whether the template would change
fn run_diff(path: &Path, template_path: &Path, overrides: &Overrides) -> Result<bool> {
    let rendered = load_document(path, overrides)?;
    let rendered = render_template(&rendered)?;
    let existing = fs::read_to_string(template_path)
        .with_context(|| format!("Failed to read {}", template_path.display()))?;

    if !has_changes(&existing, &rendered) {
        println!("{}", "No changes. Template is up-to-date.".green());
        return Ok(false);
    }

    println!(
        "\n{} {}:",
        "Diff for".cyan().bold(),
        template_path.display()
    );
    let diff = TextDiff::from_lines(&existing, &rendered);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
    Ok(true)
}

fn has_changes(old: &str, new: &str) -> bool {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .any(|change| change.tag() != ChangeTag::Equal)
}

fn run_grants(path: &Path, overrides: &Overrides) -> Result<()> {
    let rendered = load_document(path, overrides)?;
    if rendered.grants.is_empty() {
        println!("{}", "No grants declared.".yellow());
        return Ok(());
    }

    for grant in &rendered.grants {
        println!("{} {}", "Principal:".cyan().bold(), grant.principal_arn);
        let statement = serde_json::to_string_pretty(&grant.statement)
            .context("Failed to serialize policy statement")?;
        println!("{}", statement);
    }
    Ok(())
}
