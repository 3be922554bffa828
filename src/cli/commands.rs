//! Command dispatch
//!
//! Loads settings, wires the services and runs the selected subcommand.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{RadiusReport, ReportFormat};
use crate::cli::args::{Cli, Commands, ConfigCommands, FormatArg, RadiusOverrides};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Build {
            input,
            output,
            chunk_size,
        } => cmd_build(&container, input.as_deref(), output.as_deref(), *chunk_size),
        Commands::Radii {
            tree,
            output,
            format,
            stdout,
            overrides,
        } => cmd_radii(
            &container,
            tree.as_deref(),
            output.as_deref(),
            *format,
            *stdout,
            overrides,
        ),
        Commands::Show { tree, depth } => cmd_show(&container, tree.as_deref(), *depth),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&container),
            ConfigCommands::Init { global, force } => {
                cmd_config_init(&container, *global, *force)
            }
            ConfigCommands::Path => cmd_config_path(),
            ConfigCommands::Edit { global } => cmd_config_edit(&container, *global),
        },
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_build(
    container: &ServiceContainer,
    input: Option<&Path>,
    output: Option<&Path>,
    chunk_size: Option<usize>,
) -> CliResult<()> {
    let paths = &container.settings.paths;
    let input = input.unwrap_or(&paths.input_csv);
    let output = output.unwrap_or(&paths.tree_json);

    let mut config = container.settings.builder.clone();
    if let Some(chunk_size) = chunk_size {
        if chunk_size == 0 {
            return Err(CliError::InvalidArgs("--chunk-size must be positive".into()));
        }
        config.chunk_size = chunk_size;
    }

    let summary = container.tree_service.build(input, output, &config)?;

    output::success(&format!("Tree written to {}", summary.output.display()));
    output::detail(&format!("Rows read: {}", summary.rows));
    output::detail(&format!("Total nodes: {}", summary.total_nodes));
    output::detail(&format!("Field nodes: {}", summary.field_nodes));
    output::detail(&format!("Max depth: {}", summary.max_depth));
    output::detail(&format!(
        "Top-level categories: {}",
        summary.top_level_categories.iter().join(", ")
    ));
    output::detail(&format!(
        "Completed in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    ));
    if summary.skipped_rows > 0 {
        output::warning(&format!(
            "{} rows without category were skipped",
            summary.skipped_rows
        ));
    }
    Ok(())
}

fn resolve_tree(container: &ServiceContainer, tree: Option<&Path>) -> CliResult<PathBuf> {
    Ok(container
        .radius_service
        .resolve_tree_path(tree, &container.settings.paths.tree_candidates)?)
}

#[instrument(level = "debug", skip(container, overrides))]
fn cmd_radii(
    container: &ServiceContainer,
    tree: Option<&Path>,
    output: Option<&Path>,
    format: Option<FormatArg>,
    stdout: bool,
    overrides: &RadiusOverrides,
) -> CliResult<()> {
    let config = overrides.apply_to(container.settings.radius);
    let tree = resolve_tree(container, tree)?;
    let report = container.radius_service.analyze(&tree, &config)?;

    let output = output.unwrap_or(&container.settings.paths.radii_output);
    let format = format
        .map(ReportFormat::from)
        .unwrap_or_else(|| ReportFormat::from_path(output));
    debug!("cmd_radii: format={:?}", format);

    if stdout {
        output::info(&report.render(format)?);
        return Ok(());
    }

    print_summary(&report);
    container
        .radius_service
        .write_report(&report, output, format)?;
    output::success(&format!("Configuration written to {}", output.display()));
    Ok(())
}

fn print_summary(report: &RadiusReport) {
    output::header("Tree Structure Summary:");
    output::action("Total nodes", &report.total_nodes);
    output::action("Maximum depth", &report.max_depth);
    output::info("Nodes by level:");
    for (level, count) in &report.nodes_by_level {
        let radius = report
            .optimal_radii
            .get(level)
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".into());
        output::detail(&format!("Level {level}: {count} nodes, radius {radius}"));
    }
}

fn cmd_show(container: &ServiceContainer, tree: Option<&Path>, depth: Option<usize>) -> CliResult<()> {
    let tree = resolve_tree(container, tree)?;
    let document = container.radius_service.load(&tree)?;

    if let Some(metadata) = &document.metadata {
        output::action("Source", &metadata.source_file);
        output::action("Generated", &metadata.generated_at);
    }
    output::info(&document.root.to_display_tree(depth));
    Ok(())
}

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn config_target(global: bool) -> CliResult<PathBuf> {
    if global {
        global_config_path()
            .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))
    } else {
        Ok(local_config_path(Path::new(".")))
    }
}

fn cmd_config_init(container: &ServiceContainer, global: bool, force: bool) -> CliResult<()> {
    let path = config_target(global)?;
    if container.fs.exists(&path) && !force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }
    write_template(container, &path)?;
    output::success(&format!("Created {}", path.display()));
    Ok(())
}

fn write_template(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    container
        .fs
        .ensure_parent(path)
        .and_then(|()| container.fs.write(path, &Settings::template()))
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    let marker = |p: &Path| if p.is_file() { "exists" } else { "missing" };
    match global_config_path() {
        Some(global) => output::action(
            "Global",
            &format!("{} ({})", global.display(), marker(&global)),
        ),
        None => output::action("Global", &"unavailable"),
    }
    let local = local_config_path(Path::new("."));
    output::action("Local", &format!("{} ({})", local.display(), marker(&local)));
    Ok(())
}

fn cmd_config_edit(container: &ServiceContainer, global: bool) -> CliResult<()> {
    let path = config_target(global)?;
    if !container.fs.exists(&path) {
        write_template(container, &path)?;
        output::success(&format!("Created {}", path.display()));
    }
    container
        .editor
        .open(&path)
        .map_err(|e| InfraError::Editor {
            message: format!("{}: {e}", path.display()),
        })?;
    Ok(())
}
