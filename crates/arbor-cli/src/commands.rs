use std::path::Path;

use arbor_sdk::commands::{
    Checkout, Commit, Create, Destroy, Diff, Log, Reset, SetConfig, Status, Tree,
};
use arbor_sdk::{AssetId, ChangeState, WorkingCopy};
use colored::{ColoredString, Colorize};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.directory.as_path();
    match cli.command {
        Command::Init(args) => cmd_init(dir, args),
        Command::Create(args) => cmd_create(dir, args),
        Command::Commit(args) => cmd_commit(dir, args),
        Command::Checkout(args) => cmd_checkout(dir, args),
        Command::Diff(args) => cmd_diff(dir, args),
        Command::Tree(args) => cmd_tree(dir, args),
        Command::Destroy(args) => cmd_destroy(dir, args),
        Command::Status(_) => cmd_status(dir),
        Command::Log(args) => cmd_log(dir, args),
        Command::Reset(_) => cmd_reset(dir),
        Command::Config(args) => cmd_config(dir, args),
    }
}

fn cmd_init(dir: &Path, args: InitArgs) -> anyhow::Result<()> {
    let wc = WorkingCopy::init(dir, &args.reference)?;
    println!(
        "{} Initialized arbor working copy in {}",
        "✓".green().bold(),
        wc.root().display().to_string().bold()
    );
    println!("  Reference: {}", args.reference.yellow());
    Ok(())
}

fn cmd_create(dir: &Path, args: CreateArgs) -> anyhow::Result<()> {
    let mut wc = WorkingCopy::attach(dir)?;
    let id = Create::new(&mut wc, &args.reference).run()?;
    println!(
        "{} Created reference {} at {}",
        "✓".green().bold(),
        args.reference.yellow().bold(),
        id.short().dimmed()
    );
    Ok(())
}

fn cmd_commit(dir: &Path, args: CommitArgs) -> anyhow::Result<()> {
    let mut wc = WorkingCopy::attach(dir)?;
    let id = Commit::new(&mut wc, args.message).run()?;
    println!(
        "{} Committed {} on {}",
        "✓".green().bold(),
        id.to_string().cyan(),
        wc.active_reference_name().yellow()
    );
    Ok(())
}

fn cmd_checkout(dir: &Path, args: CheckoutArgs) -> anyhow::Result<()> {
    let mut wc = WorkingCopy::attach(dir)?;
    let written = Checkout::new(&mut wc, &args.reference)
        .force(args.force)
        .create(args.create)
        .policy(args.policy)
        .run()?;
    println!(
        "Switched to {} ({} files written)",
        args.reference.yellow().bold(),
        written.len()
    );
    Ok(())
}

fn cmd_diff(dir: &Path, args: DiffArgs) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    let report = Diff::new(&wc, args.range).content(args.content).run()?;
    if report.diff.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for (path, state) in report.diff.changes() {
        let (old, new) = report.diff.ids(path).unwrap_or_default();
        println!(
            "{} {}  {} -> {}",
            colored_state(state),
            path,
            short_or_dash(&old).dimmed(),
            short_or_dash(&new).dimmed()
        );
        if let Some(blob) = report.blobs.get(path) {
            for line in blob.render().lines() {
                match line.chars().next() {
                    Some('+') => println!("{}", line.green()),
                    Some('-') => println!("{}", line.red()),
                    Some('@') => println!("{}", line.cyan()),
                    _ => println!("{line}"),
                }
            }
        }
    }
    Ok(())
}

fn cmd_tree(dir: &Path, args: TreeArgs) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    for listing in Tree::new(&wc).show_all(args.all).run()? {
        let line = listing.render(args.verbose, args.all);
        if listing.current && args.all {
            println!("{}", line.green().bold());
        } else {
            println!("{line}");
        }
    }
    Ok(())
}

fn cmd_destroy(dir: &Path, args: DestroyArgs) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    Destroy::new(&wc, &args.reference).run()?;
    println!("Destroyed reference {}", args.reference.yellow());
    Ok(())
}

fn cmd_status(dir: &Path) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    let report = Status::new(&wc).run()?;
    println!("On reference {}", report.reference.yellow().bold());
    for line in report.lines() {
        match line.chars().next() {
            Some('A') => println!("{}", line.green()),
            Some('D') => println!("{}", line.red()),
            Some('M') => println!("{}", line.yellow()),
            _ => println!("{}", line.dimmed()),
        }
    }
    if report.is_clean() {
        println!("{}", report.summary().green());
    } else {
        println!("{}", report.summary().red());
    }
    Ok(())
}

fn cmd_log(dir: &Path, args: LogArgs) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    for entry in Log::new(&wc, args.range).run()? {
        println!("{} {}", "tree".yellow(), entry.id.to_string().yellow());
        println!("Author: {} <{}>", entry.author, entry.email);
        println!();
        for line in entry.message.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

fn cmd_reset(dir: &Path) -> anyhow::Result<()> {
    let wc = WorkingCopy::attach(dir)?;
    let summary = Reset::new(&wc).run()?;
    for path in &summary.restored {
        println!("  {} {path}", "restored:".green());
    }
    for path in &summary.removed {
        println!("  {} {path}", "removed:".red());
    }
    if summary.restored.is_empty() && summary.removed.is_empty() {
        println!("Nothing to reset.");
    }
    Ok(())
}

fn cmd_config(dir: &Path, args: ConfigArgs) -> anyhow::Result<()> {
    let mut wc = WorkingCopy::attach(dir)?;
    match args.value {
        Some(value) => {
            SetConfig::new(&mut wc, &args.key, &value).run()?;
            println!("Set {} = {}", args.key.bold(), value);
        }
        None => match wc.config().get(&args.key)? {
            Some(value) => println!("{} = {}", args.key.bold(), value),
            None => println!("{} = {}", args.key.bold(), "(not set)".dimmed()),
        },
    }
    Ok(())
}

fn colored_state(state: ChangeState) -> ColoredString {
    let symbol = state.symbol().to_string();
    match state {
        ChangeState::Added => symbol.green(),
        ChangeState::Removed => symbol.red(),
        ChangeState::Modified => symbol.yellow(),
    }
}

fn short_or_dash(id: &AssetId) -> &str {
    if id.is_empty() {
        "-"
    } else {
        id.short()
    }
}
