use anyhow::{Context, Result};
use colored::*;

use crate::cli::{AppContext, GlobalArgs};
use crate::wizard::{Block, BlockKind, Course};

#[derive(Debug, Clone, clap::Args)]
pub struct CourseArgs {
    /// Print the blocks as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_course_command(global: &GlobalArgs, args: CourseArgs) -> Result<()> {
    let context = AppContext::load(global)?;
    let course = context.config.course()?;

    if args.json {
        let json = serde_json::to_string_pretty(course.blocks())
            .context("Failed to serialize course")?;
        println!("{}", json);
        return Ok(());
    }

    print!("{}", describe(&course));
    Ok(())
}

fn kind_label(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::NameInput => "name input",
        BlockKind::TownInput => "city input",
        BlockKind::Plain => "plain",
    }
}

fn describe_block(index: usize, block: &Block) -> String {
    let mut out = format!(
        "{} {} {}\n",
        format!("{}.", index + 1).bold(),
        block.title.bright_white().bold(),
        format!("[{}]", kind_label(block.kind)).dimmed()
    );
    for line in block.text.lines() {
        out.push_str(&format!("   {}\n", line));
    }
    if let Some(url) = block.remote_image() {
        out.push_str(&format!("   {} {}\n", "image:".dimmed(), url));
    }
    for button in &block.buttons {
        out.push_str(&format!(
            "   {} {} {}\n",
            "→".cyan(),
            button.text,
            format!("({})", button.action).dimmed()
        ));
    }
    out
}

fn describe(course: &Course) -> String {
    let blocks = course
        .blocks()
        .iter()
        .enumerate()
        .map(|(i, block)| describe_block(i, block))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{} {}\n\n{}",
        "Greeting marker:".dimmed(),
        course.greeting(),
        blocks
    )
}
