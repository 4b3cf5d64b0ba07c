use super::confirm;
use crate::cli::CategoryCommand;
use crate::util::resolve_category;
use crate::views::table::display_categories;
use anyhow::Result;
use gather_core::repository::Repository;
use owo_colors::OwoColorize;

pub async fn category_command(repo: &impl Repository, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::Add { name, slug } => {
            let category = repo.add_category(name, slug).await?;
            println!(
                "{} Added category '{}' ({})",
                "✓".green(),
                category.name.bold(),
                category.slug
            );
        }
        CategoryCommand::List => {
            let categories = repo.list_categories().await?;
            let mut rows = Vec::with_capacity(categories.len());
            for category in categories {
                let usage = repo.category_usage(category.id).await?;
                rows.push((category, usage));
            }
            display_categories(&rows);
        }
        CategoryCommand::Delete(args) => {
            let category = resolve_category(repo, &args.id).await?;
            let usage = repo.category_usage(category.id).await?;
            let prompt = format!(
                "Delete category '{}'? {} events and {} series will be left uncategorized.",
                category.name, usage.events, usage.series
            );
            if !confirm(prompt, args.force) {
                return Ok(());
            }
            repo.delete_category(category.id).await?;
            println!("{} Deleted category '{}'", "✓".green(), category.name.bold());
        }
    }
    Ok(())
}
