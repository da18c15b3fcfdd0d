use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recipe_search_core::models::Recipe;
use recipe_search_core::state::ListState;

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Ready")]
        ready: String,
        #[tabled(rename = "Fav")]
        favourite: &'static str,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: i + 1,
            id: r.id,
            title: if r.title.is_empty() {
                "(untitled)".to_string()
            } else {
                truncate(&r.title, 50)
            },
            ready: {
                let mins = r.display_ready_minutes();
                format!("{mins} min")
            },
            favourite: if r.is_favourite { "★" } else { "" },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Print a settled list as a table or JSON. Exits with 2 when it is empty.
pub(crate) fn print_list(list: &ListState, json: bool, empty_message: &str) -> Result<()> {
    if let Some(error) = &list.error {
        bail!("{error}");
    }

    if list.recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&list.recipes)?);
    } else {
        print_recipe_table(&list.recipes);
    }
    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max.saturating_sub(3)).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Soup", 10), "Soup");
        assert_eq!(truncate("Slow Cooker Chicken Tikka Masala", 15), "Slow Cooker ...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème brûlée au café", 10), "Crème b...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
        assert_eq!(truncate("親子丼と味噌汁のセット", 8), "親子丼と味...");
    }

    #[test]
    fn test_truncate_tiny_width() {
        assert_eq!(truncate("Soup", 2), "...");
        assert_eq!(truncate("Soup", 0), "...");
    }

    #[test]
    fn test_print_list_surfaces_error() {
        let list = ListState {
            recipes: Vec::new(),
            is_loading: false,
            error: Some("Server error: 402".to_string()),
            generation: 1,
        };
        let err = print_list(&list, false, "nothing").unwrap_err();
        assert_eq!(err.to_string(), "Server error: 402");
    }
}
