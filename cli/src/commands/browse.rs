use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use recipe_search_core::state::{BrowseState, ListKind, ListState};

use super::Engine;
use super::favourite::find_recipe;
use super::helpers::print_recipe_table;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Query(String),
    Favourite(i64),
    Refresh,
    Clear,
    Favourites,
    Help,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.trim().strip_prefix('/') else {
        return Input::Query(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("fav" | "f"), Some(id)) => id
            .parse()
            .map_or_else(|_| Input::Invalid(format!("Invalid recipe id '{id}'")), Input::Favourite),
        (Some("fav" | "f"), None) => Input::Invalid("Usage: /fav <id>".to_string()),
        (Some("refresh" | "r"), _) => Input::Refresh,
        (Some("clear" | "c"), _) => Input::Clear,
        (Some("favs"), _) => Input::Favourites,
        (Some("help" | "h" | "?"), _) => Input::Help,
        (Some("quit" | "q" | "exit"), _) => Input::Quit,
        (Some(other), _) => Input::Invalid(format!("Unknown command '/{other}'. Type /help")),
        (None, _) => Input::Invalid("Empty command. Type /help".to_string()),
    }
}

fn print_help() {
    eprintln!("Type to search (results update after you stop typing).");
    eprintln!("  /fav <id>   toggle a favourite");
    eprintln!("  /favs       show favourites");
    eprintln!("  /refresh    reload popular and search results");
    eprintln!("  /clear      clear the search");
    eprintln!("  /quit       leave");
}

/// What was last printed for one list, so unchanged lists aren't reprinted.
type Printed = (u64, Vec<(i64, bool)>, Option<String>);

#[derive(Default)]
struct Screen {
    lists: [Option<Printed>; 3],
    notice: Option<String>,
}

impl Screen {
    fn render(&mut self, state: &BrowseState) {
        for (slot, kind) in ListKind::ALL.into_iter().enumerate() {
            let list = state.list(kind);
            if list.is_loading {
                continue;
            }
            let printed = fingerprint(list);
            if self.lists[slot].as_ref() == Some(&printed) {
                continue;
            }
            print_section(kind, state, list);
            self.lists[slot] = Some(printed);
        }

        if state.notice != self.notice {
            if let Some(notice) = &state.notice {
                eprintln!("! {notice}");
            }
            self.notice.clone_from(&state.notice);
        }
    }
}

fn fingerprint(list: &ListState) -> Printed {
    (
        list.generation,
        list.recipes.iter().map(|r| (r.id, r.is_favourite)).collect(),
        list.error.clone(),
    )
}

fn print_section(kind: ListKind, state: &BrowseState, list: &ListState) {
    let heading = match kind {
        ListKind::Search if state.query.is_searching => format!("Results for '{}'", state.query.text),
        ListKind::Search => "Suggested".to_string(),
        ListKind::Popular => "Popular".to_string(),
        ListKind::Favorites => "Favourites".to_string(),
    };
    println!("\n{heading}");
    if let Some(error) = &list.error {
        eprintln!("  {error}");
    }
    if list.recipes.is_empty() {
        println!("  (none)");
    } else {
        print_recipe_table(&list.recipes);
    }
}

pub(crate) async fn cmd_browse(engine: &Engine) -> Result<()> {
    print_help();

    let mut rx = engine.subscribe();
    let screen = tokio::spawn(async move {
        let mut screen = Screen::default();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            screen.render(&state);
        }
    });

    drop(engine.start());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Query(text) => engine.set_query(text),
            Input::Favourite(id) => {
                let Some(recipe) = find_recipe(&engine.snapshot(), id) else {
                    eprintln!("Recipe {id} isn't on screen");
                    continue;
                };
                engine.dismiss_notice();
                let engine = engine.clone();
                // Failures are rolled back and shown as a notice
                tokio::spawn(async move {
                    if let Err(e) = engine.toggle_favourite(recipe).await {
                        warn!(id, error = %e, "toggle failed");
                    }
                });
            }
            Input::Refresh => drop(engine.refresh()),
            Input::Clear => drop(engine.clear_search()),
            Input::Favourites => drop(engine.load_favourites()),
            Input::Help => print_help(),
            Input::Quit => break,
            Input::Invalid(message) => eprintln!("{message}"),
        }
    }

    screen.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_query() {
        assert_eq!(parse_input("chicken curry\n"), Input::Query("chicken curry".into()));
        assert_eq!(parse_input(""), Input::Query(String::new()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/fav 716429"), Input::Favourite(716_429));
        assert_eq!(parse_input("/f 5"), Input::Favourite(5));
        assert_eq!(parse_input("/refresh"), Input::Refresh);
        assert_eq!(parse_input(" /clear "), Input::Clear);
        assert_eq!(parse_input("/favs"), Input::Favourites);
        assert_eq!(parse_input("/q"), Input::Quit);
        assert_eq!(parse_input("/?"), Input::Help);
    }

    #[test]
    fn test_parse_invalid_commands() {
        assert!(matches!(parse_input("/fav"), Input::Invalid(_)));
        assert!(matches!(parse_input("/fav soup"), Input::Invalid(_)));
        assert!(matches!(parse_input("/dance"), Input::Invalid(_)));
        assert!(matches!(parse_input("/"), Input::Invalid(_)));
    }

    #[test]
    fn test_fingerprint_tracks_flags() {
        let mut list = ListState::default();
        list.recipes.push(recipe_search_core::models::Recipe {
            id: 1,
            image_url: String::new(),
            title: "Soup".into(),
            ready_in_minutes: 0,
            is_favourite: false,
        });
        let before = fingerprint(&list);
        list.recipes[0].is_favourite = true;
        assert_ne!(before, fingerprint(&list));
    }
}
