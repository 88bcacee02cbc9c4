use std::path::PathBuf;

use anyhow::Context;
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use menu_browser::{
    api::Backend,
    controller::{Controller, Outcome},
    table::{SortDirection, TableId},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

macro_rules! say {
    ($out:expr, $text:expr) => {
        if let Err(e) = $out.write_all(format!("{}\n", $text).as_bytes()).await {
            tracing::error!("fail to write to terminal: {e}")
        }
        if let Err(e) = $out.flush().await {
            tracing::error!("fail to flush terminal: {e}")
        }
    };
}

const HELP: &str = "\
Commands:
  cities                          list the cities
  city <name>                     pick a city (fuzzy)
  zip <code>                      pick a zipcode
  search                          list restaurants for the picked city and zipcode
  open <n>                        open the menu of row n on the current page
  items                           list every item of the open menu
  next|prev <restnames|menu>      turn a table page
  sort <restnames|menu> <column> <asc|desc>
  show                            print the page
  html <path>                     write the page as HTML
  help
  quit";

enum Action {
    Cities,
    City(String),
    Zip(String),
    Search,
    Open(usize),
    Items,
    Next(TableId),
    Prev(TableId),
    Sort(TableId, usize, SortDirection),
    Show,
    Html(PathBuf),
    Help,
    Quit,
}

impl Action {
    fn new(args: &[&str]) -> Result<Self, &'static str> {
        let table = |name: Option<&&str>| {
            name.and_then(|n| TableId::parse(n))
                .ok_or("expect a table name: restnames or menu")
        };

        match args[0] {
            "cities" => Ok(Self::Cities),
            "city" => {
                if args.len() < 2 {
                    Err("too less argument")
                } else {
                    Ok(Self::City(args[1..].join(" ")))
                }
            }
            "zip" => {
                if args.len() < 2 {
                    Err("too less argument")
                } else {
                    Ok(Self::Zip(args[1].to_string()))
                }
            }
            "search" => Ok(Self::Search),
            "open" => {
                let Some(Ok(n)) = args.get(1).map(|n| n.parse::<usize>()) else {
                    return Err("Can not parse your argument into number");
                };
                if n == 0 {
                    return Err("rows are numbered from 1");
                }
                Ok(Self::Open(n))
            }
            "items" => Ok(Self::Items),
            "next" => Ok(Self::Next(table(args.get(1))?)),
            "prev" => Ok(Self::Prev(table(args.get(1))?)),
            "sort" => {
                if args.len() < 4 {
                    return Err("too less argument");
                }
                let id = table(args.get(1))?;
                let Ok(column) = args[2].parse() else {
                    return Err("Can not parse your argument into number");
                };
                let direction = SortDirection::parse(args[3]).ok_or("expect asc or desc")?;
                Ok(Self::Sort(id, column, direction))
            }
            "show" => Ok(Self::Show),
            "html" => args
                .get(1)
                .map(|p| Self::Html(PathBuf::from(p)))
                .ok_or("too less argument"),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err("unexpected action"),
        }
    }

    // consumed the action, false once the user is done
    async fn run<B: Backend>(
        self,
        ctrl: &mut Controller<B>,
        out: &mut Stdout,
    ) -> anyhow::Result<bool> {
        match self {
            Self::Cities => {
                let cities = ctrl.page().cities.options().join("\n");
                say!(out, cities);
                return Ok(true);
            }
            Self::City(pattern) => {
                let Some(city) = resolve_city(ctrl.page().cities.options(), &pattern) else {
                    say!(out, format!("No city matches {pattern:?}"));
                    return Ok(true);
                };
                report(ctrl.on_city_selected(&city).await);
            }
            Self::Zip(zipcode) => {
                report(ctrl.on_zipcode_selected(&zipcode));
            }
            Self::Search => {
                report(ctrl.trigger_restaurant_search().await);
            }
            Self::Open(n) => {
                report(ctrl.on_restaurant_row_click(n - 1).await);
            }
            Self::Items => {
                let items = ctrl.menu_items();
                if items.is_empty() {
                    say!(out, "No menu open.");
                }
                for item in items {
                    let count = item.count.map(|c| c.to_string()).unwrap_or_default();
                    say!(out, format!("{count:>6}  {}", item.item));
                }
                return Ok(true);
            }
            Self::Next(id) => turn_page(ctrl, out, id, true).await,
            Self::Prev(id) => turn_page(ctrl, out, id, false).await,
            Self::Sort(id, column, direction) => {
                let Some(widget) = ctrl.table_mut(id) else {
                    say!(out, format!("Table {} is empty", id.as_str()));
                    return Ok(true);
                };
                if column >= widget.columns().len() {
                    say!(out, format!("Table {} has no column {column}", id.as_str()));
                    return Ok(true);
                }
                widget.sort_by(column, direction);
            }
            Self::Show => {}
            Self::Html(path) => {
                tokio::fs::write(&path, ctrl.page().render_html())
                    .await
                    .with_context(|| format!("fail to write {}", path.display()))?;
                say!(out, format!("Written to {}", path.display()));
                return Ok(true);
            }
            Self::Help => {
                say!(out, HELP);
                return Ok(true);
            }
            Self::Quit => return Ok(false),
        }

        say!(out, ctrl.page().render_text());
        Ok(true)
    }
}

async fn turn_page<B: Backend>(ctrl: &mut Controller<B>, out: &mut Stdout, id: TableId, forward: bool) {
    let Some(widget) = ctrl.table_mut(id) else {
        say!(out, format!("Table {} is empty", id.as_str()));
        return;
    };
    let moved = if forward {
        widget.next_page()
    } else {
        widget.previous_page()
    };
    if !moved {
        say!(out, "No more pages.");
    }
}

fn report(outcome: Outcome) {
    if outcome == Outcome::Stale {
        tracing::debug!("response arrived after the selection moved on");
    }
}

fn resolve_city(cities: &[String], pattern: &str) -> Option<String> {
    if let Some(city) = cities.iter().find(|c| c.eq_ignore_ascii_case(pattern)) {
        return Some(city.clone());
    }

    let matcher = SkimMatcherV2::default();
    cities
        .iter()
        .filter_map(|city| matcher.fuzzy_match(city, pattern).map(|score| (score, city)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, city)| city.clone())
}

pub(super) async fn repl<B: Backend>(ctrl: &mut Controller<B>) -> anyhow::Result<()> {
    let mut out = tokio::io::stdout();

    ctrl.load_cities().await;
    say!(out, ctrl.page().render_text());
    say!(out, "Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("fail to read stdin")? {
        let arguments = line.split_whitespace().collect::<Vec<_>>();
        if arguments.is_empty() {
            continue;
        }

        let action = match Action::new(&arguments) {
            Ok(action) => action,
            Err(hint) => {
                say!(out, format!("{hint}\n\n{HELP}"));
                continue;
            }
        };

        if !action.run(ctrl, &mut out).await? {
            break;
        }
    }

    Ok(())
}
