use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    io::{self, stdin},
    path::PathBuf,
};
use tracing::info;

use sizzle::{
    app::CookingApp,
    app_dirs::AppDirs,
    book::{RecipeBook, RecipeFilter, SortOrder},
    config::{Config, ConfigStore, FileConfigStore, Overrides},
    logging::init_logging,
    recipe::{CookSettings, Difficulty, Recipe, RecipeId, RecipeStep, StepKind},
    runtime::{CookEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::AdvancePolicy,
    store::{FileRecipeStore, RecipeStore},
    util::{format_minutes, truncate_width},
};

/// recipe book with a guided, timed cooking session
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Author recipes and cook them step by step with a timer that keeps up with the wall clock, survives pauses and skips ahead when you're done early."
)]
pub struct Cli {
    /// recipe file to use instead of the default location
    #[clap(long, global = true)]
    data_file: Option<PathBuf>,

    /// milliseconds between timer ticks
    #[clap(long = "tick-ms", global = true)]
    tick_ms: Option<u64>,

    /// how a long tick moves through steps that ran out
    #[clap(long, value_enum, global = true)]
    advance_policy: Option<AdvancePolicy>,

    /// do not fill an empty recipe book with the bundled samples
    #[clap(long, global = true)]
    no_samples: bool,

    /// more logging (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// list recipes, quickest first
    List {
        /// only these difficulties (repeatable)
        #[clap(short, long, value_enum)]
        difficulty: Vec<Difficulty>,

        /// only favorites
        #[clap(long)]
        favorites: bool,

        /// match title or cuisine
        #[clap(short, long)]
        search: Option<String>,

        /// sort by total time
        #[clap(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
    },
    /// show one recipe with its steps
    Show { id: String },
    /// author a new recipe
    Add {
        #[clap(long)]
        title: String,

        #[clap(long, value_enum)]
        difficulty: Difficulty,

        #[clap(long)]
        cuisine: Option<String>,

        /// a step as "description=minutes", or "description=minutes@temp/speed"
        /// for a cooking step (repeatable, in order)
        #[clap(long = "step", value_parser = parse_step, required = true)]
        steps: Vec<RecipeStep>,
    },
    /// change an existing recipe
    Edit {
        id: String,

        #[clap(long)]
        title: Option<String>,

        #[clap(long, value_enum)]
        difficulty: Option<Difficulty>,

        #[clap(long)]
        cuisine: Option<String>,

        /// replaces all steps when given
        #[clap(long = "step", value_parser = parse_step)]
        steps: Vec<RecipeStep>,
    },
    /// remove a recipe
    Delete { id: String },
    /// toggle the favorite flag
    Favorite { id: String },
    /// run a guided cooking session
    Cook { id: String },
    /// print the effective settings, optionally keeping them
    Config {
        /// write them to the config file so later runs pick them up
        #[clap(long)]
        save: bool,
    },
}

fn parse_step(s: &str) -> Result<RecipeStep, String> {
    let (description, rest) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected \"description=minutes\", got \"{s}\""))?;
    let description = description.trim();
    if description.is_empty() {
        return Err("step description is empty".to_string());
    }

    let (minutes, settings) = match rest.split_once('@') {
        Some((minutes, settings)) => (minutes, Some(parse_settings(settings)?)),
        None => (rest, None),
    };
    let minutes: u32 = minutes
        .trim()
        .parse()
        .map_err(|_| format!("\"{}\" is not a whole number of minutes", minutes.trim()))?;
    if minutes == 0 {
        return Err("step duration must be greater than 0".to_string());
    }

    Ok(match settings {
        Some(settings) => RecipeStep::cooking(description, minutes, settings),
        None => RecipeStep::new(description, minutes),
    })
}

/// `TEMP/SPEED`, e.g. `180/3`
fn parse_settings(s: &str) -> Result<CookSettings, String> {
    let (temperature, speed) = s
        .split_once('/')
        .ok_or_else(|| format!("expected \"temperature/speed\", got \"{}\"", s.trim()))?;
    let temperature: u16 = temperature
        .trim()
        .trim_end_matches(['C', 'c'])
        .parse()
        .map_err(|_| format!("\"{}\" is not a temperature", temperature.trim()))?;
    let speed: u8 = speed
        .trim()
        .parse()
        .map_err(|_| format!("\"{}\" is not a speed", speed.trim()))?;
    CookSettings::new(temperature, speed).map_err(|e| e.to_string())
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            tick_interval_ms: self.tick_ms,
            advance_policy: self.advance_policy,
            recipes_path: self.data_file.clone(),
        }
    }

    fn config(&self, store: &impl ConfigStore) -> Config {
        let mut cfg = store.load().apply_overrides(&self.overrides());
        if self.no_samples {
            cfg.seed_sample_recipes = false;
        }
        cfg
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, AppDirs::log_path().as_deref());

    let config_store = FileConfigStore::new();
    let cfg = cli.config(&config_store);

    let store = match &cfg.recipes_path {
        Some(path) => FileRecipeStore::with_path(path),
        None => FileRecipeStore::new(),
    };
    info!(path = %store.path().display(), "opening recipe book");
    let book = RecipeBook::open_seeded(store, cfg.seed_sample_recipes)
        .context("failed to seed sample recipes")?;

    run_command(&cli, &cfg, &config_store, book)
}

fn run_command<S: RecipeStore>(
    cli: &Cli,
    cfg: &Config,
    config_store: &impl ConfigStore,
    mut book: RecipeBook<S>,
) -> Result<()> {
    match cli.command.clone() {
        Commands::List {
            difficulty,
            favorites,
            search,
            order,
        } => {
            let filter = RecipeFilter {
                difficulties: difficulty,
                favorites_only: favorites,
                search,
            };
            let found = book.query(&filter, order);
            if found.is_empty() {
                println!("no recipes match");
            }
            for recipe in found {
                println!("{}", list_line(recipe));
            }
        }
        Commands::Show { id } => {
            let recipe = find(&book, &id)?;
            print!("{}", describe(recipe));
        }
        Commands::Add {
            title,
            difficulty,
            cuisine,
            steps,
        } => {
            let mut recipe = Recipe::new(title, difficulty, steps);
            recipe.cuisine = cuisine;
            let added = book.add(recipe).context("failed to save recipe")?;
            println!("added {}", added.id);
        }
        Commands::Edit {
            id,
            title,
            difficulty,
            cuisine,
            steps,
        } => {
            let mut recipe = find(&book, &id)?.clone();
            if let Some(title) = title {
                recipe.title = title;
            }
            if let Some(difficulty) = difficulty {
                recipe.difficulty = difficulty;
            }
            if cuisine.is_some() {
                recipe.cuisine = cuisine;
            }
            if !steps.is_empty() {
                recipe.steps = steps;
            }
            book.update(recipe).context("failed to save recipe")?;
            println!("updated {id}");
        }
        Commands::Delete { id } => {
            if !book
                .delete(&RecipeId::from(id.as_str()))
                .context("failed to save recipes")?
            {
                bail!("no recipe with id {id}");
            }
            println!("deleted {id}");
        }
        Commands::Favorite { id } => {
            match book
                .toggle_favorite(&RecipeId::from(id.as_str()))
                .context("failed to save recipes")?
            {
                Some(true) => println!("{id} is now a favorite"),
                Some(false) => println!("{id} is no longer a favorite"),
                None => bail!("no recipe with id {id}"),
            }
        }
        Commands::Config { save } => show_config(cfg, save.then_some(config_store))?,
        Commands::Cook { id } => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            let mut app = CookingApp::new(book, &RecipeId::from(id.as_str()), cfg.advance_policy)
                .with_context(|| format!("no recipe with id {id}"))?;
            let mut runner = Runner::new(
                CrosstermEventSource::new(),
                FixedTicker::new(cfg.tick_interval()),
            );
            start_tui(&mut app, &mut runner)?;
            if let Some(status) = &app.status {
                println!("{status}");
            }
        }
    }
    Ok(())
}

fn show_config(cfg: &Config, save_to: Option<&impl ConfigStore>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(cfg)?);
    if let Some(store) = save_to {
        store.save(cfg).context("failed to write config")?;
        info!("config saved");
        println!("saved");
    }
    Ok(())
}

fn find<'a, S: RecipeStore>(book: &'a RecipeBook<S>, id: &str) -> Result<&'a Recipe> {
    book.get(&RecipeId::from(id))
        .with_context(|| format!("no recipe with id {id}"))
}

fn list_line(recipe: &Recipe) -> String {
    format!(
        "{:<16} {:<34} {:<7} {:>7} {:>3} steps{}",
        recipe.id,
        truncate_width(&recipe.title, 30),
        recipe.difficulty.to_string(),
        format_minutes(recipe.total_minutes()),
        recipe.steps.len(),
        if recipe.is_favorite { "  ♥" } else { "" }
    )
}

fn describe(recipe: &Recipe) -> String {
    let mut out = format!("{} ({})\n", recipe.title, recipe.id);
    if let Some(cuisine) = &recipe.cuisine {
        out.push_str(&format!("cuisine:    {cuisine}\n"));
    }
    out.push_str(&format!("difficulty: {}\n", recipe.difficulty));
    out.push_str(&format!("total time: {}\n", format_minutes(recipe.total_minutes())));
    out.push_str(&format!("complexity: {}\n", recipe.complexity_score()));
    out.push_str(&format!("favorite:   {}\n", if recipe.is_favorite { "yes" } else { "no" }));
    for (idx, step) in recipe.steps.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {} ({}m)",
            idx + 1,
            step.description,
            step.duration_minutes
        ));
        if let (StepKind::Cooking, Some(settings)) = (step.kind, &step.cooking_settings) {
            out.push_str(&format!(" [{settings}]"));
        }
        out.push('\n');
    }
    out
}

fn start_tui<S, E, T>(app: &mut CookingApp<S>, runner: &mut Runner<E, T>) -> Result<()>
where
    S: RecipeStore,
    E: CookEventSource,
    T: Ticker,
{
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = cook_loop(&mut terminal, app, runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn cook_loop<B, S, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut CookingApp<S>,
    runner: &mut Runner<E, T>,
) -> Result<()>
where
    B: Backend,
    S: RecipeStore,
    E: CookEventSource,
    T: Ticker,
{
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        let event = runner.step();
        app.handle_event(&event, Utc::now());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use sizzle::runtime::{CookEvent, TestEventSource};
    use sizzle::store::MemoryRecipeStore;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_cli_list_defaults() {
        let cli = Cli::parse_from(["sizzle", "list"]);
        assert!(cli.data_file.is_none());
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::List {
                difficulty,
                favorites,
                search,
                order,
            } => {
                assert!(difficulty.is_empty());
                assert!(!favorites);
                assert!(search.is_none());
                assert_eq!(order, SortOrder::Asc);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "sizzle",
            "cook",
            "sample-1",
            "--tick-ms",
            "250",
            "--advance-policy",
            "single",
            "-vv",
        ]);
        assert_eq!(cli.tick_ms, Some(250));
        assert_eq!(cli.advance_policy, Some(AdvancePolicy::Single));
        assert_eq!(cli.verbose, 2);

        let overrides = cli.overrides();
        assert_eq!(overrides.tick_interval_ms, Some(250));
    }

    #[test]
    fn test_cli_list_filters() {
        let cli = Cli::parse_from([
            "sizzle", "list", "-d", "easy", "-d", "hard", "--favorites", "--order", "desc",
        ]);
        match cli.command {
            Commands::List {
                difficulty, order, ..
            } => {
                assert_eq!(difficulty, vec![Difficulty::Easy, Difficulty::Hard]);
                assert_eq!(order, SortOrder::Desc);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_overrides_layer_on_stored_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        store
            .save(&Config {
                tick_interval_ms: 500,
                advance_policy: AdvancePolicy::Single,
                ..Config::default()
            })
            .unwrap();

        let cli = Cli::parse_from(["sizzle", "config", "--tick-ms", "100", "--no-samples"]);
        let cfg = cli.config(&store);
        assert_eq!(cfg.tick_interval_ms, 100);
        assert_eq!(cfg.advance_policy, AdvancePolicy::Single);
        assert!(!cfg.seed_sample_recipes);
    }

    #[test]
    fn test_cli_add_parses_steps() {
        let cli = Cli::parse_from([
            "sizzle",
            "add",
            "--title",
            "Tea",
            "--difficulty",
            "easy",
            "--step",
            "boil water=3",
            "--step",
            "steep = 4",
        ]);
        match cli.command {
            Commands::Add { steps, .. } => {
                assert_eq!(
                    steps,
                    vec![RecipeStep::new("boil water", 3), RecipeStep::new("steep", 4)]
                );
            }
            other => panic!("expected add, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_add_requires_a_step() {
        let res = Cli::try_parse_from(["sizzle", "add", "--title", "Tea", "--difficulty", "easy"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_step_errors() {
        assert!(parse_step("no separator").is_err());
        assert!(parse_step("=5").is_err());
        assert!(parse_step("wait=0").is_err());
        assert!(parse_step("wait=ten").is_err());
        assert_eq!(parse_step("a=b=2").unwrap(), RecipeStep::new("a=b", 2));
    }

    #[test]
    fn test_parse_cooking_step() {
        assert_eq!(
            parse_step("Bake in oven=30@180C/2").unwrap(),
            RecipeStep::cooking("Bake in oven", 30, CookSettings::new(180, 2).unwrap())
        );
        assert_eq!(
            parse_step("Simmer = 10 @ 100 / 1").unwrap().cooking_settings,
            Some(CookSettings::new(100, 1).unwrap())
        );
        assert!(parse_step("Bake=30@180").is_err());
        assert!(parse_step("Bake=30@250/2").unwrap_err().contains("temperature"));
        assert!(parse_step("Bake=30@180/9").unwrap_err().contains("speed"));
    }

    #[test]
    fn test_describe_lists_steps() {
        let recipe = sizzle::samples::sample_recipes().remove(1);
        let text = describe(&recipe);
        assert!(text.starts_with("Simple Chocolate Cake (sample-2)"));
        assert!(text.contains("total time: 55m"));
        assert!(text.contains("complexity: 6"));
        assert!(text.contains("  5. Bake in preheated oven (30m) [180°C, speed 2]"));
        assert!(text.contains("  2. Mix dry ingredients: flour, sugar, and cocoa powder (3m)\n"));
    }

    #[test]
    fn test_list_line_marks_favorites() {
        let samples = sizzle::samples::sample_recipes();
        assert!(list_line(&samples[1]).ends_with('♥'));
        assert!(!list_line(&samples[0]).ends_with('♥'));
    }

    #[test]
    fn test_cook_loop_exits_when_input_closes() {
        let book = RecipeBook::open_seeded(MemoryRecipeStore::default(), true).unwrap();
        let mut app =
            CookingApp::new(book, &RecipeId::from("sample-2"), AdvancePolicy::Cascade).unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(CookEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_secs(1)),
        );

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        cook_loop(&mut terminal, &mut app, &mut runner).unwrap();

        assert!(app.should_quit);
        assert!(app.sessions.is_empty());
    }

    #[test]
    fn test_cook_loop_quits_on_q() {
        let book = RecipeBook::open_seeded(MemoryRecipeStore::default(), true).unwrap();
        let mut app =
            CookingApp::new(book, &RecipeId::from("sample-1"), AdvancePolicy::Cascade).unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(CookEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
        tx.send(CookEvent::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)))
            .unwrap();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(50)),
        );

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        cook_loop(&mut terminal, &mut app, &mut runner).unwrap();

        assert!(app.should_quit);
        assert!(app.sessions.is_empty());
    }
}
