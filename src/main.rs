// ============================================================================
// Tokenfolio - Suivi de portefeuille crypto en TUI
// ============================================================================
// Architecture :
// - Thread UI (main) : possède l'App (Store, vue Portfolio, dialogue)
//   et exécute la boucle render -> input -> tick
// - Thread worker : runtime tokio + client CoinGecko ; reçoit des
//   AppCommand, lance une tâche par commande et renvoie des AppResult
//
// CONCEPTS RUST CLÉS :
// 1. mpsc channels : communication UI <-> worker sans état partagé
// 2. runtime.spawn : les requêtes trending/search/markets s'entrelacent
// 3. Terminal raw mode, restauré même en cas d'erreur
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use tokenfolio::api::{CoinGeckoClient, MarketDataClient, MarketsQuery};
use tokenfolio::app::{App, MarketsPurpose};
use tokenfolio::config::Config;
use tokenfolio::models::{CoinLite, MarketQuote};
use tokenfolio::notify::UpdateNotifier;
use tokenfolio::portfolio::PortfolioView;
use tokenfolio::search::{SearchRequest, TrendingRequest};
use tokenfolio::storage::{FileStore, KeyValueStore, WatchlistStorage};
use tokenfolio::store::WatchlistStore;
use tokenfolio::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand / AppResult : messages UI <-> worker
// ============================================================================

/// Commandes envoyées au worker (uniquement du réseau)
#[derive(Debug, Clone)]
enum AppCommand {
    /// Appel `/coins/markets`
    LoadMarkets {
        purpose: MarketsPurpose,
        query: MarketsQuery,
    },

    /// Liste "trending" pour une ouverture du dialogue
    LoadTrending(TrendingRequest),

    /// Recherche (après debounce)
    Search(SearchRequest),
}

/// Résultats renvoyés par le worker
#[derive(Debug)]
enum AppResult {
    MarketsLoaded {
        purpose: MarketsPurpose,
        result: Result<Vec<MarketQuote>>,
    },

    TrendingLoaded {
        request: TrendingRequest,
        result: Result<Vec<CoinLite>>,
    },

    SearchLoaded {
        generation: u64,
        result: Result<Vec<CoinLite>>,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! sont inutilisables une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne. Niveau contrôlé par RUST_LOG.
//
//   tail -f ~/.local/share/tokenfolio/logs/tokenfolio.log
//   RUST_LOG=tokenfolio=trace tokenfolio
// ============================================================================

fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "tokenfolio.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenfolio=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    // .env optionnel (TOKENFOLIO_*)
    dotenv::dotenv().ok();
    let config = Config::from_env();

    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "Tokenfolio starting up");

    let client = Arc::new(CoinGeckoClient::new(config.api_base_url.clone())?);

    // Store et vue Portfolio partagent le stockage et le signal "last updated"
    let storage = WatchlistStorage::new(FileStore::new(&config.data_dir));
    let notifier = UpdateNotifier::new();
    let portfolio = PortfolioView::new(storage.clone(), notifier.subscribe());
    let mut store = WatchlistStore::new(storage, notifier).with_default_count(config.default_market_count);
    let hydrated = store.hydrate_from_storage();
    let default_query = store.default_query();

    let mut app = App::new(store, portfolio);

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, client);

    if !hydrated {
        info!(count = default_query.per_page, "No saved watchlist, fetching default snapshot");
        app.start_loading(Some("Loading top tokens…".to_string()));
        send(
            &command_tx,
            AppCommand::LoadMarkets {
                purpose: MarketsPurpose::Initialize,
                query: default_query,
            },
        );
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// Un thread OS avec son propre runtime tokio. Chaque commande devient une
// tâche : une recherche lente ne bloque ni le trending ni un refresh.
// Le worker ne touche jamais à l'état de l'App.
// ============================================================================

fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    client: Arc<CoinGeckoClient>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, worker exiting");
                return;
            }
        };

        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let client = client.clone();
            let result_tx = result_tx.clone();

            runtime.spawn(async move {
                let result = execute_command(client.as_ref(), command).await;
                if result_tx.send(result).is_err() {
                    debug!("UI gone, dropping worker result");
                }
            });
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande réseau ; les erreurs voyagent dans l'AppResult
async fn execute_command(client: &dyn MarketDataClient, command: AppCommand) -> AppResult {
    match command {
        AppCommand::LoadMarkets { purpose, query } => AppResult::MarketsLoaded {
            purpose,
            result: client.markets(&query).await,
        },
        AppCommand::LoadTrending(request) => AppResult::TrendingLoaded {
            request,
            result: client.trending().await,
        },
        AppCommand::Search(request) => AppResult::SearchLoaded {
            generation: request.generation,
            result: client.search(&request.query).await,
        },
    }
}

fn send(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if let Err(e) = command_tx.send(command) {
        error!(error = %e, "Worker thread unavailable, command dropped");
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. appliquer les résultats du worker
//   1. dessiner
//   2. traiter l'entrée (au plus 100 ms d'attente)
//   3. tick : polling du portfolio, debounce de la recherche
// ============================================================================

fn run<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // 0. RÉSULTATS
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(app, result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => debug!(error = ?e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        if let Some(request) = app.tick(Instant::now()) {
            debug!(query = %request.query, generation = request.generation, "Debounce elapsed, searching");
            send(command_tx, AppCommand::Search(request));
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état de l'App
fn apply_result<S: KeyValueStore>(app: &mut App<S>, result: AppResult) {
    match result {
        AppResult::MarketsLoaded { purpose, result } => {
            if let Ok(quotes) = &result {
                info!(?purpose, count = quotes.len(), "Market data loaded");
            }
            app.apply_markets(purpose, result);
        }
        AppResult::TrendingLoaded { request, result } => {
            if !app.search.apply_trending(request, result) {
                debug!(session = request.session, "Trending result ignored");
            }
        }
        AppResult::SearchLoaded { generation, result } => {
            if !app.search.apply_search(generation, result) {
                debug!(generation, "Search result ignored");
            }
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Routage par écran : dans le dialogue et l'éditeur, les lettres sont du
// texte ; sur le dashboard, ce sont des raccourcis.
// ============================================================================

fn handle_event<S: KeyValueStore>(
    app: &mut App<S>,
    event: tokenfolio::ui::events::Event,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use tokenfolio::ui::events::{is_force_quit_event, Event};

    if let Event::Tick = event {
        return;
    }

    if is_force_quit_event(&event) {
        info!("User forced quit");
        app.quit();
        return;
    }

    if app.is_searching() {
        handle_search_event(app, &event, command_tx);
    } else if app.is_editing() {
        handle_edit_event(app, &event);
    } else {
        handle_dashboard_event(app, &event, command_tx);
    }
}

fn handle_dashboard_event<S: KeyValueStore>(
    app: &mut App<S>,
    event: &tokenfolio::ui::events::Event,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use tokenfolio::ui::events::{
        is_add_event, is_delete_event, is_down_event, is_edit_event, is_next_page_event,
        is_previous_page_event, is_quit_event, is_refresh_event, is_up_event,
    };

    // Two-step quit
    if is_quit_event(event) {
        app.cancel_delete();
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    // Two-step delete
    if is_delete_event(event) {
        app.cancel_quit();
        if app.selected_row().is_none() {
            return;
        }
        if app.is_awaiting_delete_confirmation() {
            info!(id = ?app.selected_row().map(|r| r.id.clone()), "User confirmed delete");
            app.delete_selected();
        } else {
            info!("User requested delete (awaiting confirmation)");
            app.request_delete();
        }
        return;
    }

    // Toute autre touche annule les confirmations en cours
    app.cancel_quit();
    app.cancel_delete();

    if is_up_event(event) {
        app.navigate_up();
    } else if is_down_event(event) {
        app.navigate_down();
    } else if is_next_page_event(event) {
        app.next_page();
    } else if is_previous_page_event(event) {
        app.previous_page();
    } else if is_edit_event(event) {
        app.start_edit();
    } else if is_refresh_event(event) {
        refresh(app, command_tx);
    } else if is_add_event(event) {
        info!("User opened add token dialog");
        let request = app.open_search();
        send(command_tx, AppCommand::LoadTrending(request));
    }
}

/// Refresh des prix ; un refresh en cours rend la touche inactive
///
/// Watchlist vide (snapshot initial en échec) : le refresh redemande le
/// snapshot par défaut.
fn refresh<S: KeyValueStore>(app: &mut App<S>, command_tx: &mpsc::Sender<AppCommand>) {
    if app.is_loading {
        debug!("Initial snapshot still loading, refresh ignored");
        return;
    }

    match app.request_refresh() {
        Some(query) => {
            info!(ids = ?query.ids.as_ref().map(Vec::len), "Refreshing prices");
            send(
                command_tx,
                AppCommand::LoadMarkets {
                    purpose: MarketsPurpose::Refresh,
                    query,
                },
            );
        }
        None => warn!("Refresh requested while another refresh is running"),
    }
}

fn handle_edit_event<S: KeyValueStore>(app: &mut App<S>, event: &tokenfolio::ui::events::Event) {
    use tokenfolio::ui::events::{
        get_char_from_event, is_backspace_event, is_enter_event, is_escape_event, is_numeric_char_event,
    };

    if is_escape_event(event) {
        debug!("User cancelled holdings edit");
        app.cancel_edit();
    } else if is_enter_event(event) {
        app.submit_edit();
    } else if is_backspace_event(event) {
        app.backspace();
    } else if is_numeric_char_event(event) {
        if let Some(c) = get_char_from_event(event) {
            app.append_char(c);
        }
    }
}

fn handle_search_event<S: KeyValueStore>(
    app: &mut App<S>,
    event: &tokenfolio::ui::events::Event,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use tokenfolio::ui::events::{
        get_char_from_event, is_arrow_down_event, is_arrow_up_event, is_backspace_event, is_enter_event,
        is_escape_event, is_text_char_event, is_toggle_event,
    };

    let now = Instant::now();

    if is_escape_event(event) {
        info!("User closed add token dialog");
        app.close_search();
    } else if is_enter_event(event) {
        if let Some(query) = app.confirm_search() {
            send(
                command_tx,
                AppCommand::LoadMarkets {
                    purpose: MarketsPurpose::Add,
                    query,
                },
            );
        }
    } else if is_arrow_up_event(event) {
        app.search.cursor_up();
    } else if is_arrow_down_event(event) {
        app.search.cursor_down();
    } else if is_toggle_event(event) {
        app.search.toggle_highlighted();
    } else if is_backspace_event(event) {
        app.search.backspace(now);
    } else if is_text_char_event(event) {
        if let Some(c) = get_char_from_event(event) {
            app.search.push_char(c, now);
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
