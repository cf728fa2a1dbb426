use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;

use quotebot::chatbot::{
    dispatch, AssistantClient, ConversationEngine, Database, HttpDocumentCatalog, HttpQuotingGateway,
    InboundEvent, TelegramClient, TurnLocks,
};
use quotebot::config::Config;

struct BotState {
    engine: ConversationEngine,
    telegram: TelegramClient,
    turns: TurnLocks,
}

impl BotState {
    async fn new(config: &Config, bot: &Bot) -> Self {
        let bot_user_id = match bot.get_me().await {
            Ok(me) => {
                info!("Bot user ID: {}, username: @{}", me.id, me.username());
                Some(me.id.0.to_string())
            }
            Err(e) => {
                warn!("Failed to get bot info: {e}");
                None
            }
        };

        let store = Database::load_or_new(&config.profiles_path()).expect("Failed to open profile database");
        let quoting = HttpQuotingGateway::new(config.quoting.clone(), config.http_timeout)
            .expect("Failed to build quoting client");
        let catalog = HttpDocumentCatalog::new(config.documents_list_url.clone(), config.http_timeout)
            .expect("Failed to build document catalog client");
        let assistant = AssistantClient::new(
            config.advisor_url.clone(),
            config.gandalf_url.clone(),
            config.http_timeout,
        )
        .expect("Failed to build assistant client");

        let engine = ConversationEngine::new(
            config.engine_settings(bot_user_id),
            Arc::new(store),
            Arc::new(quoting),
            Arc::new(catalog),
            Arc::new(assistant),
        );

        Self {
            engine,
            telegram: TelegramClient::new(bot.clone()),
            turns: TurnLocks::new(),
        }
    }

    /// Run one turn and deliver its replies to `chat_id`.
    async fn run_turn(&self, chat_id: ChatId, event: InboundEvent) {
        let lock = self.turns.acquire(&event.sender_id).await;
        {
            let _guard = lock.lock().await;
            let outbound = self.engine.handle_event(&event).await;
            debug!("Turn for {} produced {} actions", event.sender_id, outbound.len());
            dispatch(&self.telegram, &chat_id.0.to_string(), &outbound).await;
        }
        self.turns.release(&event.sender_id, lock).await;
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "quotebot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("quotebot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting quotebot...");
    info!("Loaded config from {}", config.config_path.display());

    let state = Arc::new(BotState::new(&config, &bot).await);
    info!(
        "Serving as {} for {}",
        state.engine.settings().bot_name,
        state.engine.settings().company_name
    );

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let user = match msg.from {
        Some(ref u) => u,
        None => return Ok(()),
    };

    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    let event = InboundEvent {
        sender_id: user.id.0.to_string(),
        raw_text: text.to_string(),
        display_name: user.full_name(),
        button_payload: None,
    };
    state.run_turn(msg.chat.id, event).await;
    Ok(())
}

async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    // Stop the client's spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {e}");
    }

    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        return Ok(());
    };

    let event = InboundEvent {
        sender_id: q.from.id.0.to_string(),
        raw_text: String::new(),
        display_name: q.from.full_name(),
        button_payload: q.data.clone(),
    };
    state.run_turn(chat_id, event).await;
    Ok(())
}
