use anyhow::Result;
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nutribot::ai::{HttpTextGenerator, TextGenerator};
use nutribot::bot::{BotContext, Router, TelegramMessenger};
use nutribot::config::BotConfig;
use nutribot::localization::Localizer;
use nutribot::meal_plan::KvMealPlanStore;
use nutribot::profile::KvProfileStore;
use nutribot::session::SessionStore;
use nutribot::storage::{connect, init_database_schema, KeyValueStore, PgKeyValueStore};
use nutribot::update::IncomingUpdate;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting meal-planning Telegram bot");

    let config = BotConfig::from_env()?;

    let pool = connect(&config.database_url, config.db_max_connections).await?;
    init_database_schema(&pool).await?;

    let store: Arc<dyn KeyValueStore> = Arc::new(PgKeyValueStore::new(pool));
    let localizer = Arc::new(Localizer::new(&config.default_language)?);

    let ai: Option<Arc<dyn TextGenerator>> = if config.ai.is_usable() {
        match HttpTextGenerator::new(&config.ai) {
            Ok(generator) => {
                info!(model = %config.ai.model, "AI mode enabled");
                Some(Arc::new(generator) as Arc<dyn TextGenerator>)
            }
            Err(e) => {
                warn!(error = %e, "Failed to build AI client, AI mode disabled");
                None
            }
        }
    } else {
        None
    };

    let bot = Bot::new(&config.telegram_token);

    let ctx = BotContext {
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
        sessions: SessionStore::new(store.clone()),
        profiles: Arc::new(KvProfileStore::new(store.clone())),
        meal_plans: Arc::new(KvMealPlanStore::new(store)),
        ai,
        localizer,
    };
    let router = Router::new(Arc::new(ctx));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(|msg: Message, router: Router| async move {
            router.route(IncomingUpdate::from(&msg)).await;
            respond(())
        }))
        .branch(
            Update::filter_callback_query().endpoint(|q: CallbackQuery, router: Router| async move {
                router.route(IncomingUpdate::from(&q)).await;
                respond(())
            }),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
