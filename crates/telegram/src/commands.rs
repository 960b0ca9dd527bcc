use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

use common::{DisplaySnapshot, EngineCommand, EngineState};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub command_tx: mpsc::Sender<EngineCommand>,
    pub engine_state: Arc<RwLock<EngineState>>,
    pub snapshot_rx: watch::Receiver<DisplaySnapshot>,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "GoldRadar commands:")]
pub enum Command {
    #[command(description = "Start signal evaluation")]
    Start,
    #[command(description = "Stop signal evaluation")]
    Stop,
    #[command(description = "Show session status and the current signal")]
    Status,
    #[command(description = "Clear the signal archive and reset the entry reference")]
    Clear,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(token: String, deps: BotDeps) {
    let bot = Bot::new(token);
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::Stop].endpoint(handle_stop))
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Clear].endpoint(handle_clear));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_start(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.engine_state.read().await;
    if state == EngineState::Running {
        bot.send_message(msg.chat.id, "Radar is already running.").await?;
    } else {
        let _ = deps.command_tx.send(EngineCommand::Start).await;
        bot.send_message(msg.chat.id, "Radar started.").await?;
    }
    Ok(())
}

async fn handle_stop(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.engine_state.read().await;
    if state == EngineState::Stopped {
        bot.send_message(msg.chat.id, "Radar is already stopped.").await?;
    } else {
        let _ = deps.command_tx.send(EngineCommand::Stop).await;
        bot.send_message(msg.chat.id, "Radar stopped.").await?;
    }
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.engine_state.read().await;
    let snap = deps.snapshot_rx.borrow().clone();

    let price_line = match snap.price {
        Some(p) => format!("{}: {p:.2}", snap.symbol),
        None => format!("{}: waiting for data\u{2026}", snap.symbol),
    };
    let session_line = if snap.session_active { "open" } else { "closed" };

    let text = format!(
        "GoldRadar Status\n\
         Engine: {state}\n\
         Session: {session_line}\n\
         {price_line}\n\
         Signal: {} (quality {}%)\n\
         Archive: {} signal(s)",
        snap.classification,
        snap.score,
        snap.archive.len(),
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_clear(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let _ = deps.command_tx.send(EngineCommand::ClearSession).await;
    bot.send_message(
        msg.chat.id,
        "Archive cleared and entry reference reset.",
    )
    .await?;
    Ok(())
}

/// Send a proactive alert to all configured chat IDs.
/// Call this from the alert forwarder loop.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) {
    for &chat_id in chat_ids {
        if let Err(e) = bot.send_message(chat_id, message).await {
            warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert");
        }
    }
}
