mod config;
mod standup;

use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatMemberUpdated;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::info;
use tracing_subscriber::prelude::*;

use config::Config;
use standup::{
    Announcer, EMPTY_ROSTER_NOTICE, MemberTracker, RosterManager, Scheduler, StateStore,
    TelegramClient, names, schedule, state,
};

struct BotState {
    config: Config,
    store: StateStore,
    roster: RosterManager,
    tracker: MemberTracker,
    announcer: Arc<Announcer>,
    scheduler: Scheduler,
    telegram: Arc<TelegramClient>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "show what this bot does")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "show the current chat id")]
    ChatId,
    #[command(description = "send announcements to this chat")]
    SetChat,
    #[command(description = "add participants: /add @user, Name ...")]
    Add(String),
    #[command(description = "add every known member of this chat")]
    AddAll,
    #[command(description = "remove participants: /remove @user, Name ...")]
    Remove(String),
    #[command(description = "show the roster")]
    List,
    #[command(description = "announce today's host now")]
    Today,
    #[command(description = "test: announce in N seconds (default 5)")]
    TestJob(String),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Setup logging: stdout plus a file next to the state document.
    let log_dir = config
        .state_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("dailyhost.log"))
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

    info!("🚀 Starting dailyhost...");

    let bot = Bot::new(&config.bot_token);
    let store = StateStore::new(config.state_file.clone());
    state::log_startup(&store);

    let telegram = Arc::new(TelegramClient::new(bot.clone()));
    let announcer = Arc::new(Announcer::new(
        store.clone(),
        telegram.clone(),
        config.meeting_link.clone(),
    ));
    let scheduler = match Scheduler::new(config.timezone, store.clone(), announcer.clone()) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            eprintln!("Failed to arm the daily schedule: {e}");
            std::process::exit(1);
        }
    };
    scheduler.spawn_recurring();

    let bot_state = Arc::new(BotState {
        roster: RosterManager::new(store.clone()),
        tracker: MemberTracker::new(store.clone()),
        config,
        store,
        announcer,
        scheduler,
        telegram,
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_chat_member().endpoint(handle_chat_member))
        .branch(Update::filter_my_chat_member().endpoint(handle_chat_member));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![bot_state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(msg: Message, cmd: Command, state: Arc<BotState>) -> ResponseResult<()> {
    let telegram = &state.telegram;

    match cmd {
        Command::Start => {
            telegram
                .reply(
                    &msg,
                    "Hi! I pick a random standup host on weekdays at 10:00.\n\
                     Commands: /setchat, /add, /remove, /list, /today, /chatid, /testjob, /addall",
                )
                .await
                .ok();
        }
        Command::Help => {
            telegram
                .reply(&msg, &Command::descriptions().to_string())
                .await
                .ok();
        }
        Command::ChatId => {
            telegram
                .reply(&msg, &format!("Chat ID: {}", msg.chat.id.0))
                .await
                .ok();
        }
        Command::SetChat => {
            state.roster.bind_chat(msg.chat.id.0);
            let label = msg
                .chat
                .title()
                .map(|t| t.to_string())
                .unwrap_or_else(|| msg.chat.id.0.to_string());
            telegram
                .reply(&msg, &format!("Announcement chat set: {}", html::escape(&label)))
                .await
                .ok();
        }
        Command::Add(args) => {
            let args = args.trim();
            let to_add = if args.is_empty() {
                // Bare /add puts the sender on the roster.
                match msg.from {
                    Some(ref user) => vec![names::display_name(user)],
                    None => {
                        telegram
                            .reply(&msg, "Give me an @username or a name (or several).")
                            .await
                            .ok();
                        return Ok(());
                    }
                }
            } else {
                let parsed = names::parse_names(args);
                if parsed.is_empty() {
                    telegram
                        .reply(
                            &msg,
                            "Couldn't read any names. Separate them with commas or newlines.",
                        )
                        .await
                        .ok();
                    return Ok(());
                }
                parsed
            };

            let report = state.roster.add(&to_add);
            let mut parts = Vec::new();
            if !report.added.is_empty() {
                parts.push(format!("Added: {}", escape_list(&report.added)));
            }
            if !report.already_present.is_empty() {
                parts.push(format!(
                    "Already on the roster: {}",
                    escape_list(&report.already_present)
                ));
            }
            if parts.is_empty() {
                parts.push("Nothing added.".to_string());
            }
            telegram.reply(&msg, &parts.join("\n")).await.ok();
        }
        Command::AddAll => {
            let chat_id = msg.chat.id.0;
            if state.store.load().known_names(chat_id).is_empty() {
                telegram
                    .reply(
                        &msg,
                        "I don't know any members of this chat yet. Have people write something first.",
                    )
                    .await
                    .ok();
                return Ok(());
            }

            let added = state.roster.import_known(chat_id);
            let reply = if added.is_empty() {
                "Everyone I know here is already on the roster.".to_string()
            } else {
                format!("Added: {}", escape_list(&added))
            };
            telegram.reply(&msg, &reply).await.ok();
        }
        Command::Remove(args) => {
            let args = args.trim();
            if args.is_empty() {
                telegram
                    .reply(&msg, "Give me an @username or a name (or several) to remove.")
                    .await
                    .ok();
                return Ok(());
            }
            let to_remove = names::parse_names(args);
            if to_remove.is_empty() {
                telegram.reply(&msg, "Couldn't read any names.").await.ok();
                return Ok(());
            }

            let report = state.roster.remove(&to_remove);
            let mut parts = Vec::new();
            if !report.removed.is_empty() {
                parts.push(format!("Removed: {}", escape_list(&report.removed)));
            }
            if !report.not_found.is_empty() {
                parts.push(format!("Not found: {}", escape_list(&report.not_found)));
            }
            if parts.is_empty() {
                parts.push("Nothing changed.".to_string());
            }
            telegram.reply(&msg, &parts.join("\n")).await.ok();
        }
        Command::List => {
            let participants = state.roster.list();
            if participants.is_empty() {
                telegram.reply(&msg, EMPTY_ROSTER_NOTICE).await.ok();
            } else {
                let lines: Vec<String> = participants
                    .iter()
                    .map(|p| format!("• {}", html::escape(p)))
                    .collect();
                telegram
                    .reply(&msg, &format!("Current roster:\n{}", lines.join("\n")))
                    .await
                    .ok();
            }
        }
        Command::Today => {
            let target = match state.store.load().chat_id {
                Some(bound) => bound,
                None => {
                    if state.config.bind_on_today {
                        state.roster.bind_chat(msg.chat.id.0);
                    }
                    msg.chat.id.0
                }
            };
            state.announcer.announce(target).await;
        }
        Command::TestJob(args) => {
            let delay = schedule::parse_delay(&args);
            state.scheduler.spawn_one_off(delay, msg.chat.id.0);
            telegram
                .reply(&msg, &format!("Test announcement scheduled in {delay}s."))
                .await
                .ok();
        }
    }

    Ok(())
}

fn escape_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| html::escape(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remember the sender of any plain message for /addall.
async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    // Unrecognized commands also land here; don't track them.
    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return Ok(());
    }
    if let Some(ref user) = msg.from {
        state
            .tracker
            .observe(msg.chat.id.0, user.id.0 as i64, &names::display_name(user));
    }
    Ok(())
}

/// Remember both sides of a membership change for /addall.
async fn handle_chat_member(
    update: ChatMemberUpdated,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let chat_id = update.chat.id.0;

    let actor = &update.from;
    state
        .tracker
        .observe(chat_id, actor.id.0 as i64, &names::display_name(actor));

    let subject = &update.new_chat_member.user;
    if subject.id != actor.id {
        state
            .tracker
            .observe(chat_id, subject.id.0 as i64, &names::display_name(subject));
    }

    info!(
        "👋 Membership update in chat {}: {} is now {:?}",
        chat_id,
        subject.first_name,
        update.new_chat_member.status()
    );
    Ok(())
}
