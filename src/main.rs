// Entry point of the report bot.
//
// **Architecture Overview:**
// - `core/` = Report logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files, settings)
// - `discord/` = Discord-specific adapters (commands, components, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use crate::core::reports::{PendingReports, ReportDirectory, ReportWorkflow, SystemClock};
use crate::discord::commands::presence;
use crate::discord::{add_image, components, Data, Error};
use crate::infra::reports::JsonReportStore;
use crate::infra::settings::{Settings, DEFAULT_SETTINGS_PATH};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;

/// Event handler for non-command Discord events: `addimage` mentions and
/// clicks on report components.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(user = %data_about_bot.user.name, "Connected to Discord");
            presence::on_ready(ctx);
        }
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            let bot_id = ctx.cache.current_user().id;
            if new_message.mentions.iter().any(|u| u.id == bot_id) {
                add_image::handle_message(ctx, data, new_message).await?;
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Some(component) = interaction.as_message_component() {
                components::handle_interaction(ctx, data, component).await;
            }
        }
        _ => {}
    }

    Ok(())
}

/// Log every framework error; command failures also get a generic reply so the
/// user isn't left waiting.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = ctx.author().id.get(),
                "Command failed: {}",
                error
            );
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content("❌ Something went wrong while running that command. Please try again.")
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            tracing::error!(event = event.snake_case_name(), "Event handler failed: {}", error);
        }
        // Staff check already told the user why.
        poise::FrameworkError::CommandCheckFailed { error: None, .. } => {}
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let settings = Settings::load_or_create(DEFAULT_SETTINGS_PATH)?;
    let token = settings
        .resolve_token(std::env::var("DISCORD_TOKEN").ok())
        .with_context(|| {
            format!(
                "No bot token configured! Set DISCORD_TOKEN or fill in bot_token in {}.",
                DEFAULT_SETTINGS_PATH
            )
        })?;

    std::fs::create_dir_all(&settings.save_path).with_context(|| {
        format!(
            "Failed to create report directory {}",
            settings.save_path.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let directory = Arc::new(ReportDirectory::new(
        JsonReportStore::new(),
        settings.save_path.clone(),
        settings.corrupt_data_policy(),
    ));
    let pending = Arc::new(PendingReports::new());
    let workflow = Arc::new(ReportWorkflow::new(Arc::clone(&pending), SystemClock));
    let settings = Arc::new(settings);

    let data = Data {
        reports: Arc::clone(&directory),
        workflow: Arc::clone(&workflow),
        settings: Arc::clone(&settings),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required for addimage
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let write_commands = settings.write_commands;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::reports::report(),
                discord::commands::reports::reportinfo(),
                discord::commands::reports::playerinfo(),
                discord::commands::reports::editreport(),
                discord::commands::reports::reports(),
                discord::commands::reports::reporterinfo(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up");

                if write_commands {
                    // Global registration can take up to an hour to propagate
                    poise::builtins::register_globally(ctx, &framework.options().commands)
                        .await?;
                    tracing::info!(
                        count = framework.options().commands.len(),
                        "Slash commands registered"
                    );
                } else {
                    tracing::info!("write_commands is off, leaving slash commands untouched");
                }

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
