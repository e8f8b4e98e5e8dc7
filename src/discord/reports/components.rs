// Buttons and select menus attached to report messages.
//
// Every custom id carries the id of the moderator the message was made for:
//
//   report:confirm:<owner>            type select on a pending report
//   report:exit:<owner>               cancel a pending report
//   report:view:<owner>:<id>          show a report
//   report:images:<owner>:<id>        post a report's proof links
//   report:page:<owner>:<page>        page through the guild's reports
//   report:player:<owner>:<id>        all reports for that report's player
//
// Clicks from anyone else get an ephemeral refusal and change nothing.

use super::embeds;
use super::{Data, Error};
use crate::core::reports::{
    Report, ReportError, ReportPage, ReportType, WorkflowError, REPORTS_PER_PAGE,
};
use poise::serenity_prelude as serenity;

const PREFIX: &str = "report";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    Confirm { owner: u64 },
    Exit { owner: u64 },
    View { owner: u64, report_id: u64 },
    Images { owner: u64, report_id: u64 },
    Page { owner: u64, page: usize },
    ViewAll { owner: u64, report_id: u64 },
}

impl ComponentAction {
    pub fn owner(&self) -> u64 {
        match self {
            Self::Confirm { owner }
            | Self::Exit { owner }
            | Self::View { owner, .. }
            | Self::Images { owner, .. }
            | Self::Page { owner, .. }
            | Self::ViewAll { owner, .. } => *owner,
        }
    }

    pub fn custom_id(&self) -> String {
        match self {
            Self::Confirm { owner } => format!("{PREFIX}:confirm:{owner}"),
            Self::Exit { owner } => format!("{PREFIX}:exit:{owner}"),
            Self::View { owner, report_id } => format!("{PREFIX}:view:{owner}:{report_id}"),
            Self::Images { owner, report_id } => format!("{PREFIX}:images:{owner}:{report_id}"),
            Self::Page { owner, page } => format!("{PREFIX}:page:{owner}:{page}"),
            Self::ViewAll { owner, report_id } => format!("{PREFIX}:player:{owner}:{report_id}"),
        }
    }

    /// `None` for ids this bot didn't produce.
    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.splitn(4, ':');
        if parts.next()? != PREFIX {
            return None;
        }
        let kind = parts.next()?;
        let owner: u64 = parts.next()?.parse().ok()?;
        let arg = parts.next();

        let action = match (kind, arg) {
            ("confirm", None) => Self::Confirm { owner },
            ("exit", None) => Self::Exit { owner },
            ("view", Some(id)) => Self::View {
                owner,
                report_id: id.parse().ok()?,
            },
            ("images", Some(id)) => Self::Images {
                owner,
                report_id: id.parse().ok()?,
            },
            ("page", Some(page)) => Self::Page {
                owner,
                page: page.parse().ok()?,
            },
            ("player", Some(id)) => Self::ViewAll {
                owner,
                report_id: id.parse().ok()?,
            },
            _ => return None,
        };
        Some(action)
    }
}

// ============================================================================
// COMPONENT ROWS
// ============================================================================

/// Type select plus an exit button, shown while a report is pending.
pub fn confirm_rows(owner: u64) -> Vec<serenity::CreateActionRow> {
    let options = ReportType::ALL
        .iter()
        .map(|t| {
            serenity::CreateSelectMenuOption::new(t.as_str(), t.as_str())
                .description(t.description())
        })
        .collect();

    let menu = serenity::CreateSelectMenu::new(
        ComponentAction::Confirm { owner }.custom_id(),
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Select any type to confirm report.")
    .min_values(1)
    .max_values(1);

    vec![
        serenity::CreateActionRow::SelectMenu(menu),
        serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(
            ComponentAction::Exit { owner }.custom_id(),
        )
        .label("Exit")
        .style(serenity::ButtonStyle::Danger)]),
    ]
}

pub fn confirmed_rows(owner: u64, report: &Report) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(
            ComponentAction::View {
                owner,
                report_id: report.id,
            }
            .custom_id(),
        )
        .label("View report")
        .style(serenity::ButtonStyle::Primary),
    ])]
}

/// Buttons under a single report, in display order.
fn report_actions(owner: u64, report: &Report) -> [(ComponentAction, &'static str); 2] {
    [
        (
            ComponentAction::Images {
                owner,
                report_id: report.id,
            },
            "View images",
        ),
        (
            ComponentAction::ViewAll {
                owner,
                report_id: report.id,
            },
            "View all reports",
        ),
    ]
}

pub fn report_rows(owner: u64, report: &Report) -> Vec<serenity::CreateActionRow> {
    let buttons = report_actions(owner, report)
        .into_iter()
        .map(|(action, label)| {
            let style = match action {
                ComponentAction::Images { .. } => serenity::ButtonStyle::Primary,
                _ => serenity::ButtonStyle::Secondary,
            };
            serenity::CreateButton::new(action.custom_id())
                .label(label)
                .style(style)
        })
        .collect();

    vec![serenity::CreateActionRow::Buttons(buttons)]
}

pub fn page_rows(owner: u64, page: &ReportPage) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(
            ComponentAction::Page {
                owner,
                page: page.page.saturating_sub(1),
            }
            .custom_id(),
        )
        .label("◀ Previous")
        .style(serenity::ButtonStyle::Primary)
        .disabled(!page.has_previous()),
        serenity::CreateButton::new(
            ComponentAction::Page {
                owner,
                page: page.page + 1,
            }
            .custom_id(),
        )
        .label("Next ▶")
        .style(serenity::ButtonStyle::Primary)
        .disabled(!page.has_next()),
    ])]
}

// ============================================================================
// INTERACTION HANDLING
// ============================================================================

async fn respond_ephemeral(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn update_message(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    embed: serenity::CreateEmbed,
    components: Vec<serenity::CreateActionRow>,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(components),
            ),
        )
        .await?;
    Ok(())
}

fn selected_type(interaction: &serenity::ComponentInteraction) -> Option<ReportType> {
    match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|v| v.parse().ok())
        }
        _ => None,
    }
}

/// Entry point for `InteractionCreate` component events. Errors are logged and
/// the user gets a generic ephemeral failure message.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    data: &Data,
    interaction: &serenity::ComponentInteraction,
) {
    if let Err(e) = handle_component(ctx, data, interaction).await {
        tracing::error!(
            custom_id = %interaction.data.custom_id,
            user_id = interaction.user.id.get(),
            "Component interaction failed: {}",
            e
        );
        let _ = respond_ephemeral(
            ctx,
            interaction,
            "❌ Something went wrong while handling that. Please try again.",
        )
        .await;
    }
}

async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    interaction: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(action) = ComponentAction::parse(&interaction.data.custom_id) else {
        tracing::debug!(custom_id = %interaction.data.custom_id, "Ignoring unknown component");
        return Ok(());
    };

    let actor = interaction.user.id.get();
    if action.owner() != actor {
        tracing::debug!(owner = action.owner(), actor, "Component used by another user");
        return respond_ephemeral(
            ctx,
            interaction,
            "❌ Only the moderator who ran this command can use these controls.",
        )
        .await;
    }

    let guild_id = interaction
        .guild_id
        .ok_or("Report components only work in servers")?
        .get();

    match action {
        ComponentAction::Exit { owner } => {
            data.workflow.exit(owner);
            update_message(ctx, interaction, embeds::cancelled_embed(), Vec::new()).await
        }
        ComponentAction::Confirm { owner } => {
            let Some(report_type) = selected_type(interaction) else {
                return respond_ephemeral(ctx, interaction, "❌ Pick a report type first.").await;
            };

            let manager = data.reports.manager(guild_id).await?;
            match data.workflow.confirm(owner, report_type, &manager).await {
                Ok(report) => {
                    let total = manager.count().await;
                    tracing::info!(
                        guild_id = manager.guild_id(),
                        report_id = report.id,
                        moderator_id = owner,
                        total,
                        "Report confirmed"
                    );
                    update_message(
                        ctx,
                        interaction,
                        embeds::confirmed_embed(&report),
                        confirmed_rows(owner, &report),
                    )
                    .await
                }
                Err(WorkflowError::NoPendingReport(_)) => {
                    respond_ephemeral(
                        ctx,
                        interaction,
                        "❌ **Report not found!** This is most likely because of a restart. \
                         Please remake the report.",
                    )
                    .await
                }
                Err(e) => Err(e.into()),
            }
        }
        ComponentAction::View { owner, report_id } => {
            let manager = data.reports.manager(guild_id).await?;
            match manager.try_get_report(report_id).await {
                Some(report) => {
                    update_message(
                        ctx,
                        interaction,
                        embeds::report_embed(&report),
                        report_rows(owner, &report),
                    )
                    .await
                }
                None => respond_ephemeral(ctx, interaction, "❌ **Report ID invalid!**").await,
            }
        }
        ComponentAction::Images { report_id, .. } => {
            let manager = data.reports.manager(guild_id).await?;
            let Some(report) = manager.try_get_report(report_id).await else {
                return respond_ephemeral(ctx, interaction, "❌ **Report ID invalid!**").await;
            };

            interaction
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .embed(embeds::images_embed(&report)),
                    ),
                )
                .await?;

            // One message per link so Discord renders each preview.
            for url in &report.proof_urls {
                interaction.channel_id.say(&ctx.http, url).await?;
            }
            Ok(())
        }
        ComponentAction::ViewAll { report_id, .. } => {
            let manager = data.reports.manager(guild_id).await?;
            let Some(report) = manager.try_get_report(report_id).await else {
                return respond_ephemeral(ctx, interaction, "❌ **Report ID invalid!**").await;
            };
            let embed = match manager.player_summary(&report.subject_name).await {
                Some(summary) => embeds::player_summary_embed(&summary),
                None => embeds::no_player_reports_embed(),
            };
            update_message(ctx, interaction, embed, Vec::new()).await
        }
        ComponentAction::Page { owner, page } => {
            let manager = data.reports.manager(guild_id).await?;
            match manager.page(page, REPORTS_PER_PAGE).await {
                Ok(page) => {
                    update_message(
                        ctx,
                        interaction,
                        embeds::report_page_embed(&page),
                        page_rows(owner, &page),
                    )
                    .await
                }
                Err(ReportError::InvalidPage { total_pages, .. }) => {
                    respond_ephemeral(
                        ctx,
                        interaction,
                        format!("❌ That page no longer exists. There are {} page(s).", total_pages),
                    )
                    .await
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
