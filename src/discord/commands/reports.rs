// Discord commands for filing and browsing reports.
//
// Same shape as every other command file:
// 1. Extract primitive data from Discord types
// 2. Call the guild's report manager / the workflow
// 3. Format the response
//
// Confirmation, paging and the report buttons are handled in
// `discord::components` once the message is out.

use super::{Context, Error};
use crate::core::reports::{
    parse_offense_time, ReportError, ReportPatch, ReportRequest, ReportType, WorkflowError,
    REPORTS_PER_PAGE,
};
use crate::discord::components::{confirm_rows, page_rows, report_rows};
use crate::discord::embeds;
use crate::discord::staff::staff_check;
use poise::serenity_prelude as serenity;

const INVALID_TIME: &str = "❌ **Invalid time!** Use a span like `2h`, `1 day and 3 hours`, \
                            `1.12:00` or a date like `2024-05-01 18:30`.";

fn guild_id(ctx: &Context<'_>) -> Result<u64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get())
}

/// Start a new report. Pick the type on the message to confirm it.
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn report(
    ctx: Context<'_>,
    #[description = "Name of the player being reported"]
    #[max_length = 64]
    player: String,
    #[description = "Punishment given to the player"]
    #[max_length = 512]
    punishment: String,
    #[description = "How long ago it happened (e.g. 2h, 1 day) or when (2024-05-01 18:30)"]
    timespan: Option<String>,
    #[description = "Blocks broken by the player"]
    #[rename = "blocks-broken"]
    blocks_broken: Option<u64>,
    #[description = "Anything else worth knowing"]
    #[max_length = 1000]
    note: Option<String>,
) -> Result<(), Error> {
    let moderator_id = ctx.author().id.get();

    let request = ReportRequest {
        moderator_id,
        subject_name: player,
        punishment,
        timespan,
        blocks_broken,
        note,
    };

    let pending = match ctx.data().workflow.start(request) {
        Ok(pending) => pending,
        Err(WorkflowError::InvalidTime(_)) => {
            ctx.say(INVALID_TIME).await?;
            return Ok(());
        }
        Err(WorkflowError::Pending(_)) => {
            // Hand the controls out again so the open draft can always be
            // confirmed or exited, even if its original message is gone.
            let player = ctx
                .data()
                .workflow
                .pending()
                .find_by_moderator(moderator_id)
                .map(|p| embeds::truncate_text(&p.draft.subject_name, embeds::NAME_LIMIT))
                .unwrap_or_default();
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "❌ **You already have a report in progress** for ` {} `! \
                         Confirm or exit it before starting another one.",
                        player
                    ))
                    .components(confirm_rows(moderator_id)),
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let reply = poise::CreateReply::default()
        .embed(embeds::pending_report_embed(&pending))
        .components(confirm_rows(moderator_id));
    ctx.data()
        .workflow
        .deliver(&pending, ctx.send(reply))
        .await?;
    Ok(())
}

/// Show a single report by id
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn reportinfo(
    ctx: Context<'_>,
    #[description = "Report ID"] id: u64,
) -> Result<(), Error> {
    let manager = ctx.data().reports.manager(guild_id(&ctx)?).await?;

    let Some(report) = manager.try_get_report(id).await else {
        ctx.say(format!("❌ **Report ID invalid!** No report ` {} ` exists.", id))
            .await?;
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(embeds::report_embed(&report))
            .components(report_rows(ctx.author().id.get(), &report)),
    )
    .await?;
    Ok(())
}

/// Show every report filed against a player
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn playerinfo(
    ctx: Context<'_>,
    #[description = "Player name (not case-sensitive)"]
    #[max_length = 64]
    player: String,
) -> Result<(), Error> {
    let manager = ctx.data().reports.manager(guild_id(&ctx)?).await?;

    let embed = match manager.player_summary(&player).await {
        Some(summary) => embeds::player_summary_embed(&summary),
        None => embeds::no_player_reports_embed(),
    };

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Autocomplete for report type names
async fn autocomplete_type<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    ReportType::ALL
        .iter()
        .filter(move |t| {
            t.as_str()
                .to_lowercase()
                .starts_with(&partial.trim().to_lowercase())
        })
        .map(|t| t.as_str().to_string())
}

/// Edit fields of an existing report
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn editreport(
    ctx: Context<'_>,
    #[description = "Report ID"] id: u64,
    #[description = "New report type"]
    #[rename = "type"]
    #[autocomplete = "autocomplete_type"]
    report_type: Option<String>,
    #[description = "New note"]
    #[max_length = 1000]
    note: Option<String>,
    #[description = "New punishment"]
    #[max_length = 512]
    punishment: Option<String>,
    #[description = "New time (span like 2h, or a date)"] time: Option<String>,
    #[description = "New player name"]
    #[max_length = 64]
    username: Option<String>,
    #[description = "New blocks broken count"] blocksbroken: Option<u64>,
) -> Result<(), Error> {
    let report_type = match report_type.map(|t| t.parse::<ReportType>()).transpose() {
        Ok(t) => t,
        Err(e) => {
            ctx.say(format!("❌ **Invalid type!** {}", e)).await?;
            return Ok(());
        }
    };

    let offense_time = match time {
        Some(input) => match parse_offense_time(&input, ctx.data().workflow.now()) {
            Some(t) => Some(t),
            None => {
                ctx.say(INVALID_TIME).await?;
                return Ok(());
            }
        },
        None => None,
    };

    let patch = ReportPatch {
        report_type,
        note,
        punishment,
        offense_time,
        subject_name: username,
        blocks_broken: blocksbroken,
    };

    if patch.is_empty() {
        ctx.say("❌ **Nothing to edit!** Give at least one field to change.")
            .await?;
        return Ok(());
    }

    let manager = ctx.data().reports.manager(guild_id(&ctx)?).await?;
    match manager.update_report(id, &patch).await? {
        Some(update) => {
            ctx.send(poise::CreateReply::default().embed(embeds::edit_embed(&update)))
                .await?;
        }
        None => {
            ctx.say(format!("❌ **Report ID invalid!** No report ` {} ` exists.", id))
                .await?;
        }
    }
    Ok(())
}

/// List all reports, newest first
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn reports(
    ctx: Context<'_>,
    #[description = "Page number (default: 1)"] page: Option<u32>,
) -> Result<(), Error> {
    let manager = ctx.data().reports.manager(guild_id(&ctx)?).await?;
    let page_number = page.unwrap_or(1) as usize;

    let page = match manager.page(page_number, REPORTS_PER_PAGE).await {
        Ok(page) => page,
        Err(ReportError::InvalidPage { total_pages, .. }) => {
            ctx.say(format!(
                "❌ **Invalid page!** Pick a page between 1 and {}.",
                total_pages
            ))
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(embeds::report_page_embed(&page))
            .components(page_rows(ctx.author().id.get(), &page)),
    )
    .await?;
    Ok(())
}

/// Show a moderator's roles and the reports they filed
#[poise::command(slash_command, guild_only, check = "staff_check")]
pub async fn reporterinfo(
    ctx: Context<'_>,
    #[description = "Moderator to look up (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild = ctx.guild_id().ok_or("This command only works in servers")?;

    let role_mentions: Vec<String> = match guild.member(ctx.http(), target.id).await {
        Ok(member) => member
            .roles
            .iter()
            .map(|role| format!("<@&{}>", role.get()))
            .collect(),
        Err(e) => {
            tracing::debug!(user_id = target.id.get(), "Could not fetch member: {}", e);
            Vec::new()
        }
    };

    let manager = ctx.data().reports.manager(guild.get()).await?;
    let filed = manager.get_reports_by_moderator(target.id.get()).await;

    ctx.send(poise::CreateReply::default().embed(embeds::moderator_embed(
        &target.name,
        &role_mentions,
        &filed,
    )))
    .await?;
    Ok(())
}
