// Embed builders for report views.
//
// All user-facing text lives here or in the command handlers; the core only
// hands us plain data.

use crate::core::reports::{PendingReport, PlayerSummary, Report, ReportPage, ReportUpdate};
use crate::discord::add_image::is_link;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

const REPORT_COLOR: u32 = 0x3498db; // Blue
const SUCCESS_COLOR: u32 = 0x2ecc71; // Green
const CANCEL_COLOR: u32 = 0xe74c3c; // Red

/// Discord rejects field values longer than this.
const FIELD_LIMIT: usize = 1024;
/// Discord rejects titles longer than this.
const TITLE_LIMIT: usize = 256;
/// Player and moderator names inside titles and lines.
pub const NAME_LIMIT: usize = 100;
/// Each side of an edit diff shares one field with the other.
const EDIT_VALUE_LIMIT: usize = 480;

/// How many of a moderator's reports `reporterinfo` lists.
pub const MAX_MODERATOR_REPORTS: usize = 15;

fn base_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .color(REPORT_COLOR)
        .footer(serenity::CreateEmbedFooter::new("Reporter"))
        .timestamp(serenity::Timestamp::now())
}

/// Absolute + relative Discord timestamp markup.
pub fn discord_time(time: &DateTime<Utc>) -> String {
    format!("<t:{0}:f> (<t:{0}:R>)", time.timestamp())
}

fn moderator_mention(report: &Report) -> String {
    if report.has_moderator() {
        format!("<@{}>", report.moderator_id)
    } else {
        "` Unavailable. `".to_string()
    }
}

fn report_line(report: &Report) -> String {
    format!("` {} ` - type: {}", report.id, report.report_type)
}

/// Cut `text` to at most `limit` characters, marking the cut with `…`.
pub fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn name(text: &str) -> String {
    truncate_text(text, NAME_LIMIT)
}

fn field_text(text: &str) -> String {
    truncate_text(text, FIELD_LIMIT)
}

/// Join lines into a single field value, cutting off with a count of what
/// didn't fit.
pub fn fit_field(lines: &[String]) -> String {
    if lines.is_empty() {
        return "None.".to_string();
    }

    let mut out = String::new();
    for (shown, line) in lines.iter().enumerate() {
        let remaining = lines.len() - shown;
        let tail = format!("…and {} more", remaining);
        if out.len() + line.len() + 1 + tail.len() + 1 > FIELD_LIMIT {
            out.push_str(&tail);
            return out;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn pending_report_embed(pending: &PendingReport) -> serenity::CreateEmbed {
    let draft = &pending.draft;
    let mut embed = base_embed()
        .title("Reporting user")
        .description(format!(
            "Starting on report for player: ` {} `\nPick a type below to confirm.",
            name(&draft.subject_name)
        ))
        .field("Time:", discord_time(&draft.offense_time), false);

    if draft.blocks_broken != 0 {
        embed = embed.field("Blocks broken:", draft.blocks_broken.to_string(), true);
    }
    embed = embed.field("Punishment:", field_text(&draft.punishment), true);
    if !draft.note.is_empty() {
        embed = embed.field("Note:", field_text(&draft.note), false);
    }
    embed
}

pub fn cancelled_embed() -> serenity::CreateEmbed {
    base_embed()
        .color(CANCEL_COLOR)
        .title("Canceled report creation")
}

pub fn confirmed_embed(report: &Report) -> serenity::CreateEmbed {
    base_embed()
        .color(SUCCESS_COLOR)
        .title("Successfully registered report!")
        .description(format!(
            "Created report for: ` {} ` with ID: ` {} `",
            name(&report.subject_name),
            report.id
        ))
}

pub fn report_embed(report: &Report) -> serenity::CreateEmbed {
    let mut embed = base_embed()
        .title(format!("Report: ` {} `", report.id))
        .field("Reported by:", moderator_mention(report), false)
        .field("User:", name(&report.subject_name), true)
        .field("Type:", report.report_type.to_string(), true)
        .field("Time:", discord_time(&report.offense_time), false);

    if report.blocks_broken != 0 {
        embed = embed.field("Blocks broken:", report.blocks_broken.to_string(), true);
    }
    embed = embed.field("Punishment:", field_text(&report.punishment), true);
    if !report.note.is_empty() {
        embed = embed.field("Note:", field_text(&report.note), false);
    }
    // Discord refuses the whole embed if the image url isn't http(s).
    if let Some(first) = report.proof_urls.iter().find(|url| is_link(url)) {
        embed = embed.image(first.clone());
    }
    embed
}

pub fn images_embed(report: &Report) -> serenity::CreateEmbed {
    let embed = base_embed().title(format!(
        "Displaying all images for report: ` {} `",
        report.id
    ));

    if report.proof_urls.is_empty() {
        embed.description(
            "**No images to display!**\nAdd images with:\n\n\
             > ` @Reporter addimage <reportID> (image link(s)) `\n\
             > *Or attach images to the message you're sending.*\n\n\
             :mega: Split multiple links with a single space.",
        )
    } else {
        embed.description(format!("{} image(s) attached.", report.proof_urls.len()))
    }
}

pub fn player_summary_embed(summary: &PlayerSummary) -> serenity::CreateEmbed {
    let lines: Vec<String> = summary.reports.iter().map(report_line).collect();
    let blocks = if summary.total_blocks_broken != 0 {
        summary.total_blocks_broken.to_string()
    } else {
        "None".to_string()
    };

    base_embed()
        .title(truncate_text(
            &format!("User information: ` {} `", name(&summary.subject_name)),
            TITLE_LIMIT,
        ))
        .description(format!(
            "I have found ` {} ` report(s) for specified user.",
            summary.reports.len()
        ))
        .field("Total blocks broken:", blocks, false)
        .field(
            "Last punishment given:",
            field_text(&summary.last_punishment),
            false,
        )
        .field(format!("Reports [{}]:", lines.len()), fit_field(&lines), false)
}

pub fn no_player_reports_embed() -> serenity::CreateEmbed {
    base_embed()
        .title("No reports found!")
        .description("This user does not have any known reports.")
}

pub fn report_page_embed(page: &ReportPage) -> serenity::CreateEmbed {
    let lines: Vec<String> = page
        .reports
        .iter()
        .map(|r| {
            format!(
                "` {} ` **{}** - Type: {}\n⤷ Reported by: {}",
                r.id,
                name(&r.subject_name),
                r.report_type,
                moderator_mention(r)
            )
        })
        .collect();

    let body = if lines.is_empty() {
        "No reports have been filed yet.".to_string()
    } else {
        lines.join("\n")
    };

    base_embed()
        .title("Report list")
        .description(format!(
            "Currently viewing page: ` {} `\n\n{}",
            page.page, body
        ))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Reporter | Page {} of {} | {} report(s)",
            page.page, page.total_pages, page.total_reports
        )))
}

/// Field-level differences between two versions of a report.
pub fn edit_changes(before: &Report, after: &Report) -> Vec<(&'static str, String, String)> {
    let mut changes = Vec::new();

    if before.report_type != after.report_type {
        changes.push((
            "type",
            before.report_type.to_string(),
            after.report_type.to_string(),
        ));
    }
    if before.note != after.note {
        changes.push(("note", before.note.clone(), after.note.clone()));
    }
    if before.punishment != after.punishment {
        changes.push((
            "punishment",
            before.punishment.clone(),
            after.punishment.clone(),
        ));
    }
    if before.offense_time != after.offense_time {
        changes.push((
            "time",
            discord_time(&before.offense_time),
            discord_time(&after.offense_time),
        ));
    }
    if before.subject_name != after.subject_name {
        changes.push((
            "username",
            before.subject_name.clone(),
            after.subject_name.clone(),
        ));
    }
    if before.blocks_broken != after.blocks_broken {
        changes.push((
            "total blocks broken",
            before.blocks_broken.to_string(),
            after.blocks_broken.to_string(),
        ));
    }

    changes
}

pub fn edit_embed(update: &ReportUpdate) -> serenity::CreateEmbed {
    let changes = edit_changes(&update.before, &update.after);
    let mut embed = base_embed().title(format!("Editing report: ` {} `", update.after.id));

    if changes.is_empty() {
        return embed.description("Nothing changed, the new values match the old ones.");
    }

    for (name, old, new) in changes {
        let old = if old.is_empty() { " ".to_string() } else { old };
        embed = embed.field(
            format!("Edited {}:", name),
            format!(
                "**🢒 Old:** ` {} `\n**🢒 New:** ` {} `",
                truncate_text(&old, EDIT_VALUE_LIMIT),
                truncate_text(&new, EDIT_VALUE_LIMIT)
            ),
            false,
        );
    }
    embed
}

/// Newest-first list of a moderator's reports, capped at
/// `MAX_MODERATOR_REPORTS`.
pub fn moderator_report_lines(reports: &[Report]) -> Vec<String> {
    let mut lines: Vec<String> = reports
        .iter()
        .rev()
        .take(MAX_MODERATOR_REPORTS)
        .map(report_line)
        .collect();

    if reports.len() > MAX_MODERATOR_REPORTS {
        lines.push(format!(
            "Unable to display additional reports. Displaying latest ` {} `.",
            MAX_MODERATOR_REPORTS
        ));
    }
    lines
}

pub fn moderator_embed(
    user_name: &str,
    role_mentions: &[String],
    reports: &[Report],
) -> serenity::CreateEmbed {
    let roles = if role_mentions.is_empty() {
        "None.".to_string()
    } else {
        role_mentions.join(", ")
    };
    let lines = moderator_report_lines(reports);

    base_embed()
        .title(truncate_text(
            &format!("Info about ` {} `", name(user_name)),
            TITLE_LIMIT,
        ))
        .field("Roles:", roles, false)
        .field(
            format!("Total reports [{}]:", reports.len()),
            fit_field(&lines),
            false,
        )
}
