// `@Reporter addimage <reportID> [links...]` message command.
//
// Images come from links in the message text and from attachments. Words are
// split on whitespace; only http(s) links are stored, anything else is counted
// and reported back.

use super::{Data, Error};
use crate::discord::staff::is_staff;
use poise::serenity_prelude as serenity;

const KEYWORD: &str = "addimage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddImageCommand {
    Add {
        report_id: u64,
        links: Vec<String>,
        /// Words after the id that weren't links.
        skipped: usize,
    },
    /// The keyword was there but no usable report id followed it.
    MissingId,
}

/// Whether `word` is something Discord will accept as an image url.
pub fn is_link(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// Find `addimage` among the first words of a message that mentions the bot.
/// Mentions ahead of the keyword are skipped.
pub fn parse_add_image(content: &str) -> Option<AddImageCommand> {
    let mut words = content
        .split_whitespace()
        .skip_while(|w| w.starts_with("<@") && w.ends_with('>'));

    if !words.next()?.eq_ignore_ascii_case(KEYWORD) {
        return None;
    }

    let Some(report_id) = words.next().and_then(|id| id.parse::<u64>().ok()) else {
        return Some(AddImageCommand::MissingId);
    };

    let (links, other): (Vec<&str>, Vec<&str>) = words.partition(|w| is_link(w));
    Some(AddImageCommand::Add {
        report_id,
        links: links.into_iter().map(str::to_string).collect(),
        skipped: other.len(),
    })
}

/// Handle a guild message that mentions the bot. Anything that isn't an
/// `addimage` command is ignored.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let Some(command) = parse_add_image(&message.content) else {
        return Ok(());
    };

    let roles = message
        .member
        .as_ref()
        .map(|m| m.roles.clone())
        .unwrap_or_default();
    if !is_staff(&ctx.cache, &data.settings, guild_id, message.author.id, &roles) {
        tracing::debug!(user_id = message.author.id.get(), "addimage from non-staff user ignored");
        return Ok(());
    }

    let (report_id, mut links, skipped) = match command {
        AddImageCommand::Add {
            report_id,
            links,
            skipped,
        } => (report_id, links, skipped),
        AddImageCommand::MissingId => {
            message
                .reply_ping(
                    &ctx.http,
                    "❌ Usage: `@Reporter addimage <reportID> (image link(s))`",
                )
                .await?;
            return Ok(());
        }
    };
    links.extend(message.attachments.iter().map(|a| a.url.clone()));

    if links.is_empty() {
        message
            .reply_ping(
                &ctx.http,
                "❌ **No images found!** Paste links or attach images to your message.",
            )
            .await?;
        return Ok(());
    }

    let manager = data.reports.manager(guild_id.get()).await?;
    let added = links.len();
    let mut reply = match manager.add_images(report_id, links).await? {
        Some(report) => format!(
            "✅ Added {} image(s) to report ` {} `. It now has {} in total.",
            added,
            report.id,
            report.proof_urls.len()
        ),
        None => format!("❌ **Report ID invalid!** No report ` {} ` exists.", report_id),
    };

    if skipped > 0 {
        reply.push_str(&format!(
            "\n⚠️ Ignored {} word(s) that weren't http(s) links.",
            skipped
        ));
    }

    message.reply_ping(&ctx.http, reply).await?;
    Ok(())
}
