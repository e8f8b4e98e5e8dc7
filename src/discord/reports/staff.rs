// Who may use the report commands: members holding the configured staff role
// (matched by name, case-insensitive) and the configured owner.

use super::{Context, Error};
use crate::infra::settings::Settings;
use poise::serenity_prelude as serenity;

pub fn role_matches(role_name: &str, staff_role: &str) -> bool {
    role_name.trim().eq_ignore_ascii_case(staff_role.trim())
}

/// Resolve `roles` against the cached guild and look for the staff role.
pub fn is_staff(
    cache: &serenity::Cache,
    settings: &Settings,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    roles: &[serenity::RoleId],
) -> bool {
    if settings.owner_id == Some(user_id.get()) {
        return true;
    }

    let Some(guild) = cache.guild(guild_id) else {
        tracing::warn!(guild_id = guild_id.get(), "Guild not cached, denying staff check");
        return false;
    };

    roles.iter().any(|id| {
        guild
            .roles
            .get(id)
            .is_some_and(|role| role_matches(&role.name, &settings.staff_role))
    })
}

/// Poise command check. Tells the user why they were turned away.
pub async fn staff_check(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };

    let roles = match ctx.author_member().await {
        Some(member) => member.roles.clone(),
        None => Vec::new(),
    };

    let allowed = is_staff(
        ctx.cache(),
        &ctx.data().settings,
        guild_id,
        ctx.author().id,
        &roles,
    );

    if !allowed {
        tracing::debug!(
            user_id = ctx.author().id.get(),
            command = %ctx.command().name,
            "Staff check failed"
        );
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "❌ You need the **{}** role to use this command.",
                    ctx.data().settings.staff_role
                ))
                .ephemeral(true),
        )
        .await?;
    }

    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_matching() {
        assert!(role_matches("Staff", "Staff"));
        assert!(role_matches("staff", "Staff"));
        assert!(role_matches(" STAFF ", "Staff"));
        assert!(!role_matches("Staffer", "Staff"));
        assert!(!role_matches("Member", "Staff"));
    }
}
