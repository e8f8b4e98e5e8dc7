// Bot presence.
//
// Only Discord SDK types here; the status text never changes at runtime.

use poise::serenity_prelude as serenity;

const WATCHING: &str = "over Sandbox games";

/// Show "Watching over Sandbox games" under the bot's name.
pub fn set_default_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching(WATCHING);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the gateway reports ready.
pub fn on_ready(ctx: &serenity::Context) {
    set_default_status(ctx);
    tracing::info!(activity = WATCHING, "Presence set");
}
