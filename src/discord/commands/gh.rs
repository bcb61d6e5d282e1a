// The /gh slash command - explicit reference lookup.

use crate::core::policy::LookupOutcome;
use crate::discord::references::card_render;
use crate::discord::{Context, Error, REMOVE_EMOJI};
use poise::serenity_prelude as serenity;

/// Get a GitHub pull request / issue from its number.
#[poise::command(slash_command)]
pub async fn gh(
    ctx: Context<'_>,
    #[description = "Issue or pull request number"] number: u64,
) -> Result<(), Error> {
    let outcome = ctx
        .data()
        .engine
        .handle_lookup_command(ctx.channel_id().get(), number, ctx.author().id.get())
        .await;

    match outcome {
        LookupOutcome::Refused(notice) | LookupOutcome::NotFound(notice) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(notice)
                    .ephemeral(true),
            )
            .await?;
        }
        LookupOutcome::Card(card) => {
            let reply = ctx
                .send(poise::CreateReply::default().embed(card_render::render_card(&card)))
                .await?;
            let posted = reply.message().await?;
            let react = posted
                .react(
                    &ctx.serenity_context().http,
                    serenity::ReactionType::Unicode(REMOVE_EMOJI.to_string()),
                )
                .await;
            if let Err(err) = react {
                tracing::warn!("Failed to add remove reaction: {}", err);
            }
        }
    }

    Ok(())
}
