// Reaction-add handling - the react-remove path for bot-authored cards.
//
// The authorization decision lives in the core; this layer only filters
// the obvious non-candidates, fetches the target message, and deletes it
// when the core says so.

use crate::core::policy::{self, WithdrawalTarget};
use crate::discord::{Data, Error, REMOVE_EMOJI};
use poise::serenity_prelude as serenity;

pub async fn handle_reaction_add(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    _data: &Data,
) -> Result<(), Error> {
    let bot_user = ctx.cache.current_user().id.get();

    let Some(reactor) = reaction.user_id.map(|id| id.get()) else {
        return Ok(());
    };
    if reactor == bot_user {
        return Ok(());
    }
    match &reaction.emoji {
        serenity::ReactionType::Unicode(name) if name == REMOVE_EMOJI => {}
        _ => {
            tracing::debug!("Ignoring reaction with non-remove emoji");
            return Ok(());
        }
    }

    // Fetch the target; a fetch failure is a degraded no-op.
    let message = match reaction.message(&ctx.http).await {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(
                "Failed to fetch message {} for reaction: {}",
                reaction.message_id,
                err
            );
            return Ok(());
        }
    };

    let target = WithdrawalTarget {
        author_id: message.author.id.get(),
        embed_footers: message
            .embeds
            .iter()
            .map(|e| e.footer.as_ref().map(|f| f.text.clone()))
            .collect(),
    };

    if policy::evaluate_withdrawal(&target, reactor, bot_user) {
        tracing::info!("React-deleting our message {}", message.id);
        if let Err(err) = message.delete(&ctx.http).await {
            tracing::warn!("Failed to react-delete message {}: {}", message.id, err);
        }
    }

    Ok(())
}
