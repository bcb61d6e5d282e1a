// Renders a completed ResponseCard as a Discord embed.
//
// This layer is THIN - the card is already fully built by the core.

use crate::core::references::ResponseCard;
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};

pub fn render_card(card: &ResponseCard) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(card.title.as_str())
        .footer(CreateEmbedFooter::new(card.footer.as_str()));
    if let Some(url) = &card.url {
        embed = embed.url(url.as_str());
    }
    if let Some(description) = &card.description {
        embed = embed.description(description.as_str());
    }
    for field in &card.fields {
        embed = embed.field(field.name.as_str(), field.value.as_str(), field.inline);
    }
    embed
}
