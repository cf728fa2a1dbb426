//! Telegram client using teloxide.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup, ParseMode,
};
use tracing::{debug, info, warn};

use crate::chatbot::action::OutboundAction;
use crate::chatbot::gateways::{MessagingTransport, TransportError};

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());

/// Escape HTML and turn `*bold*` markup into `<b>` tags.
pub fn to_html(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    BOLD.replace_all(&escaped, "<b>$1</b>").into_owned()
}

/// One button per row, like the reply keyboards users are used to.
fn inline_keyboard(buttons: &[(String, String)]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|(payload, label)| vec![InlineKeyboardButton::callback(label.clone(), payload.clone())]),
    )
}

fn option_keyboard(options: &[String]) -> KeyboardMarkup {
    KeyboardMarkup::new(options.iter().map(|o| vec![KeyboardButton::new(o.clone())]))
        .one_time_keyboard()
        .resize_keyboard()
}

fn chat_id(recipient: &str) -> Result<ChatId, TransportError> {
    recipient
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| TransportError(format!("invalid chat id {recipient:?}")))
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        caption: &str,
        url: &str,
        filename: &str,
    ) -> Result<(), TransportError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| TransportError(format!("invalid document URL {url:?}: {e}")))?;
        info!("📄 Sending {filename} to chat {}", chat_id.0);

        self.bot
            .send_document(chat_id, InputFile::url(url).file_name(filename.to_string()))
            .caption(to_html(caption))
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| TransportError(format!("Failed to send document: {e}")))
    }
}

#[async_trait]
impl MessagingTransport for TelegramClient {
    async fn send(&self, recipient: &str, action: &OutboundAction) -> Result<(), TransportError> {
        let chat_id = chat_id(recipient)?;

        let result = match action {
            OutboundAction::SendDocument {
                caption,
                url,
                filename,
            } => return self.send_document(chat_id, caption, url, filename).await,
            OutboundAction::SendButtons(text, buttons) => {
                self.bot
                    .send_message(chat_id, to_html(text))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(inline_keyboard(buttons))
                    .await
            }
            OutboundAction::SendMenu(text, options) => {
                self.bot
                    .send_message(chat_id, to_html(text))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(option_keyboard(options))
                    .await
            }
            OutboundAction::SendText(text) => {
                self.bot
                    .send_message(chat_id, to_html(text))
                    .parse_mode(ParseMode::Html)
                    .await
            }
        };

        match result {
            Ok(msg) => {
                debug!("Sent msg {} to chat {}", msg.id.0, chat_id.0);
                Ok(())
            }
            Err(e) => {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                Err(TransportError(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_markup() {
        assert_eq!(
            to_html("Soy *TUBOT*, ejecutivo virtual de *TUEMPRESA*."),
            "Soy <b>TUBOT</b>, ejecutivo virtual de <b>TUEMPRESA</b>."
        );
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(to_html("a < b & *c*"), "a &lt; b &amp; <b>c</b>");
    }

    #[test]
    fn test_unbalanced_asterisk_left_alone() {
        assert_eq!(to_html("5 * 3"), "5 * 3");
        assert_eq!(to_html("*a\nb*"), "*a\nb*");
    }

    #[test]
    fn test_chat_id_parsing() {
        assert_eq!(chat_id(" 12345 ").unwrap(), ChatId(12345));
        assert_eq!(chat_id("-100200").unwrap(), ChatId(-100200));
        assert!(chat_id("abc").is_err());
    }

    #[test]
    fn test_keyboards_keep_order() {
        let buttons = vec![
            ("Si".to_string(), "Si".to_string()),
            ("Cotiza".to_string(), "Volver a cotizar".to_string()),
        ];
        let markup = inline_keyboard(&buttons);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Volver a cotizar");

        let menu = option_keyboard(&["Riesgos".to_string(), "Administracion".to_string()]);
        assert_eq!(menu.keyboard.len(), 2);
        assert_eq!(menu.keyboard[0][0].text, "Riesgos");
    }
}
