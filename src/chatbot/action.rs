//! Messages a turn asks the transport to deliver.

use std::time::Duration;

/// One delivery. Text may use `*bold*` markup; the transport renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    SendText(String),
    /// Inline buttons as `(payload, label)` pairs, in display order.
    SendButtons(String, Vec<(String, String)>),
    /// Single-choice menu; picking an option sends its label back as text.
    SendMenu(String, Vec<String>),
    SendDocument {
        caption: String,
        url: String,
        filename: String,
    },
}

impl OutboundAction {
    /// Text shown to the user (caption for documents).
    pub fn text(&self) -> &str {
        match self {
            OutboundAction::SendText(text)
            | OutboundAction::SendButtons(text, _)
            | OutboundAction::SendMenu(text, _) => text,
            OutboundAction::SendDocument { caption, .. } => caption,
        }
    }
}

/// An action plus how long to wait after delivering it.
///
/// The pause blocks the rest of the turn's dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub action: OutboundAction,
    pub pause: Duration,
}

impl Outbound {
    pub fn now(action: OutboundAction) -> Self {
        Self {
            action,
            pause: Duration::ZERO,
        }
    }

    pub fn then_wait(action: OutboundAction, pause: Duration) -> Self {
        Self { action, pause }
    }
}

/// Ordered actions produced by one turn.
#[derive(Debug, Default)]
pub struct Reply {
    items: Vec<Outbound>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.items.push(Outbound::now(OutboundAction::SendText(text.into())));
    }

    pub fn text_then_wait(&mut self, text: impl Into<String>, pause: Duration) {
        self.items
            .push(Outbound::then_wait(OutboundAction::SendText(text.into()), pause));
    }

    pub fn buttons(&mut self, text: impl Into<String>, buttons: &[(&str, &str)]) {
        let buttons = buttons
            .iter()
            .map(|(id, label)| (id.to_string(), label.to_string()))
            .collect();
        self.items
            .push(Outbound::now(OutboundAction::SendButtons(text.into(), buttons)));
    }

    pub fn menu(&mut self, text: impl Into<String>, options: Vec<String>) {
        self.items
            .push(Outbound::now(OutboundAction::SendMenu(text.into(), options)));
    }

    pub fn document(
        &mut self,
        caption: impl Into<String>,
        url: impl Into<String>,
        filename: impl Into<String>,
        pause: Duration,
    ) {
        self.items.push(Outbound::then_wait(
            OutboundAction::SendDocument {
                caption: caption.into(),
                url: url.into(),
                filename: filename.into(),
            },
            pause,
        ));
    }

    pub fn into_items(self) -> Vec<Outbound> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_keeps_order_and_pauses() {
        let mut reply = Reply::new();
        reply.text_then_wait("hola", Duration::from_secs(1));
        reply.buttons("¿Seguimos?", &[("Si", "Si"), ("No", "No")]);
        reply.document("Aquí está", "https://d/x.pdf", "x.pdf", Duration::from_secs(15));

        let items = reply.into_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].pause, Duration::from_secs(1));
        assert_eq!(
            items[1].action,
            OutboundAction::SendButtons(
                "¿Seguimos?".to_string(),
                vec![("Si".to_string(), "Si".to_string()), ("No".to_string(), "No".to_string())]
            )
        );
        assert_eq!(items[1].pause, Duration::ZERO);
        assert_eq!(items[2].action.text(), "Aquí está");
    }
}
