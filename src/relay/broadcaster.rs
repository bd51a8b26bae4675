use crate::i18n::LanguageTag;
use crate::relay::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Recipient};
use crate::translation::{TranslationGateway, TranslationResult};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Line delivered to a recipient for a successful translation.
pub fn format_translated_line(source_language: &str, target_language: &str, text: &str) -> String {
    format!("{} → {}: {}", source_language, target_language, text)
}

/// What happened to each recipient of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that were sent a translated line
    pub translated: usize,

    /// Recipients that were sent an `[Error]` line instead
    pub failed: usize,

    /// Recipients whose channel was closed; they have been unregistered
    pub dropped: usize,
}

impl BroadcastReport {
    pub fn recipients(&self) -> usize {
        self.translated + self.failed + self.dropped
    }
}

enum Delivery {
    Translated,
    Failed,
    Dropped,
}

/// The single chat room: connection registry plus per-recipient translation.
pub struct ChatRelay {
    registry: ConnectionRegistry,
    gateway: TranslationGateway,
}

impl ChatRelay {
    pub fn new(gateway: TranslationGateway) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            gateway,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &TranslationGateway {
        &self.gateway
    }

    /// Register an accepted connection and return its identity.
    pub fn connect(&self, language: LanguageTag, handle: ConnectionHandle) -> ConnectionId {
        let id = self.registry.next_id();
        info!("✓ {} joined speaking {}", id, language);
        self.registry.register(id, language, handle);
        info!("{} connection(s) open", self.registry.len());
        id
    }

    /// Remove a connection. Safe to call for connections already removed.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.registry.unregister(id) {
            info!("{} left ({} connection(s) open)", id, self.registry.len());
        }
    }

    /// Close every socket and empty the registry. Used on shutdown.
    pub fn close_all(&self) {
        let connections = self.registry.drain();
        info!("Closing {} connection(s)", connections.len());
        for connection in connections {
            connection.handle.close();
        }
    }

    /// Deliver `message` from `sender` to every other connection, translated
    /// into each recipient's language.
    ///
    /// Recipients are served concurrently and independently. A failed
    /// translation becomes an `[Error]` line for that recipient only; a
    /// closed recipient channel unregisters that recipient. Nothing is sent
    /// back to the sender.
    pub async fn broadcast(&self, sender: ConnectionId, message: &str) -> BroadcastReport {
        let sender_language = self
            .registry
            .language_of(sender)
            .unwrap_or_else(LanguageTag::auto_detect);
        let recipients = self.registry.snapshot_except(sender);

        if recipients.is_empty() {
            debug!("{} sent a message with nobody else connected", sender);
            return BroadcastReport::default();
        }

        let deliveries = recipients
            .into_iter()
            .map(|recipient| self.deliver(recipient, message, &sender_language));

        let mut report = BroadcastReport::default();
        for delivery in join_all(deliveries).await {
            match delivery {
                Delivery::Translated => report.translated += 1,
                Delivery::Failed => report.failed += 1,
                Delivery::Dropped => report.dropped += 1,
            }
        }

        info!(
            "Broadcast from {} ({}): {} translated, {} failed, {} dropped",
            sender, sender_language, report.translated, report.failed, report.dropped
        );
        report
    }

    async fn deliver(
        &self,
        recipient: Recipient,
        message: &str,
        sender_language: &LanguageTag,
    ) -> Delivery {
        let result = self
            .gateway
            .translate(
                message,
                recipient.language.as_str(),
                Some(sender_language.as_str()),
            )
            .await;

        let (sent, outcome) = match result {
            TranslationResult::Translated {
                text,
                source_language,
            } => {
                let line =
                    format_translated_line(&source_language, recipient.language.as_str(), &text);
                (
                    recipient.handle.send_text(recipient.id, line),
                    Delivery::Translated,
                )
            }
            TranslationResult::Failed { reason } => (
                recipient.handle.send_error(recipient.id, &reason),
                Delivery::Failed,
            ),
        };

        match sent {
            Ok(()) => outcome,
            Err(e) => {
                warn!("✗ Dropping recipient: {}", e);
                self.disconnect(recipient.id);
                Delivery::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::registry::Outbound;
    use crate::translation::test_support::StubProvider;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn relay_with(provider: StubProvider) -> ChatRelay {
        ChatRelay::new(TranslationGateway::new(Arc::new(provider)))
    }

    fn join(relay: &ChatRelay, language: &str) -> (ConnectionId, UnboundedReceiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::channel();
        (relay.connect(LanguageTag::new(language), handle), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let Outbound::Text(line) = frame {
                lines.push(line);
            }
        }
        lines
    }

    // ==================== Formatting Tests ====================

    #[test]
    fn test_format_translated_line() {
        assert_eq!(
            format_translated_line("English", "Spanish", "hola"),
            "English → Spanish: hola"
        );
    }

    #[test]
    fn test_report_recipients() {
        let report = BroadcastReport {
            translated: 2,
            failed: 1,
            dropped: 1,
        };
        assert_eq!(report.recipients(), 4);
    }

    // ==================== Fan-out Tests ====================

    #[tokio::test]
    async fn test_broadcast_translates_per_recipient() {
        let relay = relay_with(StubProvider::new());
        let (a, mut a_rx) = join(&relay, "English");
        let (_b, mut b_rx) = join(&relay, "Spanish");
        let (_c, mut c_rx) = join(&relay, "Japanese");

        let report = relay.broadcast(a, "hello").await;

        assert_eq!(report.translated, 2);
        assert_eq!(drain(&mut b_rx), vec!["English → Spanish: [es] hello"]);
        assert_eq!(drain(&mut c_rx), vec!["English → Japanese: [ja] hello"]);
        assert!(drain(&mut a_rx).is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_other_connections() {
        let relay = relay_with(StubProvider::new());
        let (a, mut a_rx) = join(&relay, "English");

        let report = relay.broadcast(a, "anyone?").await;

        assert_eq!(report, BroadcastReport::default());
        assert!(drain(&mut a_rx).is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_isolated_to_recipient() {
        let relay = relay_with(StubProvider::new().failing_for("ja"));
        let (a, _a_rx) = join(&relay, "English");
        let (b, mut b_rx) = join(&relay, "Spanish");
        let (c, mut c_rx) = join(&relay, "Japanese");

        let report = relay.broadcast(a, "hello").await;

        assert_eq!(report.translated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(drain(&mut b_rx), vec!["English → Spanish: [es] hello"]);

        let c_lines = drain(&mut c_rx);
        assert_eq!(c_lines.len(), 1);
        assert!(c_lines[0].starts_with("[Error] "));
        assert!(c_lines[0].contains("no ja model"));

        // Failed translation does not drop the recipient
        assert!(relay.registry().contains(b));
        assert!(relay.registry().contains(c));
    }

    #[tokio::test]
    async fn test_broadcast_unknown_recipient_language_gets_english() {
        let relay = relay_with(StubProvider::new());
        let (a, _a_rx) = join(&relay, "Spanish");
        let (_b, mut b_rx) = join(&relay, "Esperanto");

        relay.broadcast(a, "hola").await;

        assert_eq!(drain(&mut b_rx), vec!["Spanish → Esperanto: [en] hola"]);
    }

    #[tokio::test]
    async fn test_broadcast_from_removed_sender_uses_auto_detect() {
        let relay = relay_with(StubProvider::new());
        let (a, _a_rx) = join(&relay, "English");
        let (_b, mut b_rx) = join(&relay, "French");

        relay.disconnect(a);
        relay.broadcast(a, "hello").await;

        assert_eq!(drain(&mut b_rx), vec!["Auto Detect → French: [fr] hello"]);
    }

    // ==================== Disconnect Tests ====================

    #[tokio::test]
    async fn test_disconnected_connection_is_not_targeted() {
        let relay = relay_with(StubProvider::new());
        let (a, _a_rx) = join(&relay, "English");
        let (b, mut b_rx) = join(&relay, "Spanish");
        let (_c, mut c_rx) = join(&relay, "Japanese");

        relay.disconnect(b);
        let report = relay.broadcast(a, "hello").await;

        assert_eq!(report.recipients(), 1);
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(drain(&mut c_rx), vec!["English → Japanese: [ja] hello"]);
    }

    #[tokio::test]
    async fn test_double_disconnect_is_harmless() {
        let relay = relay_with(StubProvider::new());
        let (a, _a_rx) = join(&relay, "English");

        relay.disconnect(a);
        relay.disconnect(a);

        assert!(relay.registry().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_removes_recipient_and_continues() {
        let relay = relay_with(StubProvider::new());
        let (a, _a_rx) = join(&relay, "English");
        let (b, b_rx) = join(&relay, "Spanish");
        let (c, mut c_rx) = join(&relay, "Korean");
        drop(b_rx);

        let report = relay.broadcast(a, "hello").await;

        assert_eq!(report.dropped, 1);
        assert_eq!(report.translated, 1);
        assert!(!relay.registry().contains(b));
        assert!(relay.registry().contains(c));
        assert_eq!(drain(&mut c_rx), vec!["English → Korean: [ko] hello"]);

        let report = relay.broadcast(a, "again").await;
        assert_eq!(report.recipients(), 1);
    }

    #[tokio::test]
    async fn test_unregister_during_broadcast() {
        let provider = StubProvider::new().with_delay(Duration::from_millis(100));
        let relay = Arc::new(relay_with(provider));
        let (a, _a_rx) = join(&relay, "English");
        let (b, b_rx) = join(&relay, "Spanish");
        let (_c, mut c_rx) = join(&relay, "German");

        let in_flight = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.broadcast(a, "hello").await })
        };

        // B leaves while its translation is still pending
        tokio::time::sleep(Duration::from_millis(20)).await;
        relay.disconnect(b);
        drop(b_rx);

        let report = in_flight.await.expect("broadcast should not panic");
        assert_eq!(report.dropped, 1);
        assert_eq!(report.translated, 1);
        assert_eq!(drain(&mut c_rx), vec!["English → German: [de] hello"]);

        let report = relay.broadcast(a, "later").await;
        assert_eq!(report.recipients(), 1);
    }

    #[tokio::test]
    async fn test_register_during_broadcast() {
        let provider = StubProvider::new().with_delay(Duration::from_millis(100));
        let relay = Arc::new(relay_with(provider));
        let (a, _a_rx) = join(&relay, "English");
        let (_b, mut b_rx) = join(&relay, "Spanish");

        let in_flight = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.broadcast(a, "first").await })
        };

        // C joins after the snapshot was taken
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (_c, mut c_rx) = join(&relay, "French");

        let report = in_flight.await.expect("broadcast should not panic");
        assert_eq!(report.recipients(), 1);
        assert_eq!(drain(&mut b_rx), vec!["English → Spanish: [es] first"]);
        assert!(drain(&mut c_rx).is_empty());

        let report = relay.broadcast(a, "second").await;
        assert_eq!(report.recipients(), 2);
        assert_eq!(drain(&mut c_rx), vec!["English → French: [fr] second"]);
    }

    // ==================== Shutdown Tests ====================

    #[tokio::test]
    async fn test_close_all_sends_close_and_empties_registry() {
        let relay = relay_with(StubProvider::new());
        let (_a, mut a_rx) = join(&relay, "English");
        let (_b, mut b_rx) = join(&relay, "Spanish");

        relay.close_all();

        assert!(relay.registry().is_empty());
        assert_eq!(a_rx.try_recv().unwrap(), Outbound::Close);
        assert_eq!(b_rx.try_recv().unwrap(), Outbound::Close);
    }

    // ==================== Concurrency Tests ====================

    #[tokio::test]
    async fn test_recipients_are_translated_concurrently() {
        let provider = StubProvider::new().with_delay(Duration::from_millis(200));
        let relay = relay_with(provider);
        let (a, _a_rx) = join(&relay, "English");
        let mut receivers = Vec::new();
        for language in ["Spanish", "French", "German", "Japanese", "Korean"] {
            receivers.push(join(&relay, language).1);
        }

        let start = std::time::Instant::now();
        let report = relay.broadcast(a, "hello").await;
        let elapsed = start.elapsed();

        assert_eq!(report.translated, 5);
        assert!(
            elapsed < Duration::from_millis(900),
            "Fan-out should not serialize provider calls, took {:?}",
            elapsed
        );
        for rx in receivers.iter_mut() {
            assert_eq!(drain(rx).len(), 1);
        }
    }

    // ==================== Property Tests ====================

    const LANGUAGES: [&str; 8] = [
        "English",
        "Spanish",
        "French",
        "German",
        "Japanese",
        "Korean",
        "Auto Detect",
        "Nonexistent",
    ];

    proptest! {
        #[test]
        fn prop_each_other_connection_gets_exactly_one_line(
            languages in prop::collection::vec(0..LANGUAGES.len(), 2..8),
            sender_index in any::<prop::sample::Index>(),
            failing in any::<bool>(),
        ) {
            let provider = if failing {
                StubProvider::new().failing_for("es")
            } else {
                StubProvider::new()
            };
            let relay = relay_with(provider);
            let mut members: Vec<_> = languages
                .iter()
                .map(|&i| join(&relay, LANGUAGES[i]))
                .collect();
            let sender = sender_index.index(members.len());
            let sender_id = members[sender].0;

            let report = tokio_test::block_on(relay.broadcast(sender_id, "hello"));

            prop_assert_eq!(report.recipients(), members.len() - 1);
            prop_assert_eq!(report.dropped, 0);
            for (index, (_, rx)) in members.iter_mut().enumerate() {
                let expected = if index == sender { 0 } else { 1 };
                prop_assert_eq!(drain(rx).len(), expected);
            }
        }
    }
}
