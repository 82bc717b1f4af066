// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort fan-out of desk events to moderators.
//!
//! Every recipient is attempted independently. A failed delivery is logged
//! and counted; it never stops the remaining recipients and never touches
//! the question that triggered the notice.

use std::sync::Arc;

use futures::future::join_all;
use hotline_core::{
    Attachment, ChannelAdapter, HotlineError, Moderator, OutboundMessage, Question,
    QuestionId, QuestionOrigin, question_tag,
};
use tracing::{debug, warn};

/// Text plus optional photos, rendered once and sent to many chats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub photos: Vec<Attachment>,
}

impl Notice {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photos: Vec::new(),
        }
    }

    /// Announcement of a freshly submitted question.
    pub fn new_question(question: &Question, photos: Vec<Attachment>) -> Self {
        let header = match question.origin {
            QuestionOrigin::Chat => {
                let from = match question.user_id {
                    Some(uid) => format!("{} (id {uid})", question.submitter_name()),
                    None => question.submitter_name(),
                };
                format!("New question {}\nFrom: {from}", question.tag())
            }
            QuestionOrigin::Web => format!(
                "New question from the website {}\nContact: {}",
                question.tag(),
                question.submitter_name()
            ),
        };
        Self {
            text: format!(
                "{header}\n\n{}\n\nReply with /answer_{}",
                question.text, question.id
            ),
            photos,
        }
    }

    /// Tells moderators that someone took the question.
    pub fn claimed(question_id: QuestionId, moderator_name: &str) -> Self {
        Self::text(format!(
            "Question {} taken by {moderator_name}",
            question_tag(question_id)
        ))
    }
}

/// Per-broadcast delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends notices through a channel, degrading photo batches when needed.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn ChannelAdapter>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn ChannelAdapter>) -> Self {
        Self { channel }
    }

    /// Sends `notice` to every moderator concurrently.
    pub async fn broadcast(&self, moderators: &[Moderator], notice: &Notice) -> BroadcastReport {
        let sends = moderators
            .iter()
            .map(|m| async move { (m.user_id, self.deliver(m.user_id, notice).await) });

        let mut report = BroadcastReport::default();
        for (moderator_id, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    report.delivered += 1;
                    metrics::counter!("hotline_notifications_total", "outcome" => "delivered")
                        .increment(1);
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::counter!("hotline_notifications_total", "outcome" => "failed")
                        .increment(1);
                    warn!(moderator_id, error = %e, "failed to notify moderator");
                }
            }
        }
        debug!(
            delivered = report.delivered,
            failed = report.failed,
            "broadcast finished"
        );
        report
    }

    /// Sends one notice to one chat.
    ///
    /// No photos: plain text. One photo: a captioned photo. Several: an album
    /// with the caption on the first item, or one photo at a time when the
    /// channel has no albums or refuses this one.
    pub async fn deliver(&self, chat_id: i64, notice: &Notice) -> Result<(), HotlineError> {
        if notice.photos.is_empty() {
            self.channel
                .send(OutboundMessage::text(chat_id, notice.text.clone()))
                .await?;
            return Ok(());
        }

        let caps = self.channel.capabilities();
        let caption_fits = caps
            .max_caption_length
            .is_none_or(|max| notice.text.chars().count() <= max);
        let caption = caption_fits.then(|| notice.text.clone());

        if notice.photos.len() == 1 {
            self.channel
                .send(OutboundMessage::photo(
                    chat_id,
                    notice.photos[0].clone(),
                    caption,
                ))
                .await?;
        } else if caps.supports_albums && notice.photos.len() <= caps.max_album_size {
            let album = OutboundMessage::album(chat_id, notice.photos.clone(), caption.clone());
            match self.channel.send(album).await {
                Ok(_) => {}
                Err(HotlineError::MediaRejected { message }) => {
                    debug!(chat_id, %message, "album rejected, sending photos one by one");
                    self.send_individually(chat_id, &notice.photos, caption)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        } else {
            self.send_individually(chat_id, &notice.photos, caption)
                .await?;
        }

        if !caption_fits {
            self.channel
                .send(OutboundMessage::text(chat_id, notice.text.clone()))
                .await?;
        }
        Ok(())
    }

    async fn send_individually(
        &self,
        chat_id: i64,
        photos: &[Attachment],
        caption: Option<String>,
    ) -> Result<(), HotlineError> {
        let mut caption = caption;
        for photo in photos {
            self.channel
                .send(OutboundMessage::photo(chat_id, photo.clone(), caption.take()))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotline_core::{OutboundBody, UserProfile};
    use hotline_test_utils::MockChannel;
    use tracing_test::traced_test;

    fn moderator(id: i64) -> Moderator {
        Moderator {
            user_id: id,
            username: None,
            first_name: None,
            is_active: true,
        }
    }

    fn photos(n: usize) -> Vec<Attachment> {
        (0..n)
            .map(|i| Attachment::ChatPhoto {
                file_id: format!("file-{i}"),
                unique_id: format!("uniq-{i}"),
            })
            .collect()
    }

    fn chat_question() -> Question {
        Question {
            id: 1,
            origin: QuestionOrigin::Chat,
            user_id: Some(7),
            contact: None,
            text: "App crashes on login".into(),
            status: hotline_core::QuestionStatus::New,
            moderator_id: None,
            created_at: "2026-01-01 00:00:00".into(),
            submitter: Some(UserProfile {
                user_id: 7,
                username: Some("alex".into()),
                first_name: None,
            }),
        }
    }

    #[test]
    fn new_question_notice_names_tag_and_claim_command() {
        let notice = Notice::new_question(&chat_question(), vec![]);
        assert!(notice.text.contains("#Q1"));
        assert!(notice.text.contains("@alex (id 7)"));
        assert!(notice.text.contains("App crashes on login"));
        assert!(notice.text.ends_with("Reply with /answer_1"));
    }

    #[test]
    fn web_notice_mentions_website_and_contact() {
        let mut q = chat_question();
        q.origin = QuestionOrigin::Web;
        q.user_id = None;
        q.submitter = None;
        q.contact = Some("ann@example.com".into());
        let notice = Notice::new_question(&q, vec![]);
        assert!(notice.text.starts_with("New question from the website #Q1"));
        assert!(notice.text.contains("ann@example.com"));
    }

    #[tokio::test]
    #[traced_test]
    async fn one_failing_moderator_does_not_block_others() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_chat(1);
        let notifier = Notifier::new(channel.clone());

        let report = notifier
            .broadcast(
                &[moderator(1), moderator(2), moderator(3)],
                &Notice::text("New question #Q5"),
            )
            .await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert!(channel.texts_to(2).iter().any(|t| t.contains("#Q5")));
        assert!(channel.texts_to(3).iter().any(|t| t.contains("#Q5")));
        assert!(logs_contain("failed to notify moderator"));
    }

    #[tokio::test]
    async fn photo_counts_pick_send_shape() {
        let channel = Arc::new(MockChannel::new());
        let notifier = Notifier::new(channel.clone());

        let mut notice = Notice::text("caption");
        notifier.deliver(1, &notice).await.unwrap();
        notice.photos = photos(1);
        notifier.deliver(2, &notice).await.unwrap();
        notice.photos = photos(3);
        notifier.deliver(3, &notice).await.unwrap();

        let sent = channel.sent();
        assert!(matches!(sent[0].body, OutboundBody::Text(_)));
        assert!(matches!(
            &sent[1].body,
            OutboundBody::Photo { caption: Some(c), .. } if c == "caption"
        ));
        assert!(matches!(
            &sent[2].body,
            OutboundBody::Album { photos, caption: Some(_) } if photos.len() == 3
        ));
        assert_eq!(sent.len(), 3);
    }

    #[tokio::test]
    async fn rejected_album_falls_back_to_single_photos() {
        let channel = Arc::new(MockChannel::new());
        channel.reject_albums(true);
        let notifier = Notifier::new(channel.clone());

        let notice = Notice {
            text: "see attached".into(),
            photos: photos(2),
        };
        notifier.deliver(9, &notice).await.unwrap();

        let sent = channel.sent_to(9);
        assert_eq!(sent.len(), 2);
        let captions: Vec<_> = sent
            .iter()
            .map(|m| match &m.body {
                OutboundBody::Photo { caption, .. } => caption.clone(),
                other => panic!("expected single photo, got {other:?}"),
            })
            .collect();
        assert_eq!(captions, vec![Some("see attached".to_string()), None]);
    }

    #[tokio::test]
    async fn overlong_caption_follows_the_photos_as_text() {
        let channel = Arc::new(MockChannel::new());
        let notifier = Notifier::new(channel.clone());
        let max = channel.capabilities().max_caption_length.unwrap();
        let long = "x".repeat(max + 1);

        let notice = Notice {
            text: long.clone(),
            photos: photos(2),
        };
        notifier.deliver(6, &notice).await.unwrap();
        let single = Notice {
            text: long.clone(),
            photos: photos(1),
        };
        notifier.deliver(7, &single).await.unwrap();

        let sent = channel.sent_to(6);
        assert_eq!(sent.len(), 2);
        assert!(matches!(
            &sent[0].body,
            OutboundBody::Album { photos, caption: None } if photos.len() == 2
        ));
        assert!(matches!(&sent[1].body, OutboundBody::Text(t) if *t == long));

        let sent = channel.sent_to(7);
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0].body, OutboundBody::Photo { caption: None, .. }));
        assert!(matches!(&sent[1].body, OutboundBody::Text(t) if *t == long));
    }

    #[tokio::test]
    async fn other_album_errors_are_not_degraded() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_chat(4);
        let notifier = Notifier::new(channel.clone());

        let notice = Notice {
            text: "x".into(),
            photos: photos(2),
        };
        assert!(notifier.deliver(4, &notice).await.is_err());
        assert!(channel.sent_to(4).is_empty());
    }
}
