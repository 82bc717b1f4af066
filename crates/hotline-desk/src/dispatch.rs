// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing of inbound chat messages.
//!
//! [`classify`] is a pure function of the conversation state and the message
//! content. [`Dispatcher`] executes the resulting [`Route`] against the store,
//! the lock and the channel, and always answers the sender with something.

use std::sync::Arc;

use hotline_core::{
    AnswerDelivery, Attachment, ChannelAdapter, HotlineError, InboundMessage, Keyboard,
    MessageContent, NewQuestion, OutboundMessage, QuestionId, QuestionOrigin, StorageAdapter,
    UserProfile, question_tag,
};
use tracing::{debug, error, info, warn};

use crate::directory::{ModeratorDirectory, Registration};
use crate::intake::Intake;
use crate::lock::{ClaimOutcome, QuestionLock};
use crate::notify::{Notice, Notifier};
use crate::session::{Conversation, QuestionDraft, SessionKey, SessionStore, UserState};

pub const BUTTON_FEEDBACK: &str = "Leave feedback";
pub const BUTTON_QUESTION: &str = "Ask a question";
pub const BUTTON_CANCEL: &str = "Cancel";

const WELCOME: &str = "Hi! I collect feedback and questions for our website.\n\n\
What can I help with?\n\
- Leave feedback: your opinion matters to us\n\
- Ask a question: we will be glad to answer it\n\n\
Choose an option below:";
const FEEDBACK_PROMPT: &str = "Please write your feedback as a text message:";
const FEEDBACK_THANKS: &str =
    "Thank you for your feedback! We value your opinion and will take it into account.";
const FEEDBACK_NEEDS_TEXT: &str = "Please send your feedback as a text message.";
const CHOOSE_OPTION: &str = "Please choose one of the options below:";
const CANCELLED: &str = "Operation cancelled. What would you like to do?";
const UNKNOWN_COMMAND: &str = "Unknown command. Use /start to begin.";
const NO_PERMISSION: &str = "You do not have permission to run this command.";
const QUESTION_NEEDS_TEXT: &str = "Please send:\n\
- a text describing the problem\n\
- or a photo with a caption describing it\n\
- or photos first, then the text";
const EMPTY_QUESTION: &str = "The problem description cannot be empty.\n\n\
Please add a text describing the steps, your device and the error.";
const BAD_CLAIM: &str = "Invalid command format. Use /answer_123";
const ANSWER_CANCELLED: &str = "Answer cancelled.";
const GENERIC_FAILURE: &str = "Something went wrong while handling your message. Please try again.";

/// A slash command typed into the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Moderator,
    Stats,
    /// `/answer_<id>` with a parseable id.
    Answer(QuestionId),
    /// `/answer_<garbage>`.
    MalformedAnswer,
    Unknown(String),
}

/// Parses a leading slash command, ignoring a `@botname` suffix and arguments.
/// Returns `None` for ordinary text.
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.trim().split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    let command = match name {
        "start" => Command::Start,
        "cancel" => Command::Cancel,
        "moderator" => Command::Moderator,
        "stats" => Command::Stats,
        "answer" => Command::MalformedAnswer,
        other => match other.strip_prefix("answer_") {
            Some(id) => match id.parse::<QuestionId>() {
                Ok(id) if id > 0 => Command::Answer(id),
                _ => Command::MalformedAnswer,
            },
            None => Command::Unknown(other.to_string()),
        },
    };
    Some(command)
}

/// What to do with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    Register,
    Stats,
    Claim(QuestionId),
    MalformedClaim,
    UnknownCommand,
    /// Moderator answer sub-session.
    CancelAnswer(QuestionId),
    SubmitAnswer {
        question_id: QuestionId,
        text: String,
    },
    AnswerReminder(QuestionId),
    /// End-user flow.
    Cancel,
    ChooseFeedback,
    ChooseQuestion,
    ShowChoices,
    SubmitFeedback(String),
    FeedbackNeedsText,
    QuestionText(String),
    QuestionPhotos {
        photos: Vec<Attachment>,
        caption: Option<String>,
    },
    QuestionNeedsText,
}

fn is_cancel_word(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(BUTTON_CANCEL)
}

/// Decides how a message is handled. Touches nothing.
///
/// An open answer marker wins over everything else in the conversation.
pub fn classify(conversation: &Conversation, content: &MessageContent) -> Route {
    let text = match content {
        MessageContent::Text(t) => Some(t.as_str()),
        _ => None,
    };
    let command = text.and_then(parse_command);

    if let Some(question_id) = conversation.answering {
        return match (&command, text) {
            (Some(Command::Cancel), _) => Route::CancelAnswer(question_id),
            (None, Some(t)) if !t.trim().is_empty() => Route::SubmitAnswer {
                question_id,
                text: t.to_string(),
            },
            _ => Route::AnswerReminder(question_id),
        };
    }

    if let Some(command) = command {
        return match command {
            Command::Start => Route::Start,
            Command::Cancel => Route::Cancel,
            Command::Moderator => Route::Register,
            Command::Stats => Route::Stats,
            Command::Answer(id) => Route::Claim(id),
            Command::MalformedAnswer => Route::MalformedClaim,
            Command::Unknown(_) => Route::UnknownCommand,
        };
    }

    match &conversation.state {
        UserState::AwaitingChoice => match text.map(str::to_lowercase) {
            Some(t) if t.contains("feedback") => Route::ChooseFeedback,
            Some(t) if t.contains("question") => Route::ChooseQuestion,
            _ => Route::ShowChoices,
        },
        UserState::AwaitingFeedback => match text {
            Some(t) if is_cancel_word(t) => Route::Cancel,
            Some(t) => Route::SubmitFeedback(t.to_string()),
            None => Route::FeedbackNeedsText,
        },
        UserState::AwaitingQuestion(_) => match content {
            MessageContent::Text(t) if is_cancel_word(t) => Route::Cancel,
            MessageContent::Text(t) => Route::QuestionText(t.clone()),
            MessageContent::Photos { photos, caption } => Route::QuestionPhotos {
                photos: photos.clone(),
                caption: caption.clone(),
            },
            MessageContent::Unsupported => Route::QuestionNeedsText,
        },
    }
}

/// Turns a channel error into a hint for the moderator.
pub fn delivery_hint(err: &HotlineError) -> &'static str {
    let mut text = err.to_string();
    if let HotlineError::Channel {
        source: Some(source),
        ..
    } = err
    {
        text.push(' ');
        text.push_str(&source.to_string());
    }
    let lower = text.to_lowercase();
    if lower.contains("chat not found") || lower.contains("bot was blocked") {
        "the user blocked the bot or the chat was not found"
    } else if lower.contains("forbidden") {
        "the bot has no rights to message this user"
    } else {
        "the chat platform refused the message"
    }
}

fn choice_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![
        BUTTON_FEEDBACK.to_string(),
        BUTTON_QUESTION.to_string(),
    ]])
}

fn cancel_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![BUTTON_CANCEL.to_string()]])
}

fn question_prompt(cap: usize) -> String {
    format!(
        "To help us answer faster, please describe the problem in detail:\n\n\
         Steps to reproduce: what were you doing and on which page or screen did it happen?\n\
         Device: phone or computer, model, browser or app version.\n\
         The problem: what happened, which error did you see, what did you expect?\n\n\
         You can attach up to {cap} screenshots.\n\n\
         Write the description, or send a photo with a caption:"
    )
}

/// Executes routes for one channel.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    sessions: Arc<dyn SessionStore>,
    lock: QuestionLock,
    directory: ModeratorDirectory,
    notifier: Notifier,
    intake: Intake,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        sessions: Arc<dyn SessionStore>,
        directory: ModeratorDirectory,
        max_photos: usize,
    ) -> Self {
        let notifier = Notifier::new(channel.clone());
        let intake = Intake::new(store.clone(), directory.clone(), notifier.clone(), max_photos);
        Self {
            lock: QuestionLock::new(store.clone()),
            store,
            channel,
            sessions,
            directory,
            notifier,
            intake,
        }
    }

    /// The intake used for chat questions, shared with the web gateway.
    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    pub fn lock(&self) -> &QuestionLock {
        &self.lock
    }

    /// Handles one message. Never fails: errors are logged and the sender
    /// gets a generic reply.
    pub async fn handle(&self, msg: InboundMessage) {
        let key = SessionKey::new(msg.channel.clone(), msg.chat_id);
        let mut conversation = self.sessions.acquire(&key).await;

        if let Err(e) = self.dispatch(&msg, &mut conversation).await {
            error!(
                chat_id = msg.chat_id,
                user_id = msg.sender.user_id,
                error = %e,
                "failed to handle message"
            );
            if let Err(e) = self.say(msg.chat_id, GENERIC_FAILURE).await {
                warn!(chat_id = msg.chat_id, error = %e, "failed to send failure notice");
            }
        }
    }

    async fn dispatch(
        &self,
        msg: &InboundMessage,
        conversation: &mut Conversation,
    ) -> Result<(), HotlineError> {
        self.store.upsert_user(&msg.sender).await?;

        let route = classify(conversation, &msg.content);
        debug!(chat_id = msg.chat_id, ?route, "dispatching");
        let chat_id = msg.chat_id;

        match route {
            Route::Start => {
                conversation.reset();
                self.reply(chat_id, WELCOME, choice_keyboard()).await
            }
            Route::Register => self.register(chat_id, &msg.sender).await,
            Route::Stats => self.stats(chat_id, msg.sender.user_id).await,
            Route::Claim(id) => self.claim(chat_id, &msg.sender, id, conversation).await,
            Route::MalformedClaim => self.say(chat_id, BAD_CLAIM).await,
            Route::UnknownCommand => {
                conversation.reset();
                self.reply(chat_id, UNKNOWN_COMMAND, choice_keyboard()).await
            }
            Route::CancelAnswer(id) => {
                conversation.answering = None;
                let released = self.lock.release_held(id, msg.sender.user_id).await?;
                if !released {
                    info!(question_id = id, "cancelled answer for a question no longer held");
                }
                self.reply(chat_id, ANSWER_CANCELLED, Keyboard::Remove).await
            }
            Route::SubmitAnswer { question_id, text } => {
                self.answer(chat_id, msg.sender.user_id, question_id, &text, conversation)
                    .await
            }
            Route::AnswerReminder(id) => {
                self.say(
                    chat_id,
                    &format!(
                        "You are answering question {}. Send the answer as text, or /cancel.",
                        question_tag(id)
                    ),
                )
                .await
            }
            Route::Cancel => {
                conversation.reset();
                self.reply(chat_id, CANCELLED, choice_keyboard()).await
            }
            Route::ChooseFeedback => {
                conversation.state = UserState::AwaitingFeedback;
                self.reply(chat_id, FEEDBACK_PROMPT, cancel_keyboard()).await
            }
            Route::ChooseQuestion => {
                conversation.state = UserState::AwaitingQuestion(QuestionDraft::default());
                let prompt = question_prompt(self.intake.max_photos());
                self.reply(chat_id, &prompt, cancel_keyboard()).await
            }
            Route::ShowChoices => self.reply(chat_id, CHOOSE_OPTION, choice_keyboard()).await,
            Route::SubmitFeedback(text) => {
                let id = self.store.add_feedback(msg.sender.user_id, &text).await?;
                info!(feedback_id = id, user_id = msg.sender.user_id, "feedback stored");
                conversation.reset();
                self.reply(chat_id, FEEDBACK_THANKS, choice_keyboard()).await
            }
            Route::FeedbackNeedsText => self.reply(chat_id, FEEDBACK_NEEDS_TEXT, cancel_keyboard()).await,
            Route::QuestionText(text) => {
                self.submit_question(chat_id, msg.sender.user_id, text, Vec::new(), conversation)
                    .await
            }
            Route::QuestionPhotos {
                photos,
                caption: Some(caption),
            } => {
                self.submit_question(chat_id, msg.sender.user_id, caption, photos, conversation)
                    .await
            }
            Route::QuestionPhotos {
                photos,
                caption: None,
            } => self.collect_photos(chat_id, photos, conversation).await,
            Route::QuestionNeedsText => self.say(chat_id, QUESTION_NEEDS_TEXT).await,
        }
    }

    async fn register(&self, chat_id: i64, sender: &UserProfile) -> Result<(), HotlineError> {
        match self.directory.register(sender).await? {
            Registration::Registered => {
                self.say(
                    chat_id,
                    "You are registered as a moderator. New questions will be sent to this chat.",
                )
                .await
            }
            Registration::NotAllowed => self.say(chat_id, NO_PERMISSION).await,
        }
    }

    async fn stats(&self, chat_id: i64, user_id: i64) -> Result<(), HotlineError> {
        if !self.directory.is_active(user_id).await? {
            return self.say(chat_id, NO_PERMISSION).await;
        }
        let c = self.store.question_counts().await?;
        let report = format!(
            "Questions: {}\n- new: {}\n- in progress: {}\n- answered: {}\n- undelivered: {}\n- closed: {}\nFeedback: {}",
            c.total_questions(),
            c.new,
            c.in_progress,
            c.answered,
            c.error,
            c.closed,
            c.feedback
        );
        self.say(chat_id, &report).await
    }

    async fn claim(
        &self,
        chat_id: i64,
        sender: &UserProfile,
        question_id: QuestionId,
        conversation: &mut Conversation,
    ) -> Result<(), HotlineError> {
        let moderator_id = sender.user_id;
        if !self.directory.is_active(moderator_id).await? {
            return self.say(chat_id, NO_PERMISSION).await;
        }

        let tag = question_tag(question_id);
        match self.lock.claim(question_id, moderator_id).await? {
            ClaimOutcome::Acquired => {}
            ClaimOutcome::HeldByOther(_) => {
                return self
                    .say(
                        chat_id,
                        &format!("Question {tag} is already taken by another moderator."),
                    )
                    .await;
            }
            ClaimOutcome::Unavailable => {
                return self
                    .say(chat_id, &format!("Question {tag} is already answered or not found."))
                    .await;
            }
        }

        let Some(question) = self.store.get_question(question_id).await? else {
            self.lock.release(question_id).await?;
            return self.say(chat_id, "Question not found.").await;
        };
        conversation.reset();
        conversation.answering = Some(question_id);

        let moderators = self.directory.active().await?;
        self.notifier
            .broadcast(&moderators, &Notice::claimed(question_id, &sender.display_name()))
            .await;

        let photos = self.store.list_photos(question_id).await?;
        let from = match question.origin {
            QuestionOrigin::Chat => question.submitter_name(),
            QuestionOrigin::Web => format!("{} (website)", question.submitter_name()),
        };
        let brief = Notice {
            text: format!(
                "Question {tag}\nFrom: {from}\n\n{}\n\nSend your answer as a message, or /cancel to release the question.",
                question.text
            ),
            photos,
        };
        self.notifier.deliver(chat_id, &brief).await
    }

    async fn answer(
        &self,
        chat_id: i64,
        moderator_id: i64,
        question_id: QuestionId,
        text: &str,
        conversation: &mut Conversation,
    ) -> Result<(), HotlineError> {
        let tag = question_tag(question_id);
        conversation.answering = None;

        if self.lock.current_holder(question_id).await? != Some(moderator_id) {
            return self
                .say(
                    chat_id,
                    &format!(
                        "Question {tag} is no longer assigned to you. The answer was not sent."
                    ),
                )
                .await;
        }

        let Some(question) = self.store.get_question(question_id).await? else {
            self.lock.release(question_id).await?;
            return self.say(chat_id, "Question not found in the database.").await;
        };

        let answer_id = self.store.add_answer(question_id, moderator_id, text).await?;

        let (delivery, mut report) = match (question.origin, question.user_id) {
            (QuestionOrigin::Chat, Some(user_id)) => {
                let body = format!(
                    "Answer to your question {tag}:\n\n{text}\n\nIf you have more questions, just ask them through the bot."
                );
                match self
                    .channel
                    .send(OutboundMessage::text(user_id, body).with_keyboard(choice_keyboard()))
                    .await
                {
                    Ok(_) => (
                        AnswerDelivery::Delivered,
                        format!("Answer #A{answer_id} delivered to the user."),
                    ),
                    Err(e) => {
                        warn!(question_id, user_id, error = %e, "answer delivery failed");
                        (
                            AnswerDelivery::Failed,
                            format!(
                                "Answer #A{answer_id} was saved but not delivered: {}. Question {tag} is marked as undelivered.",
                                delivery_hint(&e)
                            ),
                        )
                    }
                }
            }
            _ => (
                AnswerDelivery::Failed,
                format!(
                    "Answer #A{answer_id} saved. Question {tag} came from the website ({}) and has no chat to deliver to; it is marked as undelivered.",
                    question.submitter_name()
                ),
            ),
        };

        let outcome = match delivery {
            AnswerDelivery::Delivered => "delivered",
            AnswerDelivery::Failed => "undelivered",
        };
        metrics::counter!("hotline_answers_total", "outcome" => outcome).increment(1);
        info!(question_id, moderator_id, answer_id, outcome, "answer recorded");

        // The answer has already gone out; a status failure must not hide that.
        match self.lock.finalize(question_id, moderator_id, delivery).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(question_id, moderator_id, "question changed hands before finalize");
            }
            Err(e) => {
                error!(
                    question_id,
                    moderator_id,
                    answer_id,
                    error = %e,
                    "could not finalize question"
                );
                report.push_str(&format!(
                    "\n\nThe status of question {tag} could not be updated. Do not answer it again; the user already has answer #A{answer_id}."
                ));
            }
        }

        self.reply(chat_id, &report, Keyboard::Remove).await
    }

    async fn submit_question(
        &self,
        chat_id: i64,
        user_id: i64,
        text: String,
        photos: Vec<Attachment>,
        conversation: &mut Conversation,
    ) -> Result<(), HotlineError> {
        let UserState::AwaitingQuestion(draft) = &mut conversation.state else {
            return self.say(chat_id, QUESTION_NEEDS_TEXT).await;
        };
        // Photos sent with an empty caption are kept for the next attempt.
        draft.add_photos(photos, self.intake.max_photos());
        if text.trim().is_empty() {
            return self.say(chat_id, EMPTY_QUESTION).await;
        }
        let photos = draft.photos.clone();

        let submission = self
            .intake
            .submit(NewQuestion::from_chat(user_id, text), photos)
            .await?;
        conversation.reset();

        let with_photos = match submission.photos {
            0 => String::new(),
            1 => " with 1 photo".to_string(),
            n => format!(" with {n} photos"),
        };
        let confirmation = format!(
            "Question {}{with_photos} sent!\n\n\
             We received your request and are already working on it.\n\
             The answer will arrive in this chat. We usually reply within 24 hours.",
            question_tag(submission.question_id)
        );
        self.reply(chat_id, &confirmation, choice_keyboard()).await
    }

    async fn collect_photos(
        &self,
        chat_id: i64,
        photos: Vec<Attachment>,
        conversation: &mut Conversation,
    ) -> Result<(), HotlineError> {
        let cap = self.intake.max_photos();
        let UserState::AwaitingQuestion(draft) = &mut conversation.state else {
            return self.say(chat_id, QUESTION_NEEDS_TEXT).await;
        };
        draft.add_photos(photos, cap);

        let text = if draft.is_full(cap) {
            format!(
                "Reached the limit of {cap} photos.\n\nNow describe the problem in text: steps to reproduce, device and the error."
            )
        } else {
            format!(
                "Photo added! Photo slots left: {}\n\nNow describe the problem in text, or send more photos.",
                cap - draft.photos.len()
            )
        };
        self.say(chat_id, &text).await
    }

    async fn say(&self, chat_id: i64, text: &str) -> Result<(), HotlineError> {
        self.channel
            .send(OutboundMessage::text(chat_id, text))
            .await
            .map(|_| ())
    }

    async fn reply(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<(), HotlineError> {
        self.channel
            .send(OutboundMessage::text(chat_id, text).with_keyboard(keyboard))
            .await
            .map(|_| ())
    }
}
