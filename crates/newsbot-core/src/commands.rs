//! Command router: maps inbound chat commands to typed handlers and replies.
//!
//! Every handler returns `Result<Vec<Reply>>`; the router turns any error into the generic
//! "try again later" reply, so nothing escapes past a command.

use std::sync::Arc;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ReplyKeyboard, TextMessage},
    },
    news::{normalize_category, CATEGORIES},
    preferences::{PageSize, Preferences, MAX_PAGE_SIZE, MIN_PAGE_SIZE},
    store::PreferenceKind,
    subscription::{SubscribeOutcome, Subscriber, Subscriptions, UnsubscribeOutcome},
    Result,
};

pub const GENERIC_ERROR: &str = "Something went wrong, please try again later...";
pub const NOT_UNDERSTOOD: &str =
    "I don't understand you, please use /help to get a list of available commands";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Subscribe,
    Unsubscribe,
    AddCategory,
    RemoveCategory,
    AddSource,
    RemoveSource,
    SetSourceLimit,
    SetCategoryLimit,
    Settings,
}

struct CommandSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    command: Command,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "subscribe",
        aliases: &[],
        description: "Subscribe to receive news updates",
        command: Command::Subscribe,
    },
    CommandSpec {
        name: "unsubscribe",
        aliases: &[],
        description: "Unsubscribe from receiving news updates",
        command: Command::Unsubscribe,
    },
    CommandSpec {
        name: "addcategory",
        aliases: &["ac"],
        description: "Add a news category",
        command: Command::AddCategory,
    },
    CommandSpec {
        name: "removecategory",
        aliases: &["rc"],
        description: "Remove a news category",
        command: Command::RemoveCategory,
    },
    CommandSpec {
        name: "addsource",
        aliases: &["as"],
        description: "Add a news source by id",
        command: Command::AddSource,
    },
    CommandSpec {
        name: "removesource",
        aliases: &["rs"],
        description: "Remove a news source",
        command: Command::RemoveSource,
    },
    CommandSpec {
        name: "setsourcelimit",
        aliases: &[],
        description: "Set how many source articles to receive (1-20)",
        command: Command::SetSourceLimit,
    },
    CommandSpec {
        name: "setcategorylimit",
        aliases: &[],
        description: "Set how many articles per category to receive (1-20)",
        command: Command::SetCategoryLimit,
    },
    CommandSpec {
        name: "settings",
        aliases: &[],
        description: "Show your current preferences",
        command: Command::Settings,
    },
    CommandSpec {
        name: "help",
        aliases: &["start"],
        description: "List available commands",
        command: Command::Help,
    },
];

impl Command {
    /// Resolve a lowercase command name or alias.
    pub fn lookup(name: &str) -> Option<Command> {
        COMMANDS
            .iter()
            .find(|spec| spec.name == name || spec.aliases.contains(&name))
            .map(|spec| match spec.command {
                Command::Help if name == "start" => Command::Start,
                other => other,
            })
    }
}

/// `(name, description)` of every primary command, for the transport's command menu.
pub fn menu() -> Vec<(&'static str, &'static str)> {
    COMMANDS
        .iter()
        .map(|spec| (spec.name, spec.description))
        .collect()
}

/// A `/cmd@botname arg1 arg2` message split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name without the slash.
    pub name: String,
    /// The `@botname` suffix, if any.
    pub mention: Option<String>,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// True unless the command names a different bot. Unknown own username accepts everything.
    pub fn is_addressed_to(&self, bot_username: Option<&str>) -> bool {
        match (self.mention.as_deref(), bot_username) {
            (Some(mention), Some(me)) => mention.eq_ignore_ascii_case(me.trim_start_matches('@')),
            _ => true,
        }
    }
}

/// `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention.to_string())),
        None => (head, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name: name.to_lowercase(),
        mention,
        args: parts.map(str::to_string).collect(),
    })
}

/// One outbound reply, optionally carrying a choice keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Identity of the sender plus the parsed argument tokens.
struct Invocation<'a> {
    msg: &'a TextMessage,
    args: &'a [String],
}

impl Invocation<'_> {
    fn user_id(&self) -> UserId {
        self.msg.user_id
    }

    fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Clone)]
pub struct CommandRouter {
    subscriptions: Subscriptions,
    preferences: Preferences,
    messenger: Arc<dyn MessagingPort>,
    bot_username: Option<String>,
}

impl CommandRouter {
    pub fn new(
        subscriptions: Subscriptions,
        preferences: Preferences,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            subscriptions,
            preferences,
            messenger,
            bot_username: None,
        }
    }

    /// Ignore `/cmd@other_bot` commands meant for other bots in group chats.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Handle one inbound message and send the replies.
    pub async fn dispatch(&self, msg: &TextMessage) {
        for reply in self.handle(msg).await {
            self.send(msg.chat_id, reply).await;
        }
    }

    /// Compute the replies for one inbound message. Never fails.
    pub async fn handle(&self, msg: &TextMessage) -> Vec<Reply> {
        let Some(parsed) = parse_command(&msg.text) else {
            return vec![Reply::text(NOT_UNDERSTOOD)];
        };
        if !parsed.is_addressed_to(self.bot_username.as_deref()) {
            tracing::debug!(
                chat_id = msg.chat_id.0,
                mention = ?parsed.mention,
                "command for another bot"
            );
            return Vec::new();
        }
        let ParsedCommand { name, args, .. } = parsed;
        let Some(command) = Command::lookup(&name) else {
            tracing::info!(user_id = msg.user_id.0, command = %name, "unknown command");
            return vec![Reply::text(NOT_UNDERSTOOD)];
        };

        tracing::info!(
            user_id = msg.user_id.0,
            username = msg.username.as_deref().unwrap_or("unknown"),
            command = %name,
            "command received"
        );

        let inv = Invocation { msg, args: &args };
        match self.run(command, &inv).await {
            Ok(replies) => replies,
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(user_id = msg.user_id.0, command = %name, "command failed: {e}");
                } else {
                    tracing::error!(
                        user_id = msg.user_id.0,
                        command = %name,
                        "command failed: {e}"
                    );
                }
                vec![Reply::text(GENERIC_ERROR)]
            }
        }
    }

    async fn run(&self, command: Command, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        match command {
            Command::Start | Command::Help => Ok(vec![Reply::text(help_text())]),
            Command::Subscribe => self.subscribe(inv).await,
            Command::Unsubscribe => self.unsubscribe(inv).await,
            Command::AddCategory => self.add_category(inv).await,
            Command::RemoveCategory => self.remove_item(PreferenceKind::Category, inv).await,
            Command::AddSource => self.add_source(inv).await,
            Command::RemoveSource => self.remove_item(PreferenceKind::Source, inv).await,
            Command::SetSourceLimit => self.set_limit(PreferenceKind::Source, inv).await,
            Command::SetCategoryLimit => self.set_limit(PreferenceKind::Category, inv).await,
            Command::Settings => self.settings(inv).await,
        }
    }

    async fn subscribe(&self, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let subscriber = Subscriber {
            user_id: inv.msg.user_id,
            chat_id: inv.msg.chat_id,
            username: inv.msg.username.clone(),
        };
        let text = match self.subscriptions.subscribe(&subscriber).await? {
            SubscribeOutcome::Subscribed => {
                "You have been subscribed successfully, to unsubscribe use /unsubscribe command"
            }
            SubscribeOutcome::Resubscribed => {
                "Welcome back! Your subscription has been resumed, to unsubscribe use /unsubscribe command"
            }
            SubscribeOutcome::AlreadySubscribed => {
                "You are already subscribed, to unsubscribe use /unsubscribe command"
            }
        };
        Ok(vec![Reply::text(text)])
    }

    async fn unsubscribe(&self, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let text = match self.subscriptions.unsubscribe(inv.user_id()).await? {
            UnsubscribeOutcome::Unsubscribed => {
                "You have been unsubscribed successfully, to resubscribe use /subscribe command"
            }
            UnsubscribeOutcome::AlreadyUnsubscribed => {
                "You are already unsubscribed from receiving updates, to resubscribe use /subscribe command"
            }
            UnsubscribeOutcome::NotFound => {
                "You are not subscribed yet, use /subscribe to start receiving news"
            }
        };
        Ok(vec![Reply::text(text)])
    }

    async fn add_category(&self, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let current = self
            .preferences
            .get(PreferenceKind::Category, inv.user_id())
            .await?;
        let remaining: Vec<String> = CATEGORIES
            .iter()
            .filter(|c| !current.contains(c))
            .map(|c| c.to_string())
            .collect();

        if remaining.is_empty() {
            return Ok(vec![Reply::text(
                "You already selected all categories available, use /removecategory to remove a category",
            )]);
        }

        let Some(category) = inv.first_arg().and_then(normalize_category) else {
            return Ok(vec![
                Reply::with_keyboard(
                    format!("Pick a category:\n{}", remaining.join(", ")),
                    ReplyKeyboard::one_per_row("/ac ", &remaining),
                ),
                Reply::text("Usage: /addcategory <category>"),
            ]);
        };

        self.add_item(PreferenceKind::Category, inv.user_id(), &category)
            .await
    }

    async fn add_source(&self, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let Some(source) = inv.first_arg().and_then(normalize_source) else {
            return Ok(vec![Reply::text("Usage: /addsource <source-id>")]);
        };
        self.add_item(PreferenceKind::Source, inv.user_id(), &source)
            .await
    }

    async fn add_item(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        item: &str,
    ) -> Result<Vec<Reply>> {
        let noun = kind.noun();
        let text = if self.preferences.add(kind, user_id, item).await? {
            format!("{noun} {item} has been added successfully")
        } else {
            format!("{noun} {item} already exists")
        };
        Ok(vec![Reply::text(text)])
    }

    async fn remove_item(&self, kind: PreferenceKind, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let (plural, add_cmd, short) = match kind {
            PreferenceKind::Category => ("categories", "/addcategory", "/rc "),
            PreferenceKind::Source => ("sources", "/addsource", "/rs "),
        };
        let noun = kind.noun();
        let current = self.preferences.get(kind, inv.user_id()).await?;

        if current.items.is_empty() {
            return Ok(vec![Reply::text(format!(
                "You have no {plural} to remove, use {add_cmd} to add a {}",
                noun.to_lowercase()
            ))]);
        }

        let Some(raw) = inv.first_arg() else {
            return Ok(vec![Reply::with_keyboard(
                format!(
                    "Pick a {} to remove:\n{}",
                    noun.to_lowercase(),
                    current.items.join(", ")
                ),
                ReplyKeyboard::one_per_row(short, &current.items),
            )]);
        };

        let item = raw.trim().to_lowercase();
        let text = if self.preferences.remove(kind, inv.user_id(), &item).await? {
            format!("{noun} {item} has been removed successfully")
        } else {
            format!("{noun} {item} does not exist")
        };
        Ok(vec![Reply::text(text)])
    }

    async fn set_limit(&self, kind: PreferenceKind, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let usage = match kind {
            PreferenceKind::Category => "Usage: /setcategorylimit <1-20>",
            PreferenceKind::Source => "Usage: /setsourcelimit <1-20>",
        };
        // Validation happens before the store is touched.
        let limit = match inv.first_arg().map(PageSize::parse) {
            Some(Ok(limit)) => limit,
            Some(Err(Error::Validation(reason))) => {
                tracing::debug!(user_id = inv.user_id().0, %reason, "invalid limit");
                return Ok(vec![Reply::text(usage)]);
            }
            Some(Err(e)) => return Err(e),
            None => return Ok(vec![Reply::text(usage)]),
        };

        self.preferences
            .set_page_size(kind, inv.user_id(), limit)
            .await?;
        Ok(vec![Reply::text(format!(
            "Limit has been set to {} articles per delivery successfully",
            limit.get()
        ))])
    }

    async fn settings(&self, inv: &Invocation<'_>) -> Result<Vec<Reply>> {
        let user_id = inv.user_id();
        let active = self.subscriptions.is_active(user_id).await?;
        let categories = self
            .preferences
            .get(PreferenceKind::Category, user_id)
            .await?;
        let sources = self.preferences.get(PreferenceKind::Source, user_id).await?;

        let list = |items: &[String]| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(", ")
            }
        };
        let text = format!(
            "Subscription: {}\nCategories: {}\nCategory limit: {}\nSources: {}\nSource limit: {}",
            if active { "active" } else { "inactive" },
            list(&categories.items),
            categories.page_size,
            list(&sources.items),
            sources.page_size,
        );
        Ok(vec![Reply::text(text)])
    }

    async fn send(&self, chat_id: ChatId, reply: Reply) {
        let res = match reply.keyboard {
            Some(kb) if self.messenger.capabilities().supports_reply_keyboards => {
                self.messenger.send_keyboard(chat_id, &reply.text, kb).await
            }
            _ => self.messenger.send_text(chat_id, &reply.text).await,
        };
        if let Err(e) = res {
            tracing::warn!(chat_id = chat_id.0, "failed to send reply: {e}");
        }
    }
}

fn help_text() -> String {
    let mut out = String::from("Available commands:\n");
    for (name, description) in menu() {
        out.push_str(&format!("/{name} - {description}\n"));
    }
    out.push_str(&format!(
        "\nCategories: {}\nLimits accept values from {MIN_PAGE_SIZE} to {MAX_PAGE_SIZE}.",
        CATEGORIES.join(", ")
    ));
    out
}

/// Provider source ids are lowercase `[a-z0-9-_.]+`.
fn normalize_source(raw: &str) -> Option<String> {
    let s = raw.trim().to_lowercase();
    let valid = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    valid.then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ScriptedProvider};

    fn router(h: &Harness) -> CommandRouter {
        CommandRouter::new(
            h.subscriptions.clone(),
            h.preferences.clone(),
            h.messenger.clone(),
        )
    }

    fn msg(text: &str) -> TextMessage {
        TextMessage {
            chat_id: ChatId(500),
            user_id: UserId(5),
            username: Some("bob".to_string()),
            text: text.to_string(),
        }
    }

    async fn texts(r: &CommandRouter, text: &str) -> Vec<String> {
        r.handle(&msg(text)).await.into_iter().map(|r| r.text).collect()
    }

    #[test]
    fn parses_names_aliases_and_bot_suffix() {
        assert_eq!(
            parse_command("/AC@news_bot sports extra"),
            Some(ParsedCommand {
                name: "ac".to_string(),
                mention: Some("news_bot".to_string()),
                args: vec!["sports".to_string(), "extra".to_string()],
            })
        );
        assert_eq!(parse_command("  /help ").map(|p| p.mention), Some(None));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(Command::lookup("ac"), Some(Command::AddCategory));
        assert_eq!(Command::lookup("rs"), Some(Command::RemoveSource));
        assert_eq!(Command::lookup("start"), Some(Command::Start));
        assert_eq!(Command::lookup("help"), Some(Command::Help));
        assert_eq!(Command::lookup("nope"), None);
    }

    #[test]
    fn menu_lists_primary_names_only() {
        let names: Vec<&str> = menu().into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"addcategory"));
        assert!(!names.contains(&"ac"));
        assert!(!names.contains(&"start"));
    }

    #[test]
    fn source_ids_are_validated() {
        assert_eq!(normalize_source("BBC-News").as_deref(), Some("bbc-news"));
        assert_eq!(normalize_source("abc.de_f").as_deref(), Some("abc.de_f"));
        assert_eq!(normalize_source("bad id!"), None);
        assert_eq!(normalize_source(""), None);
    }

    #[tokio::test]
    async fn non_command_and_unknown_command_are_not_understood() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert_eq!(texts(&r, "hi there").await, vec![NOT_UNDERSTOOD]);
        assert_eq!(texts(&r, "/frobnicate").await, vec![NOT_UNDERSTOOD]);
    }

    #[tokio::test]
    async fn subscribe_lifecycle_replies() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert!(texts(&r, "/subscribe").await[0].starts_with("You have been subscribed"));
        assert!(texts(&r, "/subscribe").await[0].starts_with("You are already subscribed"));
        assert!(texts(&r, "/unsubscribe").await[0].starts_with("You have been unsubscribed"));
        assert!(texts(&r, "/unsubscribe").await[0].starts_with("You are already unsubscribed"));
        assert!(texts(&r, "/subscribe").await[0].starts_with("Welcome back"));
    }

    #[tokio::test]
    async fn commands_for_other_bots_are_ignored() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h).with_bot_username("news_bot");

        assert!(r.handle(&msg("/subscribe@other_bot")).await.is_empty());
        assert!(!h.subscriptions.is_active(UserId(5)).await.unwrap());

        let replies = texts(&r, "/subscribe@News_Bot").await;
        assert!(replies[0].starts_with("You have been subscribed"));
        assert!(h.subscriptions.is_active(UserId(5)).await.unwrap());
    }

    #[tokio::test]
    async fn add_category_without_argument_offers_remaining_ones() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        texts(&r, "/ac sports").await;

        let replies = r.handle(&msg("/addcategory")).await;
        assert_eq!(replies.len(), 2);
        let kb = replies[0].keyboard.as_ref().unwrap();
        assert_eq!(kb.rows.len(), CATEGORIES.len() - 1);
        assert!(!kb.rows.iter().any(|row| row[0] == "/ac sports"));
        assert!(kb.rows.iter().any(|row| row[0] == "/ac technology"));
        assert_eq!(replies[1].text, "Usage: /addcategory <category>");
    }

    #[tokio::test]
    async fn add_category_is_idempotent() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert_eq!(
            texts(&r, "/ac Sports").await,
            vec!["Category sports has been added successfully"]
        );
        assert_eq!(texts(&r, "/ac sports").await, vec!["Category sports already exists"]);

        let rec = h
            .preferences
            .get(PreferenceKind::Category, UserId(5))
            .await
            .unwrap();
        assert_eq!(rec.items, vec!["sports"]);
    }

    #[tokio::test]
    async fn unknown_category_gets_the_menu() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        let replies = r.handle(&msg("/ac weather")).await;
        assert!(replies[0].text.starts_with("Pick a category:"));
        assert!(replies[0].keyboard.is_some());
    }

    #[tokio::test]
    async fn all_categories_selected() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        for c in CATEGORIES {
            texts(&r, &format!("/ac {c}")).await;
        }
        assert!(texts(&r, "/ac")
            .await[0]
            .starts_with("You already selected all categories"));
    }

    #[tokio::test]
    async fn remove_category_flow() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert_eq!(
            texts(&r, "/rc").await,
            vec!["You have no categories to remove, use /addcategory to add a category"]
        );

        texts(&r, "/ac sports").await;
        let replies = r.handle(&msg("/removecategory")).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0].keyboard.as_ref().unwrap().rows,
            vec![vec!["/rc sports".to_string()]]
        );

        assert_eq!(
            texts(&r, "/rc sports").await,
            vec!["Category sports has been removed successfully"]
        );
        let rec = h
            .preferences
            .get(PreferenceKind::Category, UserId(5))
            .await
            .unwrap();
        assert!(rec.items.is_empty());

        texts(&r, "/ac health").await;
        assert_eq!(
            texts(&r, "/rc sports").await,
            vec!["Category sports does not exist"]
        );
    }

    #[tokio::test]
    async fn source_commands() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert_eq!(texts(&r, "/as").await, vec!["Usage: /addsource <source-id>"]);
        assert_eq!(
            texts(&r, "/as bbc-news").await,
            vec!["Source bbc-news has been added successfully"]
        );
        assert_eq!(
            texts(&r, "/addsource bbc-news").await,
            vec!["Source bbc-news already exists"]
        );
        assert_eq!(
            texts(&r, "/rs bbc-news").await,
            vec!["Source bbc-news has been removed successfully"]
        );
        assert_eq!(
            texts(&r, "/removesource").await,
            vec!["You have no sources to remove, use /addsource to add a source"]
        );
    }

    #[tokio::test]
    async fn invalid_limit_never_reaches_the_store() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        for input in [
            "/setcategorylimit abc",
            "/setcategorylimit 0",
            "/setcategorylimit 21",
            "/setcategorylimit",
        ] {
            assert_eq!(texts(&r, input).await, vec!["Usage: /setcategorylimit <1-20>"]);
        }
        assert_eq!(
            texts(&r, "/setsourcelimit abc").await,
            vec!["Usage: /setsourcelimit <1-20>"]
        );
        assert_eq!(h.store.preference_calls(), 0);
    }

    #[tokio::test]
    async fn valid_limit_is_stored() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        assert_eq!(
            texts(&r, "/setsourcelimit 12").await,
            vec!["Limit has been set to 12 articles per delivery successfully"]
        );
        let rec = h
            .preferences
            .get(PreferenceKind::Source, UserId(5))
            .await
            .unwrap();
        assert_eq!(rec.page_size, 12);
    }

    #[tokio::test]
    async fn store_failure_becomes_generic_reply() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        h.store.set_failing(true);
        for cmd in ["/subscribe", "/ac sports", "/setcategorylimit 3", "/settings"] {
            assert_eq!(texts(&r, cmd).await, vec![GENERIC_ERROR]);
        }
    }

    #[tokio::test]
    async fn settings_summarizes_preferences() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        texts(&r, "/subscribe").await;
        texts(&r, "/ac science").await;
        texts(&r, "/setcategorylimit 7").await;

        assert_eq!(
            texts(&r, "/settings").await,
            vec!["Subscription: active\nCategories: science\nCategory limit: 7\nSources: none\nSource limit: 5"]
        );
    }

    #[tokio::test]
    async fn help_and_start_share_the_listing() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        let help = texts(&r, "/help").await;
        assert_eq!(help, texts(&r, "/start").await);
        assert!(help[0].contains("/subscribe - "));
    }

    #[tokio::test]
    async fn dispatch_sends_keyboard_replies() {
        let h = Harness::new(ScriptedProvider::default());
        let r = router(&h);
        r.dispatch(&msg("/ac")).await;

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|s| s.chat_id == ChatId(500)));
        assert!(sent[0].keyboard.is_some());
        assert!(sent[1].keyboard.is_none());
    }
}
