//! # Fallback Responder
//!
//! Keyword-based canned replies used whenever the AI backend cannot answer:
//! the widget shows one after a total transport failure, and the bridge uses
//! one when its upstream is down.
//!
//! Matching is a case-insensitive substring test against an ordered rule
//! list. The first rule with a matching keyword wins. When nothing matches, a
//! reply is drawn uniformly from a small pool of templates; `{message}` in a
//! template is replaced by the visitor's message.
//!
//! ```rust
//! use shared::responder::respond;
//!
//! assert_eq!(respond("HELLO"), respond("hello"));
//! ```

use rand::seq::IndexedRandom;
use rand::Rng;
use std::sync::OnceLock;

/// Placeholder replaced by the user's message in default templates.
const MESSAGE_PLACEHOLDER: &str = "{message}";

/// A keyword set and the reply it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Lowercase keywords; any one of them matching selects this rule
    pub keywords: Vec<String>,
    pub reply: String,
}

impl Rule {
    pub fn new(keywords: &[&str], reply: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.to_string(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered keyword rules plus the default template pool.
#[derive(Debug, Clone)]
pub struct FallbackResponder {
    rules: Vec<Rule>,
    defaults: Vec<String>,
}

/// Built-in rules, checked in order.
///
/// Contact and agentic come before the generic AI rule on purpose: "email"
/// contains "ai", and "agentic ai" should get the specific reply.
impl Default for FallbackResponder {
    fn default() -> Self {
        let rules = vec![
            Rule::new(
                &["hello", "hi", "hey"],
                "Hello! I'm your AI assistant. How can I help you today? 🚀",
            ),
            Rule::new(
                &["how are you"],
                "I'm doing great, thanks for asking! I'm here to help with any questions you might have. 😊",
            ),
            Rule::new(
                &["help", "support"],
                "I'm here to help! I can answer questions about projects, share information, or just chat. What would you like to know? 🤖",
            ),
            Rule::new(
                &["portfolio", "project"],
                "There are plenty of projects to explore, from AI applications to web development. Which area interests you? 💼",
            ),
            Rule::new(
                &["contact", "email", "reach"],
                "You can get in touch through the contact section or LinkedIn. Messages are always welcome! 📧",
            ),
            Rule::new(
                &["agentic", "autonomous"],
                "I'm backed by an autonomous AI system that can plan tasks and learn from our conversation. 🧠",
            ),
            Rule::new(
                &["ai", "artificial intelligence"],
                "AI is fascinating! I'm an AI assistant myself, and there is work here on chatbots, machine learning models and automation tools. 🤖",
            ),
            Rule::new(
                &["experience", "work"],
                "There's experience across project management, business development and AI implementation. What would you like to know? 💪",
            ),
            Rule::new(
                &["thank"],
                "You're welcome! Is there anything else you'd like to know? 😊",
            ),
            Rule::new(
                &["bye", "goodbye"],
                "Goodbye! It was nice chatting with you. Come back anytime! 👋",
            ),
        ];

        let defaults = [
            "That's an interesting question about \"{message}\"! What would you like to explore? 🎯",
            "I'd be happy to help with that! Could you tell me more? 📝",
            "That's a great point! I'm here to help with any information you need. 🚀",
            "I understand what you're asking. Let me see what I can share! 💡",
            "Thanks for sharing that! I'm here to answer your questions. 🤖",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        Self { rules, defaults }
    }
}

impl FallbackResponder {
    /// Build a responder from custom rules and default templates.
    pub fn new(rules: Vec<Rule>, defaults: Vec<String>) -> Self {
        Self { rules, defaults }
    }

    /// Reply to `message` using the thread-local RNG for the default pool.
    pub fn respond(&self, message: &str) -> String {
        self.respond_with(message, &mut rand::rng())
    }

    /// Reply to `message`, drawing from the default pool with `rng`.
    pub fn respond_with<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> String {
        if let Some(rule) = self.matching_rule(message) {
            return rule.reply.clone();
        }

        match self.defaults.choose(rng) {
            Some(template) => render(template, message),
            None => format!(
                "I heard \"{}\", but I don't have an answer right now.",
                message.trim()
            ),
        }
    }

    /// First rule matching `message`, if any.
    pub fn matching_rule(&self, message: &str) -> Option<&Rule> {
        let lowered = message.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Every reply the default pool can produce for `message`.
    pub fn default_replies(&self, message: &str) -> Vec<String> {
        self.defaults.iter().map(|t| render(t, message)).collect()
    }
}

fn render(template: &str, message: &str) -> String {
    template.replace(MESSAGE_PLACEHOLDER, message.trim())
}

/// Reply to `message` with the built-in rule set.
pub fn respond(message: &str) -> String {
    default_responder().respond(message)
}

/// Shared instance of the built-in rule set.
pub fn default_responder() -> &'static FallbackResponder {
    static RESPONDER: OnceLock<FallbackResponder> = OnceLock::new();
    RESPONDER.get_or_init(FallbackResponder::default)
}
