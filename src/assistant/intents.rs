/// A canned question/answer pair and the keywords that trigger it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentEntry {
    /// Label shown as a quick-reply suggestion.
    pub question: &'static str,
    pub answer: &'static str,
    /// Lower-case, non-empty; matched as substrings of the normalized utterance.
    pub keywords: &'static [&'static str],
}

pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that. Please try asking another question or choose from the suggestions below.";

// Order matters: the first entry with a matching keyword wins, so narrow
// order intents sit above the entry owning the broad "order" keyword.
static INTENTS: &[IntentEntry] = &[
    IntentEntry {
        question: "Can I cancel my order?",
        answer: "You can cancel an order while it is still Pending. Open Orders, pick the order and choose Cancel. Orders that are already being processed or shipped can no longer be cancelled.",
        keywords: &["cancel"],
    },
    IntentEntry {
        question: "How do I track my order?",
        answer: "Go to Orders and select your order to see its current status: Pending, Processing, Shipped or Delivered. Online payments also show whether the payment went through.",
        keywords: &["track", "status", "where is my"],
    },
    IntentEntry {
        question: "How do I place an order?",
        answer: "Browse the products, add what you need to your cart, then open the cart and tap Checkout. Enter your delivery address, pin your location, choose a payment method and confirm.",
        keywords: &["place an order", "how to order", "buy", "purchase", "checkout", "order"],
    },
    IntentEntry {
        question: "What payment methods do you accept?",
        answer: "We accept Cash on Delivery, GCash and credit/debit cards. For GCash and cards you will be redirected to the payment page after checkout.",
        keywords: &["payment", "pay", "gcash", "card", "cash on delivery"],
    },
    IntentEntry {
        question: "How long does delivery take?",
        answer: "Metro orders usually arrive within 2-3 business days and provincial orders within 5-7 business days. The shipping fee is shown at checkout.",
        keywords: &["ship", "deliver", "arrive", "how long"],
    },
    IntentEntry {
        question: "Can I return an item?",
        answer: "Items can be returned within 7 days of delivery if they are damaged or defective. Contact support with your order number and a photo of the item to start a return or refund.",
        keywords: &["return", "refund", "damaged", "defective", "broken"],
    },
    IntentEntry {
        question: "Where can I find DIY tutorials?",
        answer: "Open the Tutorials tab to browse step-by-step DIY projects. Each tutorial lists the materials you need, and you can search by project name.",
        keywords: &["tutorial", "diy", "how to make", "guide", "project", "idea"],
    },
    IntentEntry {
        question: "How do I manage my account?",
        answer: "Open Account to update your name, phone number, address and profile photo. To change your password, log out and use Forgot Password on the login screen.",
        keywords: &["account", "profile", "password", "sign up", "register", "login", "log in"],
    },
    IntentEntry {
        question: "How can I contact support?",
        answer: "You can reach our support team at support@diyshop.example or call (02) 8123-4567, Monday to Saturday, 9AM to 6PM.",
        keywords: &["contact", "support", "email", "phone", "call", "human", "agent"],
    },
];

/// The intent table in declared (precedence) order.
pub fn entries() -> &'static [IntentEntry] {
    INTENTS
}

/// Question labels offered as quick replies, in table order.
pub fn suggestions() -> impl Iterator<Item = &'static str> {
    INTENTS.iter().map(|e| e.question)
}

/// Maps an utterance to a canned answer.
///
/// Matching is case-insensitive substring containment, not whole words, and
/// the first entry in table order with any matching keyword wins. Anything
/// that matches nothing, including blank input, gets [`FALLBACK_REPLY`].
pub fn resolve(utterance: &str) -> &'static str {
    let normalized = utterance.trim().to_lowercase();
    if normalized.is_empty() {
        return FALLBACK_REPLY;
    }
    INTENTS
        .iter()
        .find(|entry| {
            entry
                .keywords
                .iter()
                .any(|kw| !kw.is_empty() && normalized.contains(kw))
        })
        .map_or(FALLBACK_REPLY, |entry| entry.answer)
}
