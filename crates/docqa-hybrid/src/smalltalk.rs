//! Canned replies for conversational queries that need no retrieval.

const GREETINGS: [&str; 7] = ["hi", "hello", "hey", "hola", "hi there", "good morning", "good evening"];
const HOW_ARE_YOU: [&str; 5] = ["how are you", "how r u", "how are u", "hows it going", "how\u{2019}s it going"];
const THANKS: [&str; 5] = ["thanks", "thank you", "thx", "ty", "much appreciated"];
const FAREWELLS: [&str; 6] = ["bye", "goodbye", "see ya", "see you", "later", "catch you later"];

/// Reply for small talk, checked as greeting, how-are-you, thanks, farewell.
pub(crate) fn reply(query: &str) -> Option<&'static str> {
    let q = query.trim().to_lowercase();
    if GREETINGS.iter().any(|g| is_prefix_phrase(&q, g)) {
        return Some("Hey! \u{1F44B} What would you like to explore?");
    }
    if HOW_ARE_YOU.iter().any(|p| q.contains(p)) {
        return Some("Doing well, curious as ever. What can I help you dig into?");
    }
    if THANKS.iter().any(|t| is_suffix_word(&q, t)) {
        return Some("You\u{2019}re welcome!");
    }
    if FAREWELLS.iter().any(|b| is_prefix_phrase(&q, b)) {
        return Some("Bye! If another question pops up, I\u{2019}m here.");
    }
    None
}

fn is_prefix_phrase(q: &str, phrase: &str) -> bool {
    q == phrase || q.strip_prefix(phrase).is_some_and(|rest| rest.starts_with(' '))
}

/// `phrase` ends `q` and is not the tail of a longer word.
fn is_suffix_word(q: &str, phrase: &str) -> bool {
    match q.strip_suffix(phrase) {
        Some(head) => head.chars().next_back().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}
