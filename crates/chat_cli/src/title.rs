//! Local title generation.

use chat_tree::{MessageTree, Role};
use history_manager::MAX_NAME_BYTES;

const MAX_TITLE_CHARS: usize = 40;
const FALLBACK_TITLE: &str = "New conversation";

/// Title from the first user message on the active path: its first line,
/// cut to a fixed number of characters and to what the history store accepts
/// as a name.
pub fn local_title(tree: &MessageTree) -> String {
    let first_user = tree
        .active_path()
        .into_iter()
        .filter_map(|index| tree.node(index).ok())
        .find(|node| node.role() == Role::User);

    let Some(line) = first_user
        .and_then(|node| node.content().lines().map(str::trim).find(|l| !l.is_empty()))
    else {
        return FALLBACK_TITLE.to_string();
    };

    if line.chars().count() <= MAX_TITLE_CHARS && line.len() <= MAX_NAME_BYTES {
        return line.to_string();
    }
    let budget = MAX_NAME_BYTES - '…'.len_utf8();
    let mut title = String::new();
    for c in line.chars().take(MAX_TITLE_CHARS) {
        if title.len() + c.len_utf8() > budget {
            break;
        }
        title.push(c);
    }
    title.push('…');
    title
}
