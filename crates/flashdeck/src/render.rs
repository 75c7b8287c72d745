//! HTML rendering for the index page.
//!
//! The page is small enough that a template engine would be more machinery
//! than markup, so it is assembled with `format!` and every user or provider
//! supplied string passes through `html_escape`.

use std::fmt::Write as _;

use html_escape::encode_text;

use crate::flashcard::Flashcard;

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { margin-bottom: 0.25rem; }
form { margin: 1rem 0; display: flex; gap: 0.5rem; flex-wrap: wrap; }
input[type=text] { flex: 1; padding: 0.4rem; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(14rem, 1fr)); gap: 0.75rem; padding: 0; }
.card { list-style: none; border: 1px solid #ccc; border-radius: 6px; padding: 0.75rem; }
.card .term { font-weight: 600; margin-bottom: 0.4rem; }
.card.error { border-color: #c0392b; background: #fdecea; }
.empty { color: #777; }
";

/// Render the index page for `cards`.
#[must_use]
pub fn render_index(cards: &[Flashcard]) -> String {
    let mut html = String::with_capacity(2048 + cards.len() * 128);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Flashcards</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<h1>Flashcards</h1>\n");

    html.push_str(concat!(
        "<form method=\"post\" action=\"/add\">\n",
        "<input type=\"text\" name=\"term\" placeholder=\"Term\" required>\n",
        "<input type=\"text\" name=\"definition\" placeholder=\"Definition\" required>\n",
        "<button type=\"submit\">Add</button>\n",
        "</form>\n",
        "<form method=\"post\" action=\"/generate\">\n",
        "<input type=\"text\" name=\"subject\" placeholder=\"Subject to generate cards about\" required>\n",
        "<button type=\"submit\">Generate</button>\n",
        "</form>\n",
        "<form method=\"post\" action=\"/clear\">\n",
        "<button type=\"submit\">Clear all</button>\n",
        "</form>\n",
    ));

    if cards.is_empty() {
        html.push_str("<p class=\"empty\">No flashcards yet.</p>\n");
    } else {
        html.push_str("<ul class=\"cards\">\n");
        for card in cards {
            render_card(&mut html, card);
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, card: &Flashcard) {
    let class = if card.is_error() { "card error" } else { "card" };
    let _ = writeln!(
        html,
        "<li class=\"{class}\"><div class=\"term\">{}</div><div class=\"definition\">{}</div></li>",
        encode_text(&card.term),
        encode_text(&card.definition),
    );
}
