//! Embedded HTML pages and the usage text.

use core::fmt::Write as _;

use review_types::Summary;

/// Endpoint cheat-sheet returned for unknown paths.
pub const USAGE: &str = "Valid endpoints (all JSON):

GET  /open/{list}              -> first open item with its index
GET  /close/{list}?index=n     -> close item (index optional)
GET  /add/{list}               -> create empty list
POST /add/{list}               -> create list, seed JSON array
GET  /delete/{list}            -> delete list
GET  /list/{list}              -> full list JSON
GET  /timeout/{seconds}        -> set throttle delay (0-600 s)
GET  /meta                     -> summary for index page
POST /mcp                      -> announce tools, start keep-alives
GET  /mcp/sse                  -> event stream
/ or /index.html               -> web UI
";

/// Render the board page from a summary.
pub fn render_index(summary: &Summary) -> String {
    let mut rows = String::new();
    for list in &summary.lists {
        let name = escape_html(&list.name);
        // Writing to a String cannot fail.
        let _ = write!(
            rows,
            r#"
        <tr>
            <td>{name}</td>
            <td>{count}</td>
            <td><span class="badge open">{open}</span></td>
        </tr>"#,
            count = list.count,
            open = list.open,
        );
    }
    if rows.is_empty() {
        rows.push_str(r#"<tr><td colspan="3">No lists yet</td></tr>"#);
    }
    let delay = summary.delay;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Review-Board</title>
    <style>
        body {{ font-family: sans-serif; margin: 2rem; }}
        table {{ border-collapse: collapse; width: 100%; margin-bottom: 2rem; }}
        th, td {{ border: 1px solid #ddd; padding: .4rem; text-align: left; }}
        tr:hover {{ background: #f3f3f3; }}
        .badge {{ padding: 2px 6px; border-radius: 4px; color: #fff; font-size: .8rem; }}
        .open {{ background: #28a745; }}
    </style>
</head>
<body>
    <h1>Review Board</h1>
    <p><a href="/test">Test list functions</a></p>
    <p>Item delay: <strong>{delay} s</strong></p>

    <table>
        <tr><th>List</th><th>Items</th><th>Open</th></tr>{rows}
    </table>

    <h2>Endpoints</h2>
    <pre>{usage}</pre>
</body>
</html>"#,
        usage = escape_html(USAGE),
    )
}

/// Interactive page exercising the list endpoints from the browser.
pub const TEST_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>List Tool Tester</title>
<style>
body{font-family:sans-serif;margin:2rem}
button{margin:0.5rem;}
</style>
</head>
<body>
<h1>List Tool Tester</h1>
<button onclick="call('open')">Test Open</button>
<button onclick="closeItem()">Test Close</button>
<button onclick="call('add')">Test Add</button>
<button onclick="call('delete')">Test Delete</button>
<button onclick="call('list')">Test List</button>
<pre id="out"></pre>
<script>
async function show(url) {
    const res = await fetch(url);
    document.getElementById('out').textContent = res.status + ' ' + await res.text();
}
function call(op) {
    const name = prompt("Enter list name:");
    if (name) show('/' + op + '/' + encodeURIComponent(name));
}
function closeItem() {
    const name = prompt("Enter list name:");
    if (!name) return;
    const index = prompt("Enter index (optional):");
    show('/close/' + encodeURIComponent(name) + (index ? '?index=' + encodeURIComponent(index) : ''));
}
</script>
</body>
</html>"#;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use review_types::ListSummary;

    use super::*;

    #[test]
    fn index_escapes_list_names() {
        let summary = Summary {
            lists: vec![ListSummary {
                name: String::from("<script>"),
                count: 2,
                open: 1,
            }],
            delay: 7,
        };
        let html = render_index(&summary);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("7 s"));
    }

    #[test]
    fn empty_board_has_placeholder_row() {
        assert!(render_index(&Summary::default()).contains("No lists yet"));
    }
}
