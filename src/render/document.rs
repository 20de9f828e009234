use super::Container;

const STYLE: &str = r#"
    body { font-family: 'Inter', sans-serif; background: #f8fafc; color: #0f172a; margin: 0; }
    header { padding: 1rem 2rem; border-bottom: 1px solid #e2e8f0; background: #fff; }
    .blocks-container { list-style: none; display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1.5rem; padding: 2rem; margin: 0; }
    .spot-card { background: #fff; border-radius: 0.75rem; overflow: hidden; box-shadow: 0 1px 3px rgba(15, 23, 42, 0.1); }
    .card-link { color: inherit; text-decoration: none; }
    .card-image { position: relative; }
    .card-image img { width: 100%; height: 180px; object-fit: cover; display: block; }
    .category-tag { position: absolute; top: 0.75rem; left: 0.75rem; background: #135bec; color: #fff; padding: 0.2rem 0.6rem; border-radius: 9999px; font-size: 0.8rem; }
    .card-content { padding: 1rem; }
    .card-title { margin: 0 0 0.5rem; font-size: 1.1rem; }
    .card-address { color: #475569; font-size: 0.9rem; }
    .empty { padding: 2rem; color: #64748b; }
"#;

pub fn render_document(container: &Container) -> Vec<u8> {
    let mut cards = String::new();
    for card in container.cards() {
        cards.push_str(&card.to_html());
    }
    let empty = if container.is_empty() {
        r#"  <p class="empty">No spots to show.</p>
"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="lt">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Spots</title>
  <style>{STYLE}</style>
</head>
<body>
  <header><h1>Spots ({count})</h1></header>
{empty}  <ul class="blocks-container">
{cards}  </ul>
</body>
</html>
"#,
        count = container.len(),
    );
    html.into_bytes()
}
