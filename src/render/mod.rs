pub mod document;

use colored::Colorize;

use crate::model::Spot;

pub const PLACEHOLDER_IMAGE: &str = "images/placeholder.jpg";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One rendered spot.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub href: String,
    pub image_src: String,
    pub category: String,
    pub title: String,
    pub address: String,
}

impl Card {
    pub fn from_spot(spot: &Spot) -> Self {
        let image_src = spot
            .image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string();
        Self {
            href: format!("spot-details.html?id={}", spot.id),
            image_src,
            category: spot.category.clone(),
            title: spot.name.clone(),
            address: spot.address.clone(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<li class="spot-card">
  <a href="{href}" class="card-link">
    <div class="card-image">
      <img src="{src}" alt="{alt}">
      <span class="category-tag">{category}</span>
    </div>
    <div class="card-content">
      <h2 class="card-title">{title}</h2>
      <div class="card-address">
        <span class="location-icon">📍</span>
        <span>{address}</span>
      </div>
    </div>
  </a>
</li>
"#,
            href = escape_html(&self.href),
            src = escape_html(&self.image_src),
            alt = escape_html(&self.title),
            category = escape_html(&self.category),
            title = escape_html(&self.title),
            address = escape_html(&self.address),
        )
    }

    pub fn to_text(&self, no_color: bool) -> String {
        if no_color {
            return format!(
                "[{}] {}\n    📍 {}\n    {}\n",
                self.category, self.title, self.address, self.href
            );
        }
        format!(
            "{}{}{} {}\n    📍 {}\n    {}\n",
            "[".bold().white(),
            self.category.bold().cyan(),
            "]".bold().white(),
            self.title.bold(),
            self.address,
            self.href.dimmed()
        )
    }
}

/// The card list. Every render replaces the whole thing.
#[derive(Clone, Debug, Default)]
pub struct Container {
    spots: Vec<Spot>,
    cards: Vec<Card>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

pub fn render_spots(container: &mut Container, spots: Vec<Spot>) {
    container.cards = spots.iter().map(Card::from_spot).collect();
    container.spots = spots;
}

pub fn render_text(container: &Container, no_color: bool) -> Vec<u8> {
    let mut out = String::new();
    for card in container.cards() {
        out.push_str(&card.to_text(no_color));
    }
    out.into_bytes()
}

pub fn render_json(container: &Container) -> Vec<u8> {
    serde_json::to_vec_pretty(container.spots()).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(container: &Container) -> Vec<u8> {
    document::render_document(container)
}

pub fn render(container: &Container, format: OutputFormat, no_color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(container, no_color),
        OutputFormat::Json => render_json(container),
        OutputFormat::Html => render_html(container),
    }
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(id: i64, name: &str, image_url: Option<&str>) -> Spot {
        Spot {
            id,
            name: name.to_string(),
            category: "Gamta".to_string(),
            address: format!("Street {id}"),
            image_url: image_url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn render_replaces_previous_cards() {
        let mut container = Container::new();
        render_spots(&mut container, vec![spot(1, "a", None), spot(2, "b", None)]);
        assert_eq!(container.len(), 2);
        render_spots(&mut container, vec![spot(3, "c", None)]);
        assert_eq!(container.len(), 1);
        assert_eq!(container.cards()[0].title, "c");
        render_spots(&mut container, Vec::new());
        assert!(container.is_empty());
    }

    #[test]
    fn missing_or_empty_image_uses_placeholder() {
        assert_eq!(Card::from_spot(&spot(1, "a", None)).image_src, PLACEHOLDER_IMAGE);
        assert_eq!(Card::from_spot(&spot(1, "a", Some(""))).image_src, PLACEHOLDER_IMAGE);
        assert_eq!(
            Card::from_spot(&spot(1, "a", Some("https://img/x.jpg"))).image_src,
            "https://img/x.jpg"
        );
    }

    #[test]
    fn card_links_to_details_by_id() {
        assert_eq!(
            Card::from_spot(&spot(42, "a", None)).href,
            "spot-details.html?id=42"
        );
    }

    #[test]
    fn html_escapes_interpolated_values() {
        let html = Card::from_spot(&spot(1, "<b>Tom & Jerry</b>", None)).to_html();
        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
        assert!(!html.contains("<b>Tom"));
    }

    #[test]
    fn plain_text_contains_name_and_address() {
        let mut container = Container::new();
        render_spots(&mut container, vec![spot(7, "Lake", None)]);
        let text = String::from_utf8(render_text(&container, true)).unwrap();
        assert!(text.contains("[Gamta] Lake"));
        assert!(text.contains("Street 7"));
    }

    #[test]
    fn format_inference() {
        assert_eq!(infer_format_from_path("out.JSON"), Some(OutputFormat::Json));
        assert_eq!(infer_format_from_path("spots.htm"), Some(OutputFormat::Html));
        assert_eq!(infer_format_from_path("spots"), None);
        assert_eq!(OutputFormat::parse(" txt "), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
