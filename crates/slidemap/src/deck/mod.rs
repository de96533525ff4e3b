pub mod html;
pub mod loader;
pub mod source;

use crate::error::ViewerError;

/// One slide: its ordinal position, its markup, and whether it is on screen.
#[derive(Debug, Clone)]
pub struct Slide {
    pub index: usize,
    pub content: SlideContent,
    pub is_active: bool,
}

/// Raw fragment markup plus the blocks recovered from it.
#[derive(Debug, Clone)]
pub struct SlideContent {
    pub raw: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    ListItem { inlines: Vec<Inline> },
    Quote { inlines: Vec<Inline> },
    Divider,
    MapContainer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(String),
    /// A link that reveals `name` on the map slide.
    Location { label: String, name: String },
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(s) | Self::Strong(s) => s,
            Self::Location { label, .. } => label,
        }
    }
}

impl Block {
    /// Headings stay in place while the rest of a slide animates in.
    pub fn animates(&self) -> bool {
        !matches!(self, Self::Heading { .. } | Self::MapContainer)
    }

    pub fn inlines(&self) -> &[Inline] {
        match self {
            Self::Heading { inlines, .. }
            | Self::Paragraph { inlines }
            | Self::ListItem { inlines }
            | Self::Quote { inlines } => inlines,
            Self::Divider | Self::MapContainer => &[],
        }
    }
}

impl SlideContent {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let blocks = html::parse_fragment(&raw);
        Self { raw, blocks }
    }

    pub fn has_map_container(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::MapContainer))
    }

    /// Location names linked from this slide, in reading order.
    pub fn locations(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|b| b.inlines())
            .filter_map(|i| match i {
                Inline::Location { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First heading text, used for window titles and logs.
    pub fn title(&self) -> Option<String> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading { inlines, .. } => Some(
                inlines
                    .iter()
                    .map(Inline::text)
                    .collect::<String>()
                    .trim()
                    .to_string(),
            ),
            _ => None,
        })
    }
}

/// Ordered slide sequence. Slides are only ever appended.
#[derive(Debug, Default)]
pub struct SlideStore {
    slides: Vec<Slide>,
}

impl SlideStore {
    /// Append the next slide and return its index.
    pub fn push(&mut self, content: SlideContent) -> usize {
        let index = self.slides.len();
        self.slides.push(Slide {
            index,
            content,
            is_active: false,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn get(&self, index: usize) -> Result<&Slide, ViewerError> {
        self.slides.get(index).ok_or(ViewerError::OutOfRange {
            index,
            total: self.slides.len(),
        })
    }

    pub(crate) fn set_active(&mut self, index: usize, active: bool) {
        if let Some(slide) = self.slides.get_mut(index) {
            slide.is_active = active;
        }
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.slides
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_get_out_of_range() {
        let mut store = SlideStore::default();
        assert!(matches!(
            store.get(0),
            Err(ViewerError::OutOfRange { index: 0, total: 0 })
        ));
        store.push(SlideContent::parse("<h1>One</h1>"));
        store.push(SlideContent::parse("<h1>Two</h1>"));
        assert_eq!(store.get(1).map(|s| s.index).ok(), Some(1));
        assert!(matches!(
            store.get(2),
            Err(ViewerError::OutOfRange { index: 2, total: 2 })
        ));
    }

    #[test]
    fn test_content_locations_and_title() {
        let content = SlideContent::parse(
            r#"<h2>Cyprus</h2><p>From <a data-location="Salamis, Cyprus">Salamis</a> across to <a data-location="Paphos, Cyprus">Paphos</a>.</p>"#,
        );
        assert_eq!(content.title().as_deref(), Some("Cyprus"));
        assert_eq!(content.locations(), vec!["Salamis, Cyprus", "Paphos, Cyprus"]);
        assert!(!content.has_map_container());
    }

    #[test]
    fn test_headings_do_not_animate() {
        let content = SlideContent::parse("<h1>Title</h1><p>Body</p>");
        let animated: Vec<bool> = content.blocks.iter().map(Block::animates).collect();
        assert_eq!(animated, vec![false, true]);
    }
}
