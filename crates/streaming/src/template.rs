//! Tile URL templates (`{z}`, `{x}`, `{y}`, `{-y}`, `{s}`).

use crate::protocol::{TileCoord, TileScheme};

/// Subdomains used for `{s}` when the tile set does not name any.
const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    MissingPlaceholder(&'static str),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::MissingPlaceholder(p) => write!(f, "template has no {p} placeholder"),
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    scheme: TileScheme,
    subdomains: Vec<String>,
}

impl UrlTemplate {
    pub fn new(
        raw: impl Into<String>,
        scheme: TileScheme,
        subdomains: Vec<String>,
    ) -> Result<Self, TemplateError> {
        let raw = raw.into();
        for p in ["{z}", "{x}"] {
            if !raw.contains(p) {
                return Err(TemplateError::MissingPlaceholder(p));
            }
        }
        if !raw.contains("{y}") && !raw.contains("{-y}") {
            return Err(TemplateError::MissingPlaceholder("{y}"));
        }
        Ok(Self {
            raw,
            scheme,
            subdomains,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> TileScheme {
        self.scheme
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Fill in the placeholders for one native tile.
    pub fn expand(&self, coord: TileCoord) -> String {
        let mut url = self
            .raw
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{-y}", &coord.tms_y().to_string())
            .replace("{y}", &coord.row(self.scheme).to_string());

        if url.contains("{s}") {
            url = url.replace("{s}", self.subdomain_for(coord));
        }
        url
    }

    fn subdomain_for(&self, coord: TileCoord) -> &str {
        let idx = (coord.x as usize).wrapping_add(coord.y as usize);
        if self.subdomains.is_empty() {
            DEFAULT_SUBDOMAINS[idx % DEFAULT_SUBDOMAINS.len()]
        } else {
            &self.subdomains[idx % self.subdomains.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_xyz() {
        let t = UrlTemplate::new("/tiles/3/{z}/{x}/{y}.png", TileScheme::Xyz, vec![]).unwrap();
        assert_eq!(t.expand(TileCoord::new(12, 1950, 1540)), "/tiles/3/12/1950/1540.png");
    }

    #[test]
    fn tms_scheme_flips_y() {
        let t = UrlTemplate::new("/tiles/{z}/{x}/{y}.png", TileScheme::Tms, vec![]).unwrap();
        assert_eq!(t.expand(TileCoord::new(2, 1, 0)), "/tiles/2/1/3.png");
    }

    #[test]
    fn minus_y_is_always_tms() {
        let t = UrlTemplate::new("/tiles/{z}/{x}/{-y}.png", TileScheme::Xyz, vec![]).unwrap();
        assert_eq!(t.expand(TileCoord::new(2, 1, 0)), "/tiles/2/1/3.png");
    }

    #[test]
    fn subdomains_rotate_by_tile() {
        let t = UrlTemplate::new(
            "https://{s}.tile.example.org/{z}/{x}/{y}.png",
            TileScheme::Xyz,
            vec!["one".into(), "two".into()],
        )
        .unwrap();
        assert_eq!(t.expand(TileCoord::new(1, 0, 0)), "https://one.tile.example.org/1/0/0.png");
        assert_eq!(t.expand(TileCoord::new(1, 1, 0)), "https://two.tile.example.org/1/1/0.png");

        let default = UrlTemplate::new("https://{s}.t/{z}/{x}/{y}", TileScheme::Xyz, vec![]).unwrap();
        assert_eq!(default.expand(TileCoord::new(2, 2, 0)), "https://c.t/2/2/0");
    }

    #[test]
    fn rejects_templates_without_placeholders() {
        assert_eq!(
            UrlTemplate::new("/tiles/{x}/{y}", TileScheme::Xyz, vec![]),
            Err(TemplateError::MissingPlaceholder("{z}"))
        );
        assert_eq!(
            UrlTemplate::new("/tiles/{z}/{x}", TileScheme::Xyz, vec![]),
            Err(TemplateError::MissingPlaceholder("{y}"))
        );
    }
}
