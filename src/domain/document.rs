/// A freshly fetched RSS channel. Dates are kept as the raw text the
/// publisher sent; interpretation happens in the update engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    pub title: String,
    pub description: String,
    pub language: Option<String>,
    pub last_build_date: Option<String>,
    pub entries: Vec<FetchedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedEntry {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
}
