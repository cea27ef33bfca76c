use std::fmt;

/// The built-in [SPARQL query](https://www.w3.org/TR/sparql11-query/) results serialization formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
#[non_exhaustive]
pub enum QueryResultsFormat {
    /// [SPARQL Query Results XML Format](https://www.w3.org/TR/rdf-sparql-XMLres/)
    Xml,
    /// [SPARQL Query Results JSON Format](https://www.w3.org/TR/sparql11-results-json/)
    Json,
    /// [SPARQL Query Results CSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/)
    Csv,
    /// [SPARQL Query Results TSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/)
    Tsv,
}

impl QueryResultsFormat {
    /// The format short name, used for lookup in the registry.
    #[inline]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// The format canonical IRI according to the [Unique URIs for file formats registry](https://www.w3.org/ns/formats/).
    #[inline]
    pub const fn iri(self) -> &'static str {
        match self {
            Self::Xml => "http://www.w3.org/ns/formats/SPARQL_Results_XML",
            Self::Json => "http://www.w3.org/ns/formats/SPARQL_Results_JSON",
            Self::Csv => "http://www.w3.org/ns/formats/SPARQL_Results_CSV",
            Self::Tsv => "http://www.w3.org/ns/formats/SPARQL_Results_TSV",
        }
    }

    /// The format canonical [IANA media type](https://tools.ietf.org/html/rfc2046).
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Xml => "application/sparql-results+xml",
            Self::Json => "application/sparql-results+json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Tsv => "text/tab-separated-values; charset=utf-8",
        }
    }

    /// The format usual file extension.
    #[inline]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::Xml => "srx",
            Self::Json => "srj",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// The format human-readable label.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xml => "SPARQL Results in XML",
            Self::Json => "SPARQL Results in JSON",
            Self::Csv => "SPARQL Results in CSV",
            Self::Tsv => "SPARQL Results in TSV",
        }
    }

    /// Does a streaming reader exist for this format?
    ///
    /// CSV is write-only: its lossy term encoding cannot be read back.
    #[inline]
    pub const fn supports_read(self) -> bool {
        !matches!(self, Self::Csv)
    }
}

impl fmt::Display for QueryResultsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The direction a format lookup needs: parsing, serializing, or either.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum FormatDirection {
    #[default]
    Any,
    Reader,
    Writer,
}

/// One registered results format: a short name, alias IRIs and MIME types
/// carrying a 0..10 quality score used for content negotiation.
#[derive(Debug, Clone)]
pub struct FormatEntry {
    pub format: QueryResultsFormat,
    pub short_name: String,
    pub iris: Vec<String>,
    /// (MIME type, quality 0..10) pairs, canonical type first.
    pub media_types: Vec<(String, u8)>,
}

impl FormatEntry {
    fn builtin(format: QueryResultsFormat, media_types: &[(&str, u8)]) -> Self {
        Self {
            format,
            short_name: format.short_name().to_owned(),
            iris: vec![format.iri().to_owned()],
            media_types: media_types
                .iter()
                .map(|(t, q)| ((*t).to_owned(), *q))
                .collect(),
        }
    }

    fn matches_direction(&self, direction: FormatDirection) -> bool {
        match direction {
            FormatDirection::Any | FormatDirection::Writer => true,
            FormatDirection::Reader => self.format.supports_read(),
        }
    }
}

/// The registry of known results formats.
///
/// It is owned by a world object created by the host; there is no process
/// global. The first registered format is the default used when a lookup
/// gives no criterion at all.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
}

impl FormatRegistry {
    /// An empty registry; mostly useful for tests.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, entry: FormatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    /// The first-registered format, used when no lookup criterion is given.
    pub fn default_entry(&self) -> Option<&FormatEntry> {
        self.entries.first()
    }

    /// Looks a format up by short name, alias IRI or MIME type, in that order.
    ///
    /// A `None` needle returns the default format.
    pub fn find(&self, needle: Option<&str>, direction: FormatDirection) -> Option<&FormatEntry> {
        let Some(needle) = needle else {
            return self
                .entries
                .iter()
                .find(|e| e.matches_direction(direction));
        };
        self.find_by_short_name(needle, direction)
            .or_else(|| self.find_by_iri(needle, direction))
            .or_else(|| self.find_by_media_type(needle, direction))
    }

    pub fn find_by_short_name(
        &self,
        name: &str,
        direction: FormatDirection,
    ) -> Option<&FormatEntry> {
        self.entries
            .iter()
            .filter(|e| e.matches_direction(direction))
            .find(|e| e.short_name.eq_ignore_ascii_case(name))
    }

    pub fn find_by_iri(&self, iri: &str, direction: FormatDirection) -> Option<&FormatEntry> {
        self.entries
            .iter()
            .filter(|e| e.matches_direction(direction))
            .find(|e| e.iris.iter().any(|i| i == iri))
    }

    /// Finds the format entry accepting the given MIME type, ignoring
    /// parameters, preferring higher quality scores.
    pub fn find_by_media_type(
        &self,
        media_type: &str,
        direction: FormatDirection,
    ) -> Option<&FormatEntry> {
        let needle = media_type.split(';').next().unwrap_or(media_type).trim();
        self.entries
            .iter()
            .filter(|e| e.matches_direction(direction))
            .filter_map(|e| {
                e.media_types
                    .iter()
                    .filter(|(t, _)| {
                        t.split(';').next().unwrap_or(t).trim().eq_ignore_ascii_case(needle)
                    })
                    .map(|(_, q)| (*q, e))
                    .max_by_key(|(q, _)| *q)
            })
            .max_by_key(|(q, _)| *q)
            .map(|(_, e)| e)
    }

    /// Guesses the format of a content prefix, scoring each known format and
    /// picking the highest.
    pub fn guess_from_content(&self, content: &[u8]) -> Option<&FormatEntry> {
        let head: &[u8] = &content[..content.len().min(1024)];
        let trimmed = trim_ascii_start(head);
        self.entries
            .iter()
            .map(|e| {
                let score = match e.format {
                    QueryResultsFormat::Xml => {
                        if trimmed.starts_with(b"<?xml") || trimmed.starts_with(b"<sparql") {
                            10
                        } else if trimmed.starts_with(b"<") {
                            4
                        } else {
                            0
                        }
                    }
                    QueryResultsFormat::Json => {
                        if trimmed.starts_with(b"{") {
                            if find_subslice(head, b"\"head\"").is_some() {
                                10
                            } else {
                                6
                            }
                        } else {
                            0
                        }
                    }
                    QueryResultsFormat::Tsv => {
                        if trimmed.starts_with(b"?") {
                            8
                        } else if memchr::memchr(b'\t', head).is_some() {
                            5
                        } else {
                            0
                        }
                    }
                    QueryResultsFormat::Csv => {
                        if memchr::memchr(b',', head).is_some() {
                            3
                        } else if !trimmed.is_empty() {
                            1
                        } else {
                            0
                        }
                    }
                };
                (score, e)
            })
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score)
            .map(|(_, e)| e)
    }
}

impl Default for FormatRegistry {
    /// A registry with the four built-in formats, XML first so it is the default.
    fn default() -> Self {
        Self {
            entries: vec![
                FormatEntry::builtin(
                    QueryResultsFormat::Xml,
                    &[
                        ("application/sparql-results+xml", 10),
                        ("application/xml", 5),
                        ("text/xml", 4),
                    ],
                ),
                FormatEntry::builtin(
                    QueryResultsFormat::Json,
                    &[
                        ("application/sparql-results+json", 10),
                        ("application/json", 5),
                        ("text/json", 2),
                    ],
                ),
                FormatEntry::builtin(
                    QueryResultsFormat::Csv,
                    &[("text/csv", 10), ("text/plain", 1)],
                ),
                FormatEntry::builtin(
                    QueryResultsFormat::Tsv,
                    &[("text/tab-separated-values", 10)],
                ),
            ],
        }
    }
}

fn trim_ascii_start(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_through_name_iri_and_media_type() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry
                .find(Some("json"), FormatDirection::Any)
                .unwrap()
                .format,
            QueryResultsFormat::Json
        );
        assert_eq!(
            registry
                .find(
                    Some("http://www.w3.org/ns/formats/SPARQL_Results_TSV"),
                    FormatDirection::Any
                )
                .unwrap()
                .format,
            QueryResultsFormat::Tsv
        );
        assert_eq!(
            registry
                .find(
                    Some("application/sparql-results+xml; charset=utf-8"),
                    FormatDirection::Any
                )
                .unwrap()
                .format,
            QueryResultsFormat::Xml
        );
    }

    #[test]
    fn default_format_is_first_registered() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.find(None, FormatDirection::Any).unwrap().format,
            QueryResultsFormat::Xml
        );
    }

    #[test]
    fn reader_direction_skips_write_only_formats() {
        let registry = FormatRegistry::default();
        assert!(registry
            .find_by_short_name("csv", FormatDirection::Reader)
            .is_none());
        assert!(registry
            .find_by_short_name("csv", FormatDirection::Writer)
            .is_some());
    }

    #[test]
    fn guess_by_content_scores_candidates() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry
                .guess_from_content(b"<?xml version=\"1.0\"?><sparql>")
                .unwrap()
                .format,
            QueryResultsFormat::Xml
        );
        assert_eq!(
            registry
                .guess_from_content(br#"{"head":{"vars":[]}}"#)
                .unwrap()
                .format,
            QueryResultsFormat::Json
        );
        assert_eq!(
            registry.guess_from_content(b"?x\t?y\n").unwrap().format,
            QueryResultsFormat::Tsv
        );
        assert_eq!(
            registry.guess_from_content(b"x,y\r\n1,2\r\n").unwrap().format,
            QueryResultsFormat::Csv
        );
    }
}
