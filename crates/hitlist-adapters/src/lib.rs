//! URL identity, ATS detection, posting-page parsing and search-hit sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use hitlist_core::{Ats, RawHit, RemoteStatus, SearchQuery, VerificationRecord};
use regex::Regex;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const CRATE_NAME: &str = "hitlist-adapters";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Capability shared by every entry of a platform lookup table.
pub trait UrlMatcher {
    fn matches(&self, url: &Url) -> bool;
}

/// Matches a host equal to, or a subdomain of, the given domain.
#[derive(Debug, Clone, Copy)]
pub struct HostSuffix(pub &'static str);

impl UrlMatcher for HostSuffix {
    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        host == self.0
            || host
                .strip_suffix(self.0)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

impl UrlMatcher for Regex {
    fn matches(&self, url: &Url) -> bool {
        self.is_match(url.as_str())
    }
}

/// First table entry whose matcher accepts the URL.
pub fn first_match<M: UrlMatcher, T: Copy>(table: &[(M, T)], url: &Url) -> Option<T> {
    table
        .iter()
        .find(|(matcher, _)| matcher.matches(url))
        .map(|(_, tag)| *tag)
}

pub const ATS_HOSTS: &[(HostSuffix, Ats)] = &[
    (HostSuffix("ashbyhq.com"), Ats::Ashby),
    (HostSuffix("greenhouse.io"), Ats::Greenhouse),
    (HostSuffix("lever.co"), Ats::Lever),
    (HostSuffix("myworkdayjobs.com"), Ats::Workday),
    (HostSuffix("icims.com"), Ats::ICims),
    (HostSuffix("smartrecruiters.com"), Ats::SmartRecruiters),
    (HostSuffix("workable.com"), Ats::Workable),
];

pub fn classify(url: &str) -> Ats {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| first_match(ATS_HOSTS, &parsed))
        .unwrap_or(Ats::Other)
}

const TRACKING_PREFIXES: &[&str] = &["utm_"];
const TRACKING_EXACT: &[&str] = &["ref", "source", "lever-source", "gh_src", "gclid", "fbclid"];

static GREENHOUSE_JOB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/jobs/(\d+)").expect("greenhouse id regex"));
static ASHBY_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})(?:/|$)")
        .expect("ashby uuid regex")
});
static LEVER_POSTING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9a-f][0-9a-f-]{7,}$").expect("lever id regex"));
static WORKDAY_JOB_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/job/[^/]+/([^/]+)").expect("workday segment regex"));
static SMARTRECRUITERS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[^/]+/(\d+)").expect("smartrecruiters id regex"));
static WORKABLE_SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/j/([A-Za-z0-9]+)").expect("workable shortcode regex"));

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PREFIXES.iter().any(|p| key.starts_with(p)) || TRACKING_EXACT.contains(&key.as_str())
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn numeric_param(url: &Url, name: &str) -> Option<String> {
    query_param(url, name).filter(|v| v.chars().all(|c| c.is_ascii_digit()))
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Platform-native posting id, if the URL carries one.
pub fn platform_job_id(url: &Url, ats: Ats) -> Option<String> {
    let path = url.path();
    match ats {
        Ats::Greenhouse => capture(&GREENHOUSE_JOB_ID, path)
            .or_else(|| numeric_param(url, "gh_jid"))
            .or_else(|| numeric_param(url, "token"))
            .map(|id| format!("greenhouse_{id}")),
        Ats::Ashby => {
            capture(&ASHBY_UUID, path).map(|id| format!("ashby_{}", id.to_ascii_lowercase()))
        }
        Ats::Lever => {
            let trimmed = path.trim_end_matches('/');
            let trimmed = trimmed.strip_suffix("/apply").unwrap_or(trimmed);
            trimmed
                .rsplit('/')
                .next()
                .filter(|segment| LEVER_POSTING_ID.is_match(segment))
                .map(|segment| format!("lever_{}", segment.to_ascii_lowercase()))
        }
        Ats::Workday => capture(&WORKDAY_JOB_SEGMENT, path).map(|seg| format!("workday_{seg}")),
        Ats::ICims => capture(&GREENHOUSE_JOB_ID, path).map(|id| format!("icims_{id}")),
        Ats::SmartRecruiters => {
            capture(&SMARTRECRUITERS_ID, path).map(|id| format!("smartrecruiters_{id}"))
        }
        Ats::Workable => capture(&WORKABLE_SHORTCODE, path).map(|code| format!("workable_{code}")),
        // Company career sites frequently embed Greenhouse boards.
        Ats::Other => numeric_param(url, "gh_jid").map(|id| format!("greenhouse_{id}")),
    }
}

/// Lower-cased scheme and host, no trailing slash, tracking parameters and fragment dropped.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_string();
    };
    let Some(host) = url.host_str() else {
        return trimmed.trim_end_matches('/').to_string();
    };

    let mut out = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        out.push_str(&format!(":{port}"));
    }
    out.push_str(url.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        out.push('?');
        out.push_str(&query);
    }
    out
}

/// Stable dedup key for a posting URL. Total: falls back to the normalized URL.
pub fn identity_key(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return normalize_url(url);
    };
    let ats = first_match(ATS_HOSTS, &parsed).unwrap_or(Ats::Other);
    platform_job_id(&parsed, ats).unwrap_or_else(|| normalize_url(url))
}

fn first_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn first_host_label(url: &Url) -> Option<String> {
    url.host_str()?.split('.').next().map(ToString::to_string)
}

fn humanize_slug(slug: &str) -> String {
    slug.split(|c| c == '-' || c == '_' || c == '+')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    let mut word = String::new();
                    word.extend(first.to_uppercase());
                    word.push_str(chars.as_str());
                    word
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn company_from_url(url: &Url, ats: Ats) -> Option<String> {
    let slug = match ats {
        Ats::Greenhouse => match first_path_segment(url) {
            Some(seg) if seg == "embed" => query_param(url, "for"),
            other => other,
        },
        Ats::Ashby | Ats::Lever | Ats::SmartRecruiters | Ats::Workable => first_path_segment(url),
        Ats::Workday => first_host_label(url),
        Ats::ICims => first_host_label(url).map(|label| {
            label
                .strip_prefix("careers-")
                .or_else(|| label.strip_prefix("jobs-"))
                .unwrap_or(&label)
                .to_string()
        }),
        Ats::Other => None,
    }?;
    let name = humanize_slug(&slug);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn company_from_title(title: &str) -> Option<String> {
    let candidate = if let Some((_, rest)) = title.rsplit_once(" at ") {
        rest
    } else if let Some((_, rest)) = title.rsplit_once(" - ") {
        rest
    } else {
        return None;
    };
    text_or_none(candidate.to_string())
}

/// Company behind a posting: board slug from the URL, then title conventions, else "Unknown".
pub fn company_name(url: &str, title: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| {
            let ats = first_match(ATS_HOSTS, &parsed).unwrap_or(Ats::Other);
            company_from_url(&parsed, ats)
        })
        .or_else(|| company_from_title(title))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .find_map(|n| text_or_none(n.text().collect::<Vec<_>>().join(" ")))
}

fn select_first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .find_map(|n| n.value().attr(attr))
        .and_then(|s| text_or_none(s.to_string()))
}

fn json_str<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_str()
}

fn is_job_posting(value: &JsonValue) -> bool {
    match value.get("@type") {
        Some(JsonValue::String(kind)) => kind == "JobPosting",
        Some(JsonValue::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn collect_job_postings<'a>(value: &'a JsonValue, out: &mut Vec<&'a JsonValue>) {
    match value {
        JsonValue::Array(items) => {
            for item in items {
                collect_job_postings(item, out);
            }
        }
        JsonValue::Object(map) => {
            if is_job_posting(value) {
                out.push(value);
            }
            if let Some(graph) = map.get("@graph") {
                collect_job_postings(graph, out);
            }
        }
        _ => {}
    }
}

/// Job-posting fields found in embedded structured data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredPosting {
    pub date_posted: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
}

fn address_text(address: &JsonValue) -> Option<String> {
    if let Some(text) = address.as_str() {
        return text_or_none(text.to_string());
    }
    let locality = json_str(address, &["addressLocality"]);
    let region = json_str(address, &["addressRegion"]);
    let joined = [locality, region]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    text_or_none(joined)
}

fn job_location_text(posting: &JsonValue) -> Option<String> {
    let location = posting.get("jobLocation")?;
    let first = match location {
        JsonValue::Array(items) => items.first()?,
        other => other,
    };
    first.get("address").and_then(address_text)
}

fn employment_type_text(posting: &JsonValue) -> Option<String> {
    match posting.get("employmentType")? {
        JsonValue::String(kind) => text_or_none(kind.clone()),
        JsonValue::Array(kinds) => text_or_none(
            kinds
                .iter()
                .filter_map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

/// First JSON-LD `JobPosting` on the page. Unparseable script blocks are skipped.
pub fn structured_posting(document: &Html) -> Option<StructuredPosting> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for script in document.select(&sel) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<JsonValue>(raw.trim()) else {
            continue;
        };
        let mut postings = Vec::new();
        collect_job_postings(&value, &mut postings);
        if let Some(posting) = postings.first() {
            return Some(StructuredPosting {
                date_posted: json_str(posting, &["datePosted"]).map(ToString::to_string),
                location: job_location_text(posting),
                employment_type: employment_type_text(posting),
            });
        }
    }
    None
}

/// Parse the date shapes seen in posting pages: RFC 3339, naive ISO date-time, bare date.
pub fn parse_posted_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

static POSTED_TODAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:posted\s+(?:on\s+)?today|just\s+posted)\b").expect("today regex")
});
static POSTED_YESTERDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bposted\s+(?:on\s+)?yesterday\b").expect("yesterday regex")
});
static RELATIVE_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+|an?)\+?\s*(hour|hr|day|week|month)s?\s+ago\b").expect("ago regex")
});

/// Resolve "posted today", "posted yesterday" and "N units ago" against `now`.
/// Amounts that do not fit in a chrono timestamp resolve to `None`.
pub fn parse_relative_posted(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if POSTED_TODAY.is_match(text) {
        return Some(now);
    }
    if POSTED_YESTERDAY.is_match(text) {
        return Some(now - Duration::hours(24));
    }
    let caps = RELATIVE_AGO.captures(text)?;
    let amount_raw = caps.get(1)?.as_str();
    let amount: i64 = if amount_raw.eq_ignore_ascii_case("a") || amount_raw.eq_ignore_ascii_case("an")
    {
        1
    } else {
        amount_raw.parse().ok()?
    };
    let unit_hours = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "hour" | "hr" => 1,
        "day" => 24,
        "week" => 24 * 7,
        "month" => 24 * 30,
        _ => return None,
    };
    let age = TimeDelta::try_hours(amount.checked_mul(unit_hours)?)?;
    now.checked_sub_signed(age)
}

/// Page text a reader would see: script, style and template contents are skipped.
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

static REMOTE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:remote|work\s+from\s+home|wfh)\b").expect("remote regex")
});
static HYBRID_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhybrid\b").expect("hybrid regex"));

pub fn remote_status_from_text(text: &str) -> RemoteStatus {
    if REMOTE_HINT.is_match(text) {
        if HYBRID_HINT.is_match(text) {
            RemoteStatus::Hybrid
        } else {
            RemoteStatus::Remote
        }
    } else {
        RemoteStatus::OnSite
    }
}

#[derive(Debug, Default)]
struct PageFacts {
    posted_at: Option<DateTime<Utc>>,
    location: Option<String>,
    employment_type: Option<String>,
}

fn greenhouse_facts(document: &Html) -> PageFacts {
    let posted = select_first_attr(document, r#"meta[property="og:published_time"]"#, "content")
        .or_else(|| select_first_attr(document, r#"meta[property="article:published_time"]"#, "content"))
        .or_else(|| select_first_attr(document, "time[datetime]", "datetime"));
    PageFacts {
        posted_at: posted.as_deref().and_then(parse_posted_date),
        location: select_first_text(document, "div.location")
            .or_else(|| select_first_text(document, ".location")),
        employment_type: None,
    }
}

fn lever_facts(document: &Html) -> PageFacts {
    PageFacts {
        posted_at: None,
        location: select_first_text(document, ".posting-categories .location")
            .or_else(|| select_first_text(document, ".posting-categories .sort-by-location")),
        employment_type: select_first_text(document, ".posting-categories .commitment")
            .or_else(|| select_first_text(document, ".posting-categories .sort-by-commitment")),
    }
}

fn platform_facts(document: &Html, ats: Ats) -> PageFacts {
    match ats {
        Ats::Greenhouse => greenhouse_facts(document),
        Ats::Lever => lever_facts(document),
        _ => PageFacts::default(),
    }
}

/// Extract freshness and placement details from a fetched posting page.
///
/// Structured JSON-LD wins; platform markup fills whatever it left empty, and relative
/// "posted N days ago" text is the last resort for the posted date. Remote status always
/// comes from the visible text.
pub fn parse_posting_page(html: &str, ats: Ats, fetched_at: DateTime<Utc>) -> VerificationRecord {
    let document = Html::parse_document(html);
    let structured = structured_posting(&document).unwrap_or_default();
    let text = visible_text(&document);

    let mut posted_at = structured.date_posted.as_deref().and_then(parse_posted_date);
    let mut location = structured.location;
    let mut employment_type = structured.employment_type;

    if posted_at.is_none() || location.is_none() || employment_type.is_none() {
        let facts = platform_facts(&document, ats);
        posted_at = posted_at.or(facts.posted_at);
        location = location.or(facts.location);
        employment_type = employment_type.or(facts.employment_type);
    }
    if posted_at.is_none() {
        posted_at = parse_relative_posted(&text, fetched_at);
    }

    VerificationRecord {
        fetched_at,
        posted_at,
        location,
        employment_type,
        remote_status: remote_status_from_text(&text),
    }
}

/// The search collaborator: turns one catalog query into raw hits.
#[async_trait]
pub trait HitSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, AdapterError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HitDump {
    Plain(Vec<RawHit>),
    Brave { web: BraveWeb },
    Google { items: Vec<GoogleItem> },
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

impl HitDump {
    fn into_hits(self) -> Vec<RawHit> {
        match self {
            HitDump::Plain(hits) => hits,
            HitDump::Brave { web } => web.results,
            HitDump::Google { items } => items
                .into_iter()
                .map(|item| RawHit {
                    title: item.title,
                    url: item.link,
                    description: item.snippet,
                })
                .collect(),
        }
    }
}

/// Parse a saved search response: a bare hit array, a Brave `web.results` body or a
/// Google CSE `items` body.
pub fn parse_hit_dump(text: &str) -> Result<Vec<RawHit>, AdapterError> {
    let dump: HitDump = serde_json::from_str(text)
        .map_err(|e| AdapterError::Message(format!("unrecognized hit dump: {e}")))?;
    Ok(dump.into_hits())
}

/// Reads `<root>/<query id>.json`; a query without a dump simply has no hits.
#[derive(Debug, Clone)]
pub struct FileHitSource {
    root: PathBuf,
}

impl FileHitSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dump_path(&self, query: &SearchQuery) -> PathBuf {
        self.root.join(format!("{}.json", query.id))
    }
}

#[async_trait]
impl HitSource for FileHitSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, AdapterError> {
        let path = self.dump_path(query);
        if !tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("checking {}", path.display()))?
        {
            debug!(query_id = %query.id, path = %path.display(), "no hit dump for query");
            return Ok(Vec::new());
        }
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        parse_hit_dump(&text).map_err(|e| AdapterError::Message(format!("{}: {e}", path.display())))
    }
}

/// In-memory source keyed by query id.
#[derive(Debug, Clone, Default)]
pub struct StaticHitSource {
    hits: HashMap<String, Vec<RawHit>>,
}

impl StaticHitSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, query_id: &str, hits: Vec<RawHit>) -> Self {
        self.hits.entry(query_id.to_string()).or_default().extend(hits);
        self
    }
}

#[async_trait]
impl HitSource for StaticHitSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, AdapterError> {
        Ok(self.hits.get(&query.id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn tracking_params_and_trailing_slash_do_not_change_identity() {
        let a = identity_key("https://careers.acme.com/jobs/ai-engineer/?utm_source=brave&ref=hn#apply");
        let b = identity_key("https://careers.acme.com/jobs/ai-engineer");
        let c = identity_key("HTTPS://Careers.ACME.com/jobs/ai-engineer/?fbclid=xyz&utm_medium=cpc");
        assert_eq!(a, "https://careers.acme.com/jobs/ai-engineer");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn non_tracking_params_survive_normalization() {
        let key = identity_key("https://careers.acme.com/openings?id=42&utm_campaign=x");
        assert_eq!(key, "https://careers.acme.com/openings?id=42");
        assert_ne!(key, identity_key("https://careers.acme.com/openings?id=43"));
    }

    #[test]
    fn platform_ids_are_extracted() {
        assert_eq!(
            identity_key("https://boards.greenhouse.io/acme/jobs/4012345?gh_src=abc"),
            "greenhouse_4012345"
        );
        assert_eq!(
            identity_key("https://job-boards.greenhouse.io/acme/jobs/4012345/"),
            "greenhouse_4012345"
        );
        assert_eq!(
            identity_key(
                "https://jobs.ashbyhq.com/acme/3F0E4C2A-1B2C-4D5E-8F90-ABCDEF012345/application"
            ),
            "ashby_3f0e4c2a-1b2c-4d5e-8f90-abcdef012345"
        );
        assert_eq!(
            identity_key("https://jobs.lever.co/acme/5d1f8a2c-77aa-4e3b-9c1d-0e2f3a4b5c6d/apply"),
            "lever_5d1f8a2c-77aa-4e3b-9c1d-0e2f3a4b5c6d"
        );
        assert_eq!(
            identity_key(
                "https://acme.wd5.myworkdayjobs.com/en-US/External/job/Boston-MA/ML-Engineer_R10234?source=linkedin"
            ),
            "workday_ML-Engineer_R10234"
        );
        assert_eq!(
            identity_key("https://careers-acme.icims.com/jobs/8812/ai-engineer/job"),
            "icims_8812"
        );
        assert_eq!(
            identity_key("https://jobs.smartrecruiters.com/AcmeInc/743999912345678-ai-engineer"),
            "smartrecruiters_743999912345678"
        );
        assert_eq!(
            identity_key("https://apply.workable.com/acme/j/8F3A2B1C9D/"),
            "workable_8F3A2B1C9D"
        );
        assert_eq!(
            identity_key("https://www.acme.com/careers/open-roles?gh_jid=5550001"),
            "greenhouse_5550001"
        );
    }

    #[test]
    fn lever_apply_and_plain_posting_urls_share_identity() {
        let base = "https://jobs.lever.co/acme/5d1f8a2c-77aa-4e3b-9c1d-0e2f3a4b5c6d";
        assert_eq!(identity_key(base), identity_key(&format!("{base}/apply")));
        assert_eq!(identity_key(base), identity_key(&format!("{base}/?lever-source=LinkedIn")));
    }

    #[test]
    fn urls_without_platform_ids_fall_back_to_normalized_url() {
        assert_eq!(
            identity_key("https://jobs.ashbyhq.com/acme/?utm_source=x"),
            "https://jobs.ashbyhq.com/acme"
        );
        assert_eq!(identity_key("  not a url/ "), "not a url");
    }

    #[test]
    fn classification_uses_host_suffixes_in_table_order() {
        assert_eq!(classify("https://jobs.ashbyhq.com/acme/x"), Ats::Ashby);
        assert_eq!(classify("https://boards.greenhouse.io/acme/jobs/1"), Ats::Greenhouse);
        assert_eq!(classify("https://jobs.lever.co/acme/x"), Ats::Lever);
        assert_eq!(classify("https://acme.wd1.myworkdayjobs.com/x"), Ats::Workday);
        assert_eq!(classify("https://careers-acme.icims.com/jobs/1"), Ats::ICims);
        assert_eq!(classify("https://jobs.smartrecruiters.com/Acme/1"), Ats::SmartRecruiters);
        assert_eq!(classify("https://apply.workable.com/acme/j/ABC"), Ats::Workable);
        assert_eq!(classify("https://www.clever.com/careers"), Ats::Other);
        assert_eq!(classify("https://example.com/?next=jobs.lever.co"), Ats::Other);
        assert_eq!(classify("garbage"), Ats::Other);
    }

    #[test]
    fn generic_lookup_accepts_regex_matchers() {
        let table = [(Regex::new(r"/careers/").unwrap(), 7u8)];
        let url = Url::parse("https://acme.com/careers/ml").unwrap();
        assert_eq!(first_match(&table, &url), Some(7));
        let other = Url::parse("https://acme.com/blog").unwrap();
        assert_eq!(first_match(&table, &other), None);
    }

    #[test]
    fn company_names_come_from_board_slugs_then_titles() {
        assert_eq!(
            company_name("https://jobs.ashbyhq.com/acme-robotics/abc", "AI Engineer"),
            "Acme Robotics"
        );
        assert_eq!(
            company_name("https://boards.greenhouse.io/embed/job_app?for=vectorco&token=1", "x"),
            "Vectorco"
        );
        assert_eq!(
            company_name("https://acme.wd5.myworkdayjobs.com/en-US/job/x/y", "x"),
            "Acme"
        );
        assert_eq!(
            company_name("https://example.com/job/1", "ML Engineer at Widget Labs"),
            "Widget Labs"
        );
        assert_eq!(
            company_name("https://example.com/job/1", "ML Engineer - Gizmo"),
            "Gizmo"
        );
        assert_eq!(company_name("https://example.com/job/1", "ML Engineer"), "Unknown");
    }

    #[test]
    fn posted_dates_accept_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().unwrap();
        assert_eq!(parse_posted_date("2026-03-01T09:30:00Z"), Some(expected));
        assert_eq!(parse_posted_date("2026-03-01T04:30:00-05:00"), Some(expected));
        assert_eq!(parse_posted_date("2026-03-01T09:30:00"), Some(expected));
        assert_eq!(parse_posted_date("2026-03-01T09:30:00.000+0000"), Some(expected));
        assert_eq!(
            parse_posted_date("2026-03-01"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().unwrap())
        );
        assert_eq!(parse_posted_date("last tuesday"), None);
        assert_eq!(parse_posted_date(""), None);
    }

    #[test]
    fn relative_dates_resolve_against_now() {
        assert_eq!(parse_relative_posted("Posted Today", now()), Some(now()));
        assert_eq!(
            parse_relative_posted("Posted Yesterday", now()),
            Some(now() - Duration::hours(24))
        );
        assert_eq!(
            parse_relative_posted("Posted 3 Days Ago", now()),
            Some(now() - Duration::hours(72))
        );
        assert_eq!(
            parse_relative_posted("posted 30+ days ago", now()),
            Some(now() - Duration::hours(720))
        );
        assert_eq!(
            parse_relative_posted("about an hour ago", now()),
            Some(now() - Duration::hours(1))
        );
        assert_eq!(parse_relative_posted("Apply today!", now()), None);
    }

    #[test]
    fn out_of_range_relative_dates_are_unknown() {
        assert_eq!(parse_relative_posted("Posted 99999999999999 days ago", now()), None);
        assert_eq!(parse_relative_posted("Posted 999999999 months ago", now()), None);
        assert_eq!(
            parse_relative_posted("Posted 99999999999999999999 hours ago", now()),
            None
        );

        let html = "<html><body>Posted 999999999 months ago</body></html>";
        let record = parse_posting_page(html, Ats::Workday, now());
        assert!(record.freshness().is_none());
    }

    #[test]
    fn remote_status_prefers_hybrid_when_both_appear() {
        assert_eq!(remote_status_from_text("Remote or hybrid in NYC"), RemoteStatus::Hybrid);
        assert_eq!(remote_status_from_text("Fully remote (US)"), RemoteStatus::Remote);
        assert_eq!(remote_status_from_text("We work from home on Fridays"), RemoteStatus::Remote);
        assert_eq!(remote_status_from_text("Boston office, 5 days"), RemoteStatus::OnSite);
    }

    #[test]
    fn json_ld_graph_and_array_shapes_are_found() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not valid json</script>
            <script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"Organization","name":"Acme"},
              {"@type":["JobPosting"],"datePosted":"2026-03-01",
               "employmentType":["FULL_TIME","CONTRACTOR"],
               "jobLocation":[{"@type":"Place","address":{"addressLocality":"Austin","addressRegion":"TX"}}]}
            ]}
            </script></head><body><p>On-site</p></body></html>"#;
        let document = Html::parse_document(html);
        let posting = structured_posting(&document).expect("posting");
        assert_eq!(posting.date_posted.as_deref(), Some("2026-03-01"));
        assert_eq!(posting.location.as_deref(), Some("Austin, TX"));
        assert_eq!(posting.employment_type.as_deref(), Some("FULL_TIME, CONTRACTOR"));
    }

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r#"<html><head><style>.remote{}</style></head><body>
            <script>var remote = true;</script><p>Boston   office</p></body></html>"#;
        let text = visible_text(&Html::parse_document(html));
        assert_eq!(text, "Boston office");
        assert_eq!(remote_status_from_text(&text), RemoteStatus::OnSite);
    }

    #[test]
    fn page_without_any_signal_yields_unknown_freshness() {
        let record = parse_posting_page("<html><body><h1>AI Engineer</h1></body></html>", Ats::Ashby, now());
        assert_eq!(record.posted_at, None);
        assert!(record.freshness().is_none());
        assert_eq!(record.remote_status, RemoteStatus::OnSite);
    }

    #[test]
    fn hit_dumps_accept_plain_brave_and_google_shapes() {
        let plain = r#"[{"title":"AI Engineer","url":"https://a.com/1","description":"d"}]"#;
        let brave = r#"{"query":{"more_results_available":false},"web":{"results":[{"title":"AI Engineer","url":"https://a.com/1","description":"d","age":"1 day"}]}}"#;
        let google = r#"{"items":[{"title":"AI Engineer","link":"https://a.com/1","snippet":"d"}]}"#;
        for text in [plain, brave, google] {
            let hits = parse_hit_dump(text).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].url, "https://a.com/1");
            assert_eq!(hits[0].description, "d");
        }
        assert!(parse_hit_dump(r#"{"unexpected":true}"#).is_err());
    }

    #[tokio::test]
    async fn file_source_reads_dump_by_query_id_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("q-boston.json"),
            r#"[{"title":"AI Engineer","url":"https://jobs.lever.co/acme/5d1f8a2c-77aa"}]"#,
        )
        .unwrap();
        let source = FileHitSource::new(dir.path());
        let mut query = SearchQuery {
            id: "q-boston".into(),
            query: "\"AI Engineer\" Boston".into(),
            location: "Boston".into(),
            role: "AI/ML Engineer".into(),
            ats: None,
            tag: "boston".into(),
            enabled: true,
        };
        let hits = source.search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "");

        query.id = "q-missing".into();
        assert!(source.search(&query).await.unwrap().is_empty());
    }
}
