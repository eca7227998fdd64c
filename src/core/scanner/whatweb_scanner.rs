// src/core/scanner/whatweb_scanner.rs

use tracing::{debug, error, info};

use crate::core::models::Technology;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "OutpostRS/0.1";

/// Defines the different places a technology signature can hide.
enum Check<'a> {
    /// Check for a pattern in a specific HTTP header.
    Header(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the content of a specific meta tag.
    MetaTag(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the HTML body.
    Body(&'a Lazy<Regex>),
    /// Check for a pattern in the `src` attribute of `<script>` tags.
    ScriptSrc(&'a Lazy<Regex>),
    /// Check for a pattern in the `set-cookie` headers.
    Cookie(&'a Lazy<Regex>),
}

/// A rule that defines how to detect a specific technology.
struct FingerprintRule<'a> {
    tech_name: &'a str,
    category: &'a str,
    check: Check<'a>,
}

// Statically compiled regexes. The first capture group, when present, is the
// version.
static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"nginx/([\d\.]+)").unwrap());
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache/([\d\.]+)").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Microsoft-IIS/([\d\.]+)").unwrap());
static RE_CLOUDFLARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"cloudflare").unwrap());
static RE_LITESPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"LiteSpeed").unwrap());
static RE_WORDPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"WordPress ([\d\.]+)").unwrap());
static RE_WP_EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wp-content/|/wp-includes/").unwrap());
static RE_JOOMLA: Lazy<Regex> = Lazy::new(|| Regex::new(r"Joomla!").unwrap());
static RE_DRUPAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Drupal ([\d]+)").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHP/([\d\.]+)").unwrap());
static RE_PHPSESSID: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHPSESSID").unwrap());
static RE_ASPNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"ASP\.NET").unwrap());
static RE_JSESSIONID: Lazy<Regex> = Lazy::new(|| Regex::new(r"JSESSIONID").unwrap());
static RE_DJANGO_CSRF: Lazy<Regex> = Lazy::new(|| Regex::new(r"csrftoken").unwrap());
static RE_NEXTJS_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/_next/static/").unwrap());
static RE_REACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"react-dom|data-reactroot|react\.development").unwrap());
static RE_VUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"data-v-app|__VUE_").unwrap());
static RE_JQUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"jquery(?:-([\d\.]+))?(?:\.min|\.slim)?\.js").unwrap());

/// The master list of fingerprinting rules.
static RULES: &[FingerprintRule] = &[
    FingerprintRule { tech_name: "Nginx", category: "Web Server", check: Check::Header("server", &RE_NGINX) },
    FingerprintRule { tech_name: "Apache", category: "Web Server", check: Check::Header("server", &RE_APACHE) },
    FingerprintRule { tech_name: "Microsoft IIS", category: "Web Server", check: Check::Header("server", &RE_IIS) },
    FingerprintRule { tech_name: "Cloudflare", category: "CDN / WAF", check: Check::Header("server", &RE_CLOUDFLARE) },
    FingerprintRule { tech_name: "LiteSpeed", category: "Web Server", check: Check::Header("server", &RE_LITESPEED) },
    FingerprintRule { tech_name: "WordPress", category: "CMS", check: Check::MetaTag("generator", &RE_WORDPRESS) },
    FingerprintRule { tech_name: "WordPress", category: "CMS", check: Check::Body(&RE_WP_EMBED) },
    FingerprintRule { tech_name: "Joomla", category: "CMS", check: Check::MetaTag("generator", &RE_JOOMLA) },
    FingerprintRule { tech_name: "Drupal", category: "CMS", check: Check::MetaTag("generator", &RE_DRUPAL) },
    FingerprintRule { tech_name: "PHP", category: "Language", check: Check::Header("x-powered-by", &RE_PHP) },
    FingerprintRule { tech_name: "PHP", category: "Language", check: Check::Cookie(&RE_PHPSESSID) },
    FingerprintRule { tech_name: "ASP.NET", category: "Framework", check: Check::Header("x-powered-by", &RE_ASPNET) },
    FingerprintRule { tech_name: "Java", category: "Language", check: Check::Cookie(&RE_JSESSIONID) },
    FingerprintRule { tech_name: "Python/Django", category: "Framework", check: Check::Cookie(&RE_DJANGO_CSRF) },
    FingerprintRule { tech_name: "Next.js", category: "JS Framework", check: Check::ScriptSrc(&RE_NEXTJS_SCRIPT) },
    FingerprintRule { tech_name: "React", category: "JS Library", check: Check::Body(&RE_REACT) },
    FingerprintRule { tech_name: "Vue.js", category: "JS Library", check: Check::Body(&RE_VUE) },
    FingerprintRule { tech_name: "jQuery", category: "JS Library", check: Check::ScriptSrc(&RE_JQUERY) },
];

/// Runs a technology fingerprint scan against the target.
///
/// Fetches the target's landing page and applies the rule table to the
/// response headers, cookies and body. The result ends up in the domain
/// record's banner field.
pub async fn fingerprint(target: &str) -> Result<Vec<Technology>, String> {
    info!(target, "Starting fingerprint scan.");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| {
            error!(error = %e, "Failed to build HTTP client");
            format!("HTTP client error: {}", e)
        })?;

    let url = format!("https://{}", target);
    let response = client.get(&url).send().await.map_err(|e| {
        error!(url = %url, error = %e, "HTTP request failed");
        format!("HTTP request failed: {}", e)
    })?;
    debug!(status = %response.status(), "Received HTTP response.");

    let headers = response.headers().clone();
    let body = response.text().await.map_err(|e| {
        error!(error = %e, "Failed to read response body");
        format!("Failed to read response body: {}", e)
    })?;

    let technologies = apply_rules(&headers, &body);
    info!(target, count = technologies.len(), "Fingerprint scan finished.");
    Ok(technologies)
}

/// Applies every rule to one captured response. Pure so it can run on canned
/// responses in tests; the HTML document never crosses an await point.
fn apply_rules(headers: &HeaderMap, body: &str) -> Vec<Technology> {
    let cookies = headers
        .get_all("set-cookie")
        .into_iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let document = Html::parse_document(body);

    let mut found: HashMap<String, Technology> = HashMap::new();
    for rule in RULES {
        let version = match &rule.check {
            Check::Header(name, re) => {
                check_with_regex(headers.get(*name).and_then(|v| v.to_str().ok()), re)
            }
            Check::MetaTag(name, re) => check_meta_tag(&document, name, re),
            Check::Body(re) => check_with_regex(Some(body), re),
            Check::ScriptSrc(re) => check_script_src(&document, re),
            Check::Cookie(re) => check_with_regex(Some(&cookies), re),
        };

        if let Some(v) = version {
            debug!(tech = %rule.tech_name, version = ?v, "Rule matched.");
            if let Some(existing) = found.get_mut(rule.tech_name) {
                // Keep the first detection, only fill in a missing version.
                if existing.version.is_none() && v.is_some() {
                    existing.version = v;
                }
            } else {
                found.insert(
                    rule.tech_name.to_string(),
                    Technology {
                        name: rule.tech_name.to_string(),
                        category: rule.category.to_string(),
                        version: v,
                    },
                );
            }
        }
    }

    let mut technologies: Vec<Technology> = found.into_values().collect();
    technologies.sort_by(|a, b| a.name.cmp(&b.name));
    technologies
}

/// Renders the technology list into a banner fragment.
pub fn format_technologies(technologies: &[Technology]) -> String {
    technologies
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies a regex to an optional string slice. `Some(version)` means the
/// pattern matched; the inner option carries a captured version when the
/// rule's first capture group hit.
fn check_with_regex(text: Option<&str>, re: &Regex) -> Option<Option<String>> {
    text.and_then(|text| {
        re.captures(text).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
        })
    })
}

/// Searches the parsed HTML for a specific meta tag and checks its content.
fn check_meta_tag(doc: &Html, name: &str, re: &Regex) -> Option<Option<String>> {
    let selector_str = format!("meta[name='{}']", name);
    if let Ok(selector) = Selector::parse(&selector_str) {
        let content = doc
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"));
        return check_with_regex(content, re);
    }
    None
}

/// Searches the parsed HTML for script tags and checks their `src` attributes.
fn check_script_src(doc: &Html, re: &Regex) -> Option<Option<String>> {
    if let Ok(selector) = Selector::parse("script[src]") {
        for el in doc.select(&selector) {
            if let Some(src) = el.value().attr("src") {
                if let Some(version) = check_with_regex(Some(src), re) {
                    return Some(version);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn server_header_yields_name_and_version() {
        let techs = apply_rules(&headers(&[("server", "nginx/1.18.0")]), "");
        assert_eq!(techs.len(), 1);
        assert_eq!(techs[0].name, "Nginx");
        assert_eq!(techs[0].version.as_deref(), Some("1.18.0"));
    }

    #[test]
    fn meta_generator_detects_the_cms() {
        let body = r#"<html><head><meta name="generator" content="WordPress 6.4"></head></html>"#;
        let techs = apply_rules(&HeaderMap::new(), body);
        assert!(techs.iter().any(|t| t.name == "WordPress" && t.version.as_deref() == Some("6.4")));
    }

    #[test]
    fn duplicate_detections_collapse_and_keep_the_version() {
        // Both the meta tag and the body rule hit WordPress; one entry
        // survives and it carries the version.
        let body = r#"<html><head><meta name="generator" content="WordPress 6.4"></head>
            <body><img src="/wp-content/logo.png"></body></html>"#;
        let techs = apply_rules(&HeaderMap::new(), body);
        let wp: Vec<_> = techs.iter().filter(|t| t.name == "WordPress").collect();
        assert_eq!(wp.len(), 1);
        assert_eq!(wp[0].version.as_deref(), Some("6.4"));
    }

    #[test]
    fn cookies_reveal_the_language() {
        let techs = apply_rules(
            &headers(&[("set-cookie", "PHPSESSID=abc123; path=/")]),
            "",
        );
        assert!(techs.iter().any(|t| t.name == "PHP"));
    }

    #[test]
    fn clean_response_matches_nothing() {
        assert!(apply_rules(&HeaderMap::new(), "<html><body>hi</body></html>").is_empty());
    }

    #[test]
    fn formatting_renders_versions_when_known() {
        let techs = vec![
            Technology { name: "Nginx".into(), category: "Web Server".into(), version: Some("1.18.0".into()) },
            Technology { name: "React".into(), category: "JS Library".into(), version: None },
        ];
        assert_eq!(
            format_technologies(&techs),
            "Nginx/1.18.0 (Web Server), React (JS Library)"
        );
    }
}
