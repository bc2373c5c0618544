/// Demo host.
///
/// Sample wiki extensions are added before the host declares its hooks, one
/// of them targets a newer render API than the host provides, and one has a
/// render callback that always fails. The host then runs every dispatch
/// protocol and reports what happened.
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use extkit_hooks::{
    CallbackInfo, Declaration, DuplicatePolicy, ExtensionData, ExtensionRecord, ExtensionRegistry,
    HookEnvelope, HookSpec, PluginSpec,
};

const RENDER_API: &str = "1.2.0";
const PRE_RENDER_API: &str = "1.0.0";
const PAGE_SAVED_API: &str = "1.0.0";
const TAG_API: &str = "1.1.0";

const SAMPLE_PAGE: &str = "Release notes :tada: <script>alert(1)</script>";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoReport {
    pub extensions: Vec<ExtensionRecord>,
    pub rejected: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub render_callbacks: Vec<CallbackInfo>,
    pub rendered: Value,
    pub toc_page: HookEnvelope,
    pub plain_page: HookEnvelope,
    pub heading: Option<Value>,
    pub blink: Option<Value>,
    pub missing_required: Option<String>,
}

// ---------------------------------------------------------------------------
// Sample extensions
// ---------------------------------------------------------------------------

fn text(v: &Value) -> &str {
    v.as_str().unwrap_or_default()
}

/// Replaces `:tada:` shortcodes.
fn emoji() -> ExtensionData {
    ExtensionData::new("emoji")
        .with_author("wiki core")
        .with_version("0.4.1")
        .with_description("Emoji shortcodes")
        .with_hook(
            "render",
            HookSpec::new("1.0.0", |v| Ok(json!(text(&v).replace(":tada:", "🎉")))),
        )
}

/// Strips `<script>` blocks before any other render step.
fn sanitize() -> ExtensionData {
    ExtensionData::new("sanitize")
        .with_author("wiki core")
        .with_version("1.0.0")
        .with_description("Removes script tags")
        .with_hook(
            "render",
            HookSpec::new("1.2.0", |v| {
                let mut page = text(&v).to_string();
                while let Some(start) = page.find("<script>") {
                    let end = page[start..]
                        .find("</script>")
                        .map(|i| start + i + "</script>".len())
                        .unwrap_or(page.len());
                    page.replace_range(start..end, "");
                }
                Ok(json!(page.trim_end()))
            })
            .first(),
        )
}

/// Claims pages consisting of a `[[toc]]` marker.
fn toc() -> ExtensionData {
    ExtensionData::new("toc")
        .with_author("docs team")
        .with_version("0.2.0")
        .with_description("Table of contents pages")
        .with_hook(
            "pre-render",
            HookSpec::new("1.0.0", |v| {
                let envelope = HookEnvelope::from_value(v)?;
                if text(&envelope.data).trim() == "[[toc]]" {
                    Ok(HookEnvelope::handled(json!("<ul class=\"toc\"></ul>")).to_value())
                } else {
                    Ok(envelope.to_value())
                }
            }),
        )
}

/// Heading tags as keyed plugins, plus a save-time audit log line.
fn headings() -> ExtensionData {
    let heading = |tag: &'static str| {
        PluginSpec::new("1.1.0", move |args| {
            let body = args
                .get("text")
                .and_then(Value::as_str)
                .context("heading plugin needs a \"text\" argument")?;
            Ok(json!(format!("<{tag}>{body}</{tag}>")))
        })
    };
    ExtensionData::new("headings")
        .with_author("docs team")
        .with_version("1.3.0")
        .with_description("Heading tags")
        .with_plugin("tag", "h1", heading("h1"))
        .with_plugin("tag", "h2", heading("h2"))
        .with_hook(
            "page-saved",
            HookSpec::new("1.0.0", |v| {
                info!(page = %v, "[audit] page saved");
                Ok(Value::Null)
            }),
        )
}

/// Written against a render API the host does not provide yet.
fn fancy_render() -> ExtensionData {
    ExtensionData::new("fancy-render")
        .with_author("third party")
        .with_version("2.0.0")
        .with_description("Needs render API 1.4")
        .with_hook("render", HookSpec::new("1.4.0", |_| Ok(json!("FANCY"))))
        .with_plugin("tag", "blink", PluginSpec::new("1.4.0", |_| Ok(json!("<blink/>"))))
}

/// Always fails at render time.
fn broken() -> ExtensionData {
    ExtensionData::new("broken")
        .with_author("third party")
        .with_version("0.0.1")
        .with_description("Render callback that errors")
        .with_hook(
            "render",
            HookSpec::new("1.0.0", |_| anyhow::bail!("template cache not initialised")),
        )
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

pub fn run(policy: DuplicatePolicy) -> Result<DemoReport> {
    let mut registry = ExtensionRegistry::with_policy(policy);
    let mut rejected = Vec::new();
    info!(duplicate_policy = ?registry.duplicate_policy(), "Demo registry created");

    // Extensions arrive before the host declares anything; `emoji` shows up twice.
    for ext in [emoji(), broken(), fancy_render(), toc(), headings(), sanitize(), emoji()] {
        let name = ext.name.clone();
        if let Err(e) = registry.add_extension(ext) {
            rejected.push(format!("{name}: {e}"));
        }
    }

    let declarations = vec![
        registry.declare_hook("render", RENDER_API)?,
        registry.declare_hook("pre-render", PRE_RENDER_API)?,
        registry.declare_hook("page-saved", PAGE_SAVED_API)?,
        registry.declare_plugin("tag", TAG_API)?,
    ];

    let rendered = registry.run_hook_chain("render", json!(SAMPLE_PAGE));
    let toc_page = registry.run_first_true_hook("pre-render", json!("[[toc]]"));
    let plain_page = registry.run_first_true_hook("pre-render", json!("Home"));
    registry.run_hooks("page-saved", &json!({ "page": "Home", "revision": 3 }));

    let heading = registry.run_plugin("tag", "h1", json!({ "text": "Welcome" }), true)?;
    let blink = registry.run_plugin("tag", "blink", json!({}), false)?;
    let missing_required = registry
        .run_plugin("tag", "marquee", json!({}), true)
        .err()
        .map(|e| e.to_string());

    Ok(DemoReport {
        extensions: registry.list_extensions().to_vec(),
        rejected,
        declarations,
        render_callbacks: registry.hook_callbacks("render"),
        rendered,
        toc_page,
        plain_page,
        heading,
        blink,
        missing_required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use extkit_hooks::CallbackState;

    #[test]
    fn demo_degrades_gracefully() {
        let report = run(DuplicatePolicy::Reject).unwrap();

        assert_eq!(report.extensions.len(), 6);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].starts_with("emoji:"));

        // sanitize runs first, broken is skipped, fancy-render is disabled.
        assert_eq!(report.rendered, json!("Release notes 🎉"));
        assert_eq!(report.render_callbacks[0].owner, "sanitize");
        let fancy = report
            .render_callbacks
            .iter()
            .find(|cb| cb.owner == "fancy-render")
            .unwrap();
        assert_eq!(fancy.state, CallbackState::DisabledApi);

        assert!(report.toc_page.ran_something);
        assert!(!report.plain_page.ran_something);
        assert_eq!(report.plain_page.data, json!("Home"));

        assert_eq!(report.heading, Some(json!("<h1>Welcome</h1>")));
        assert_eq!(report.blink, None);
        assert!(report.missing_required.unwrap().contains("marquee"));
    }

    #[test]
    fn metadata_only_policy_registers_duplicate_callbacks() {
        let report = run(DuplicatePolicy::MetadataOnly).unwrap();
        assert!(report.rejected.is_empty());
        assert_eq!(report.extensions.len(), 6);
        let emoji_callbacks = report
            .render_callbacks
            .iter()
            .filter(|cb| cb.owner == "emoji")
            .count();
        assert_eq!(emoji_callbacks, 2);
        assert_eq!(report.rendered, json!("Release notes 🎉"));
    }
}
