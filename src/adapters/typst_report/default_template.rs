//! Built-in Typst report template.
//!
//! Placeholders are resolved by [`super::resolve`]; a custom template may use
//! any subset of them.

const DEFAULT_TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm, numbering: "1")
#set text(size: 10pt)
#set table(stroke: 0.5pt + gray, inset: 5pt)

= {{TITLE}}

== Summary

{{RUN_SUMMARY}}

== Index Value

{{PERFORMANCE_CHART}}

== Monthly Returns

{{MONTHLY_RETURNS}}

== Latest Constituents

{{LATEST_CONSTITUENTS}}

== Composition Changes

{{COMPOSITION_CHANGES}}

== Index Performance

{{PERFORMANCE_TABLE}}

== Skipped Rows

{{SKIPPED_ROWS}}
"#;

pub fn template() -> &'static str {
    DEFAULT_TEMPLATE
}
