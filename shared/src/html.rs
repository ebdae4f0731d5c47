//! HTML fragments for shells that paint the results container directly.

use std::fmt::Write;

use crate::case_result::{Entry, ResultSection, ResultView, SectionBody, SectionKind};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn accent(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::CaseHistory => "border-blue-500",
        SectionKind::Acts => "border-green-500",
        SectionKind::Orders => "border-purple-500",
        _ => "border-orange-500",
    }
}

pub fn render_results(view: &ResultView) -> String {
    let mut html = String::from(
        "<div class=\"bg-green-50 border border-green-200 rounded-lg p-4 mb-4\">\
         <h3 class=\"text-lg font-semibold text-green-800 mb-2\">\
         <i class=\"fas fa-check-circle mr-2\"></i>Case Found Successfully</h3></div>",
    );
    for section in &view.sections {
        render_section(&mut html, section);
    }
    html
}

pub fn render_error(message: &str) -> String {
    format!(
        "<div class=\"bg-red-50 border border-red-200 rounded-lg p-4\">\
         <h3 class=\"text-lg font-semibold text-red-800 mb-2\">\
         <i class=\"fas fa-exclamation-circle mr-2\"></i>Search Failed</h3>\
         <p class=\"text-red-700\">{}</p></div>",
        escape(message)
    )
}

fn render_section(html: &mut String, section: &ResultSection) {
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<div class=\"bg-white border border-gray-200 rounded-lg p-4\">\
         <h4 class=\"font-semibold text-gray-800 mb-3\">{}</h4>",
        escape(&section.title)
    );

    match &section.body {
        SectionBody::Fields { fields } => {
            html.push_str("<div class=\"grid grid-cols-2 gap-4 text-sm\">");
            for field in fields {
                let _ = write!(
                    html,
                    "<div><span class=\"font-medium\">{}:</span> {}</div>",
                    escape(&field.label),
                    escape(&field.value)
                );
            }
            html.push_str("</div>");
        }
        SectionBody::Names { items } => {
            html.push_str("<ul class=\"list-disc list-inside text-sm\">");
            for item in items {
                let _ = write!(html, "<li>{}</li>", escape(item));
            }
            html.push_str("</ul>");
        }
        SectionBody::Entries { entries } => {
            html.push_str("<div class=\"space-y-2\">");
            for entry in entries {
                render_entry(html, entry, accent(section.kind));
            }
            html.push_str("</div>");
        }
    }

    html.push_str("</div>");
}

fn render_entry(html: &mut String, entry: &Entry, accent: &str) {
    let summary = entry
        .fields
        .iter()
        .map(|f| format!("{}: {}", escape(&f.label), escape(&f.value)))
        .collect::<Vec<_>>()
        .join(" | ");

    let _ = write!(
        html,
        "<div class=\"border-l-4 {accent} pl-3 py-2\"><div class=\"text-sm\">\
         <span class=\"font-medium\">{}:</span> {summary}",
        escape(&entry.heading)
    );
    if let Some(link) = &entry.link {
        let _ = write!(
            html,
            "<div class=\"mt-1\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\" \
             class=\"text-blue-600 hover:text-blue-800 underline text-xs\">\
             <i class=\"fas fa-download mr-1\"></i>Download Order</a></div>",
            escape(link)
        );
    }
    html.push_str("</div></div>");
}
